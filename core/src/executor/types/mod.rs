//! Type definitions for the executor
//!
//! - AST nodes (Stmt, Expr)
//! - Runtime values (Val)
//! - Control flow (Control, Completion, Frame, FrameKind)
//! - Execution phases for each statement type

pub mod ast;
pub mod control;
pub mod phase;
pub mod values;

// Re-export all types for convenient access
pub use ast::{
    AssignOp, BinaryOp, DeclareTarget, Expr, ForLoopKind, MemberAccess, Span, Stmt, UnaryOp,
    VarKind,
};
pub use control::{Completion, Control, Frame, FrameKind};
pub use phase::*;
pub use values::{json_to_val, val_to_json, Val};
