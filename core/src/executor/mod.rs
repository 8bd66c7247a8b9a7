//! # Executor - Resumable Stack-Driven Interpreter
//!
//! ## Core Principles
//!
//! 1. **Stack-driven execution**: All state in `frames: Vec<Frame>`, no recursion
//! 2. **Statement-level execution**: Each frame has a phase tracking micro-steps
//! 3. **Centralized control flow**: `Control` enum manages break/continue/return/throw/suspend
//! 4. **Pure executor**: No filesystem, no async - just runs until suspend or complete
//!
//! Everything outside the VM (imports, console output, the working
//! directory) is reached through the [`Host`] trait.

pub mod env;
pub mod errors;
pub mod exec_loop;
pub mod expressions;
pub mod host;
pub mod ops;
pub mod statements;
pub mod stdlib;
pub mod types;
pub mod vm;

#[cfg(test)]
mod tests;

// Re-export commonly used items
pub use errors::ErrorInfo;
pub use exec_loop::{run_steps, run_until_done, step};
pub use expressions::EvalResult;
pub use host::{ConsoleLevel, Host, Require};
pub use stdlib::{inject_globals, NativeFunc};
pub use types::{Completion, Control, Expr, Stmt, Val};
pub use vm::{Outcome, Step, VM};
