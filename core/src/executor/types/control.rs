//! Control flow and execution frame types

use super::ast::Stmt;
use super::phase::{EvalPhase, ForPhase, IfPhase, TryPhase, WhilePhase};
use super::values::Val;
use serde::{Deserialize, Serialize};

/* ===================== Control Flow ===================== */

/// Control flow state
///
/// This represents active control flow (return, break, continue, throw, suspend).
/// When control != None, the VM unwinds the stack to find the appropriate handler.
/// For Suspend, the VM stops with its frames intact until it is resumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum Control {
    None,
    Break,
    Continue,
    Return(Val),
    Throw(Val),
    /// Waiting on a deferred `require` of the given specifier
    Suspend(String),
}

/* ===================== Tagged Results ===================== */

/// Outcome delivered to a suspended computation when it resumes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Completion {
    /// The import returned a value
    Normal(Val),
    /// The import threw; the value is re-raised at the call site
    Abnormal(Val),
}

impl Completion {
    pub fn is_normal(&self) -> bool {
        matches!(self, Completion::Normal(_))
    }

    pub fn into_result(self) -> Result<Val, Val> {
        match self {
            Completion::Normal(v) => Ok(v),
            Completion::Abnormal(e) => Err(e),
        }
    }
}

/* ===================== Frames ===================== */

/// Frame kind - the type and state of a statement being executed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum FrameKind {
    Block { idx: usize },
    Expr { phase: EvalPhase },
    Declare { phase: EvalPhase },
    Assign { phase: EvalPhase },
    Return { phase: EvalPhase },
    Throw { phase: EvalPhase },
    If { phase: IfPhase },
    While { phase: WhilePhase },
    ForLoop { phase: ForPhase, items: Vec<Val>, idx: usize },
    Try { phase: TryPhase },
    Break,
    Continue,
}

impl FrameKind {
    pub fn is_loop(&self) -> bool {
        matches!(self, FrameKind::While { .. } | FrameKind::ForLoop { .. })
    }
}

/// Execution frame - one per active statement
///
/// The frame stack replaces the system call stack, which is what lets a unit
/// stop in the middle of a statement and continue later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    /// The kind and state of this frame
    #[serde(flatten)]
    pub kind: FrameKind,

    /// Number of scopes in the environment when this frame was pushed.
    /// Popping the frame truncates the environment back to this depth.
    pub scope_base: usize,

    /// The AST node (statement) this frame represents
    pub node: Stmt,
}
