//! Virtual Machine state
//!
//! The VM holds all execution state of one unit:
//! - frames: Stack of active statements
//! - control: Current control flow state (return, throw, suspend, ...)
//! - env: Scopes, with the injected globals at the bottom
//! - replay: Call results of the statement being re-evaluated

use super::env::Env;
use super::types::{
    Completion, Control, EvalPhase, ForPhase, Frame, FrameKind, IfPhase, Stmt, TryPhase, Val,
    WhilePhase,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/* ===================== VM ===================== */

/// Virtual Machine state
///
/// This contains everything needed to execute (and serialize/resume) a module body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VM {
    /// Stack of execution frames
    pub frames: Vec<Frame>,

    /// Current control flow state
    pub control: Control,

    /// Variable scopes
    pub env: Env,

    /// Results of the calls the current statement has completed
    pub replay: Replay,

    /// Value of the most recently evaluated expression statement
    pub completion: Option<Val>,
}

impl VM {
    /// Create a new VM with a program
    ///
    /// The program is wrapped in a root frame and execution begins on the first step.
    pub fn new(program: Stmt, globals: HashMap<String, Val>) -> Self {
        let mut vm = VM {
            frames: vec![],
            control: Control::None,
            env: Env::new(globals),
            replay: Replay::default(),
            completion: None,
        };

        push_stmt(&mut vm, &program);

        vm
    }

    /// Specifier the VM is suspended on, if any
    pub fn suspended_on(&self) -> Option<&str> {
        match &self.control {
            Control::Suspend(specifier) => Some(specifier),
            _ => None,
        }
    }

    /// Resume a suspended VM with the tagged result of its pending import
    ///
    /// A normal result is logged as the result of the suspended call; an
    /// abnormal one is thrown from that statement. Returns false (and changes
    /// nothing) when the VM is not suspended.
    pub fn resume(&mut self, completion: Completion) -> bool {
        if !matches!(self.control, Control::Suspend(_)) {
            return false;
        }

        match completion {
            Completion::Normal(value) => {
                self.replay.record(value);
                self.control = Control::None;
            }
            Completion::Abnormal(error) => {
                self.replay.clear();
                self.control = Control::Throw(error);
            }
        }
        true
    }

    /// Final state of the VM once it has stopped stepping
    pub fn outcome(&self) -> Outcome {
        match &self.control {
            Control::Suspend(specifier) => Outcome::Suspended(specifier.clone()),
            Control::Throw(error) => Outcome::Threw(error.clone()),
            Control::Return(value) => Outcome::Returned(value.clone()),
            Control::None if self.frames.is_empty() => {
                Outcome::FellThrough(self.completion.clone().unwrap_or(Val::Null))
            }
            _ => Outcome::Running,
        }
    }
}

/// Where a VM stands after a run
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Still has work to do (budget ran out)
    Running,
    /// Waiting on a deferred import
    Suspended(String),
    /// Finished through a top-level `return`
    Returned(Val),
    /// Ran off the end of the body
    FellThrough(Val),
    /// An uncaught throw escaped the body
    Threw(Val),
}

/* ===================== Replay Log ===================== */

/// Call results for the statement currently being (re-)evaluated
///
/// A statement that suspends on `require` is evaluated again from the start
/// when the unit resumes. Evaluation order is fixed, so the n-th call reached
/// on that pass is the n-th call of the first pass: it returns the n-th
/// logged result instead of calling the host again. The suspended `require`
/// itself gets its result logged by `VM::resume`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Replay {
    values: Vec<Val>,
    cursor: usize,
}

impl Replay {
    /// Start a fresh pass over the current statement
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Logged result of the next call in this pass, if it already completed
    pub fn next(&mut self) -> Option<Val> {
        let value = self.values.get(self.cursor).cloned();
        if value.is_some() {
            self.cursor += 1;
        }
        value
    }

    /// Log the result of a call that just completed
    pub fn record(&mut self, value: Val) {
        self.values.push(value);
        self.cursor = self.values.len();
    }

    /// Forget all results once the statement's expressions are done
    pub fn clear(&mut self) {
        self.values.clear();
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/* ===================== Frame Management ===================== */

/// Push a new frame for a statement onto the stack
///
/// This determines the initial phase based on the statement type. Blocks open
/// their scope here so the scope lives exactly as long as the frame.
pub fn push_stmt(vm: &mut VM, stmt: &Stmt) {
    let scope_base = vm.env.depth();

    let kind = match stmt {
        Stmt::Block { .. } => {
            vm.env.push_scope();
            FrameKind::Block { idx: 0 }
        }
        Stmt::Expr { .. } => FrameKind::Expr {
            phase: EvalPhase::Eval,
        },
        Stmt::Declare { .. } => FrameKind::Declare {
            phase: EvalPhase::Eval,
        },
        Stmt::Assign { .. } => FrameKind::Assign {
            phase: EvalPhase::Eval,
        },
        Stmt::Return { .. } => FrameKind::Return {
            phase: EvalPhase::Eval,
        },
        Stmt::Throw { .. } => FrameKind::Throw {
            phase: EvalPhase::Eval,
        },
        Stmt::If { .. } => FrameKind::If {
            phase: IfPhase::Test,
        },
        Stmt::While { .. } => FrameKind::While {
            phase: WhilePhase::Test,
        },
        Stmt::ForLoop { .. } => FrameKind::ForLoop {
            phase: ForPhase::Init,
            items: vec![],
            idx: 0,
        },
        Stmt::Try { .. } => FrameKind::Try {
            phase: TryPhase::Enter,
        },
        Stmt::Break { .. } => FrameKind::Break,
        Stmt::Continue { .. } => FrameKind::Continue,
    };

    vm.frames.push(Frame {
        kind,
        scope_base,
        node: stmt.clone(),
    });
}

/// Pop the top frame and drop the scopes it opened
///
/// Returns false when there was no frame to pop.
pub fn pop_frame(vm: &mut VM) -> bool {
    match vm.frames.pop() {
        Some(frame) => {
            vm.env.truncate(frame.scope_base);
            true
        }
        None => false,
    }
}

/// Replace the kind of the top frame
pub fn set_top_kind(vm: &mut VM, kind: FrameKind) {
    if let Some(frame) = vm.frames.last_mut() {
        frame.kind = kind;
    }
}

/* ===================== Step Result ===================== */

/// Result of executing one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Continue to next step
    Continue,
    /// Execution stopped (finished, threw, or suspended)
    Done,
}
