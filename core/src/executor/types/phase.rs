//! Execution phase enums for each statement type
//!
//! Each statement type has its own Phase enum that tracks which execution step
//! it's currently at. These are serialized as u8 for efficiency.

use serde::{Deserialize, Serialize};

/// Phase for statements that evaluate a single expression
/// (expression statements, declarations, assignments, return, throw)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EvalPhase {
    Eval = 0,
}

/// Execution phase for If statements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(u8)]
pub enum IfPhase {
    /// Evaluate the test and push the chosen branch
    Test = 0,
    /// Branch finished, pop the frame
    Done = 1,
}

/// Execution phase for While statements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(u8)]
pub enum WhilePhase {
    /// Evaluate the test; the body re-enters this phase when it finishes
    Test = 0,
}

/// Execution phase for For loops
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ForPhase {
    /// Evaluate the iterable and snapshot its items
    Init = 0,
    /// Bind the next item and push the body
    Next = 1,
}

/// Execution phase for Try statements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TryPhase {
    /// Push the try block
    Enter = 0,
    /// Executing the try block
    ExecuteTry = 1,
    /// Executing the catch block (error was caught)
    ExecuteCatch = 2,
}
