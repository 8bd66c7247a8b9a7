//! Guest-visible error values
//!
//! Every error the interpreter or the loaders raise inside a unit is a
//! `Val::Error(ErrorInfo)` with one of the codes below. Guest code can catch
//! it and inspect `err.code`, `err.message` and `err.path`.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const MODULE_NOT_FOUND: &str = "MODULE_NOT_FOUND";
pub const PARSE_ERROR: &str = "PARSE_ERROR";
pub const IMPORT_DEPTH_EXCEEDED: &str = "IMPORT_DEPTH_EXCEEDED";
pub const TYPE_ERROR: &str = "TYPE_ERROR";
pub const PROPERTY_NOT_FOUND: &str = "PROPERTY_NOT_FOUND";
pub const UNDEFINED_VARIABLE: &str = "UNDEFINED_VARIABLE";
pub const CONST_REASSIGN: &str = "CONST_REASSIGN";
pub const INDEX_OUT_OF_BOUNDS: &str = "INDEX_OUT_OF_BOUNDS";
pub const NOT_CALLABLE: &str = "NOT_CALLABLE";
pub const WRONG_ARG_COUNT: &str = "WRONG_ARG_COUNT";
pub const WRONG_ARG_TYPE: &str = "WRONG_ARG_TYPE";
pub const ASSERTION_FAILED: &str = "ASSERTION_FAILED";
pub const ILLEGAL_CONTROL: &str = "ILLEGAL_CONTROL";
/// Code of errors built by guest code through `Error(message)`
pub const GUEST_ERROR: &str = "Error";

/// Error payload carried by `Val::Error`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
    /// Module path the error refers to, when there is one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ErrorInfo {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}
