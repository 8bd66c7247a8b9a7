//! The interface a running unit uses to reach outside its own VM
//!
//! The executor never touches files, output or other units directly. Imports,
//! console output and the working directory all go through a `Host`, which is
//! what lets the same VM run under the synchronous loader (imports complete
//! inline) and under the pausable engine (imports defer and the VM suspends).

use super::types::Completion;
use serde::{Deserialize, Serialize};

/// Answer to a `require(specifier)` call
#[derive(Debug, Clone, PartialEq)]
pub enum Require {
    /// The import finished inline with this tagged result
    Ready(Completion),
    /// The import will complete later; the unit must suspend
    Deferred,
}

/// Console method that produced an output line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Log,
    Info,
    Warn,
    Error,
}

impl ConsoleLevel {
    /// Prefix used when rendering a line for the IDE output pane
    pub fn prefix(self) -> &'static str {
        match self {
            ConsoleLevel::Log | ConsoleLevel::Info => "[LOG]",
            ConsoleLevel::Warn | ConsoleLevel::Error => "[ERR]",
        }
    }

    pub fn is_error(self) -> bool {
        matches!(self, ConsoleLevel::Warn | ConsoleLevel::Error)
    }
}

pub trait Host {
    /// Resolve an import issued by the running unit
    fn require(&mut self, specifier: &str) -> Require;

    /// Receive a line printed through `console`
    fn print(&mut self, level: ConsoleLevel, text: String);

    /// Current value of the working-directory tracker
    fn cwd(&self) -> String;
}
