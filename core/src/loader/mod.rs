//! Module loading and execution
//!
//! Two loaders share the same building blocks:
//!
//! - [`SyncLoader`] runs an import chain to completion inline; nested
//!   `require` calls are native recursion.
//! - [`Engine`] keeps the chain as an explicit stack of suspended units and
//!   runs it in bounded slices, so a host scheduler keeps control between
//!   slices and can abort the whole chain at any point.
//!
//! Both consult the [`BuiltinTable`] before touching the filesystem, track
//! the working directory with a [`WorkingDir`], and apply the same export
//! convention when a unit finishes.

pub mod builtins;
pub mod console;
pub mod engine;
pub mod resolve;
pub mod runner;
pub mod sync_loader;

#[cfg(test)]
mod tests;

pub use builtins::BuiltinTable;
pub use console::{ChannelConsole, Console, OutputLine, SharedBuffer, StdioConsole};
pub use engine::{ChainId, Engine, EngineError, Poll, RunOutcome, UnitSnapshot};
pub use resolve::WorkingDir;
pub use runner::{Runner, RunnerStatus, UnitState};
pub use sync_loader::SyncLoader;

use crate::executor::errors::{self, ErrorInfo};
use crate::executor::Val;
use thiserror::Error;

/// Why an import did not produce a value
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("Cannot find module '{path}'")]
    ModuleNotFound { path: String },

    #[error("Failed to parse '{path}': {message}")]
    Parse { path: String, message: String },

    #[error("Module threw: {0}")]
    GuestThrew(Val),

    #[error("Import depth limit of {limit} exceeded while loading '{path}'")]
    DepthExceeded { path: String, limit: usize },
}

impl LoadError {
    /// Guest-visible error value, re-raised at the `require` call site
    pub fn to_val(&self) -> Val {
        match self {
            LoadError::ModuleNotFound { path } => Val::Error(
                ErrorInfo::new(errors::MODULE_NOT_FOUND, self.to_string()).with_path(path),
            ),
            LoadError::Parse { path, .. } => Val::Error(
                ErrorInfo::new(errors::PARSE_ERROR, self.to_string()).with_path(path),
            ),
            LoadError::DepthExceeded { path, .. } => Val::Error(
                ErrorInfo::new(errors::IMPORT_DEPTH_EXCEEDED, self.to_string()).with_path(path),
            ),
            LoadError::GuestThrew(value) => value.clone(),
        }
    }

    /// Classify a value thrown out of an import chain
    ///
    /// Loader failures travel through guest code as error values; this
    /// recovers the structured error from the code and path they carry.
    /// Error values do not carry the depth limit, so `DepthExceeded` comes
    /// back with a limit of 0.
    pub fn from_thrown(value: Val) -> Self {
        let Val::Error(info) = &value else {
            return LoadError::GuestThrew(value);
        };
        let path = info.path.clone().unwrap_or_default();
        match info.code.as_str() {
            errors::MODULE_NOT_FOUND => LoadError::ModuleNotFound { path },
            errors::PARSE_ERROR => LoadError::Parse {
                path,
                message: info.message.clone(),
            },
            errors::IMPORT_DEPTH_EXCEEDED => LoadError::DepthExceeded {
                path,
                limit: 0,
            },
            _ => LoadError::GuestThrew(value),
        }
    }
}
