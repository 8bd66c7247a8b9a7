//! Cadence: a pausable module execution engine
//!
//! Guest modules call `require` as if it were synchronous. Under the
//! [`loader::Engine`] an import suspends the importing unit, runs the
//! imported module on its own (possibly across many host scheduler turns)
//! and resumes the importer with the result. [`loader::SyncLoader`] runs the
//! same chains inline.

pub mod cli;
pub mod config;
pub mod executor;
pub mod loader;
pub mod parser;
pub mod session;
pub mod vfs;

pub use config::Config;
pub use executor::{Completion, Val};
pub use loader::{Engine, LoadError, Poll, RunOutcome, SyncLoader};
pub use session::Session;
pub use vfs::{DiskFs, MemoryFs, VirtualFs};
