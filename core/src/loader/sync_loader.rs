//! Synchronous loader
//!
//! Runs an import chain to completion inline. A nested `require` loads and
//! runs the imported module right there, so the chain is native recursion
//! and the loader's host never asks a unit to suspend. Each nested load grows
//! the native stack when it runs low, so chains up to `max_import_depth`
//! run on an ordinary thread.

use super::builtins::BuiltinTable;
use super::console::{Console, OutputLine};
use super::resolve::{load_module, resolve, WorkingDir};
use super::runner::{Runner, RunnerStatus};
use super::LoadError;
use crate::config::EngineConfig;
use crate::executor::errors;
use crate::executor::{Completion, ConsoleLevel, Host, Require, Val};
use crate::vfs::VirtualFs;
use tracing::{debug, info};

pub struct SyncLoader {
    fs: Box<dyn VirtualFs>,
    builtins: BuiltinTable,
    console: Box<dyn Console>,
    cwd: WorkingDir,
    /// Paths of the units currently running, outermost first
    stack: Vec<String>,
    max_depth: usize,
}

impl SyncLoader {
    pub fn new(fs: impl VirtualFs + 'static, console: impl Console + 'static) -> Self {
        let defaults = EngineConfig::default();
        Self {
            fs: Box::new(fs),
            builtins: BuiltinTable::new(),
            console: Box::new(console),
            cwd: WorkingDir::new(defaults.initial_dir),
            stack: Vec::new(),
            max_depth: defaults.max_import_depth,
        }
    }

    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        self.cwd = WorkingDir::new(config.initial_dir.clone());
        self.max_depth = config.max_import_depth;
        self
    }

    pub fn with_builtins(mut self, builtins: BuiltinTable) -> Self {
        self.builtins = builtins;
        self
    }

    pub fn cwd(&self) -> &str {
        self.cwd.get()
    }

    /// Number of units currently running
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Load `specifier` relative to the working directory, running it and
    /// everything it imports
    pub fn load_sync(&mut self, specifier: &str) -> Result<Val, LoadError> {
        info!(specifier, cwd = self.cwd.get(), "sync load started");
        let result = self.load(specifier).into_result().map_err(LoadError::from_thrown);
        match &result {
            Ok(_) => info!(specifier, "sync load finished"),
            Err(err) => info!(specifier, error = %err, "sync load failed"),
        }
        result
    }

    /// Resolve and run one import, returning its tagged result
    pub fn load(&mut self, specifier: &str) -> Completion {
        if let Some(builtin) = self.builtins.resolve(specifier) {
            debug!(specifier, "builtin import");
            return Completion::Normal(builtin);
        }

        let resolved = match resolve(self.fs.as_ref(), self.cwd.get(), specifier) {
            Ok(resolved) => resolved,
            Err(err) => return Completion::Abnormal(err.to_val()),
        };

        if self.stack.len() >= self.max_depth {
            let err = LoadError::DepthExceeded {
                path: resolved.path,
                limit: self.max_depth,
            };
            return Completion::Abnormal(err.to_val());
        }

        let saved = self.cwd.enter(resolved.dir.clone());
        let module = match load_module(self.fs.as_ref(), &resolved) {
            Ok(module) => module,
            Err(err) => {
                self.cwd.restore(saved);
                return Completion::Abnormal(err.to_val());
            }
        };

        debug!(path = %resolved.path, depth = self.stack.len() + 1, "running module");
        self.stack.push(resolved.path.clone());
        let mut runner = Runner::new(resolved.path, resolved.dir, module);
        let (status, _) = ensure_sufficient_stack(|| runner.run(self, usize::MAX));
        self.stack.pop();
        self.cwd.restore(saved);

        match status {
            RunnerStatus::Finished(completion) => completion,
            RunnerStatus::Suspended(pending) => Completion::Abnormal(Val::error(
                errors::ILLEGAL_CONTROL,
                format!("Unit suspended on '{}' under the synchronous loader", pending),
            )),
            RunnerStatus::Pending => Completion::Abnormal(Val::error(
                errors::ILLEGAL_CONTROL,
                "Unit stopped before finishing",
            )),
        }
    }
}

/// Keep at least this much native stack free before running a nested unit
const RED_ZONE: usize = 128 * 1024;

/// Size of each extra stack segment
const STACK_PER_SEGMENT: usize = 1024 * 1024;

fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_SEGMENT, f)
}

impl Host for SyncLoader {
    fn require(&mut self, specifier: &str) -> Require {
        Require::Ready(self.load(specifier))
    }

    fn print(&mut self, level: ConsoleLevel, text: String) {
        let module = self.stack.last().map(String::as_str).unwrap_or("<host>");
        self.console.write(OutputLine::new(level, module, text));
    }

    fn cwd(&self) -> String {
        self.cwd.get().to_string()
    }
}
