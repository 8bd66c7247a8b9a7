//! Pausable loader
//!
//! The engine owns the import chain: a stack of runners where the last one
//! is running and every other one is suspended on a `require`. It drives the
//! chain in slices of at most `budget` interpreter steps, so the embedding
//! scheduler keeps control between slices.
//!
//! ## Import protocol
//!
//! 1. The running unit hits `require(specifier)` for a non-builtin and suspends.
//! 2. `load_async` resolves the specifier against the working directory, switches
//!    the working directory to the callee's directory and pushes a new
//!    runner. A resolution or parse failure restores the directory and
//!    resumes the caller with an abnormal completion instead.
//! 3. When the callee finishes, it is popped, the caller is resumed with its
//!    tagged result and the working directory goes back to the caller's.

use super::builtins::BuiltinTable;
use super::console::{Console, OutputLine};
use super::resolve::{load_module, resolve, WorkingDir};
use super::runner::{Runner, RunnerStatus, UnitState};
use super::LoadError;
use crate::config::EngineConfig;
use crate::executor::{Completion, ConsoleLevel, Host, Require, Val};
use crate::vfs::VirtualFs;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ChainId(Uuid);

impl ChainId {
    fn new() -> Self {
        ChainId(Uuid::new_v4())
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("A chain is already running ({0})")]
    Busy(ChainId),

    #[error("No chain is running")]
    Idle,

    #[error("The running unit is not waiting on an import")]
    NotSuspended,

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// How a chain ended
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The root unit finished with this export
    Completed(Val),
    /// A throw escaped the root unit
    Failed(Val),
    /// The chain was discarded by `abort`
    Aborted,
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }

    /// Structured view of a failure
    pub fn load_error(&self) -> Option<LoadError> {
        match self {
            RunOutcome::Failed(value) => Some(LoadError::from_thrown(value.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Poll {
    /// The slice budget ran out; call `poll` again
    Pending,
    /// The chain ended and the engine is idle again
    Ready(RunOutcome),
}

/// One unit of the chain, for inspection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitSnapshot {
    pub path: String,
    pub dir: String,
    pub state: UnitState,
    pub waiting_on: Option<String>,
}

struct Chain {
    id: ChainId,
    runners: Vec<Runner>,
    /// Working directory to return to when the chain ends
    origin_dir: String,
    started_at: DateTime<Utc>,
}

pub struct Engine {
    fs: Box<dyn VirtualFs>,
    builtins: BuiltinTable,
    console: Box<dyn Console>,
    cwd: WorkingDir,
    config: EngineConfig,
    chain: Option<Chain>,
}

impl Engine {
    pub fn new(fs: impl VirtualFs + 'static, console: impl Console + 'static) -> Self {
        Self::with_config(fs, console, EngineConfig::default())
    }

    pub fn with_config(
        fs: impl VirtualFs + 'static,
        console: impl Console + 'static,
        config: EngineConfig,
    ) -> Self {
        Self {
            fs: Box::new(fs),
            builtins: BuiltinTable::new(),
            console: Box::new(console),
            cwd: WorkingDir::new(config.initial_dir.clone()),
            config,
            chain: None,
        }
    }

    pub fn with_builtins(mut self, builtins: BuiltinTable) -> Self {
        self.builtins = builtins;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cwd(&self) -> &str {
        self.cwd.get()
    }

    pub fn is_running(&self) -> bool {
        self.chain.is_some()
    }

    pub fn chain_id(&self) -> Option<ChainId> {
        self.chain.as_ref().map(|chain| chain.id)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.chain.as_ref().map(|chain| chain.started_at)
    }

    /// Number of units on the chain
    pub fn depth(&self) -> usize {
        self.chain.as_ref().map_or(0, |chain| chain.runners.len())
    }

    /// Units on the chain, root first
    pub fn chain_snapshot(&self) -> Vec<UnitSnapshot> {
        let Some(chain) = &self.chain else {
            return Vec::new();
        };
        chain
            .runners
            .iter()
            .map(|runner| UnitSnapshot {
                path: runner.path.clone(),
                dir: runner.dir.clone(),
                state: runner.state(),
                waiting_on: runner.waiting_on().map(str::to_string),
            })
            .collect()
    }

    /// Begin a new chain rooted at `root`, resolved against the working
    /// directory
    pub fn start(&mut self, root: &str) -> Result<ChainId, EngineError> {
        if let Some(chain) = &self.chain {
            return Err(EngineError::Busy(chain.id));
        }

        let origin_dir = self.cwd.get().to_string();
        let runner = open_unit(
            self.fs.as_ref(),
            &mut self.cwd,
            root,
            0,
            self.config.max_import_depth,
        )?;

        let id = ChainId::new();
        info!(chain = %id, root = %runner.path, "chain started");
        self.chain = Some(Chain {
            id,
            runners: vec![runner],
            origin_dir,
            started_at: Utc::now(),
        });
        Ok(id)
    }

    /// Run the chain for at most `budget` interpreter steps
    pub fn poll(&mut self, budget: usize) -> Result<Poll, EngineError> {
        let mut remaining = budget.max(1);
        loop {
            let chain = self.chain.as_mut().ok_or(EngineError::Idle)?;
            let top = chain.runners.last_mut().ok_or(EngineError::Idle)?;

            let module = top.path.clone();
            let mut host = EngineHost {
                builtins: &self.builtins,
                console: self.console.as_mut(),
                cwd: &self.cwd,
                module: &module,
            };
            let (status, used) = top.run(&mut host, remaining);
            remaining = remaining.saturating_sub(used);

            match status {
                RunnerStatus::Pending => return Ok(Poll::Pending),
                RunnerStatus::Suspended(specifier) => self.load_async(&specifier)?,
                RunnerStatus::Finished(completion) => {
                    if let Some(outcome) = self.finish_top(completion) {
                        return Ok(Poll::Ready(outcome));
                    }
                }
            }

            if remaining == 0 {
                return Ok(Poll::Pending);
            }
        }
    }

    /// Serve the import the running unit is suspended on
    ///
    /// `poll` calls this whenever the running unit suspends. Builtins never
    /// get here: they complete inline at the `require` call. Pushes the
    /// callee on success. On failure the working directory is restored and
    /// the caller is resumed with the error, to be thrown at its `require`
    /// call.
    pub fn load_async(&mut self, specifier: &str) -> Result<(), EngineError> {
        let chain = self.chain.as_mut().ok_or(EngineError::Idle)?;
        let depth = chain.runners.len();
        let caller = chain.runners.last_mut().ok_or(EngineError::Idle)?;
        if caller.waiting_on().is_none() {
            return Err(EngineError::NotSuspended);
        }

        match open_unit(
            self.fs.as_ref(),
            &mut self.cwd,
            specifier,
            depth,
            self.config.max_import_depth,
        ) {
            Ok(runner) => {
                debug!(path = %runner.path, depth = depth + 1, "unit pushed");
                chain.runners.push(runner);
            }
            Err(err) => {
                debug!(specifier, error = %err, "import failed");
                caller.resume(Completion::Abnormal(err.to_val()));
            }
        }
        Ok(())
    }

    /// Discard the whole chain
    ///
    /// Returns how many units were dropped. The engine is idle afterwards
    /// and nothing from the old chain can be resumed.
    pub fn abort(&mut self) -> usize {
        let Some(chain) = self.chain.take() else {
            return 0;
        };
        let dropped = chain.runners.len();
        self.cwd.set(chain.origin_dir);
        info!(chain = %chain.id, dropped, "chain aborted");
        dropped
    }

    /// Poll in configured slices until the chain ends
    pub fn run_to_end(&mut self) -> Result<RunOutcome, EngineError> {
        loop {
            if let Poll::Ready(outcome) = self.poll(self.config.slice_steps)? {
                return Ok(outcome);
            }
        }
    }

    /// `start` followed by `run_to_end`
    pub fn run(&mut self, root: &str) -> Result<RunOutcome, EngineError> {
        self.start(root)?;
        self.run_to_end()
    }

    /// Pop the finished top unit and hand its result to the caller
    ///
    /// Returns the chain's outcome when the root itself finished.
    fn finish_top(&mut self, completion: Completion) -> Option<RunOutcome> {
        let chain = self.chain.as_mut()?;
        let finished = chain.runners.pop()?;
        debug!(path = %finished.path, normal = completion.is_normal(), "unit popped");

        if let Some(caller) = chain.runners.last_mut() {
            caller.resume(completion);
            self.cwd.set(caller.dir.clone());
            return None;
        }

        let chain = self.chain.take()?;
        self.cwd.set(chain.origin_dir);
        let elapsed_ms = (Utc::now() - chain.started_at).num_milliseconds();
        let outcome = match completion {
            Completion::Normal(value) => RunOutcome::Completed(value),
            Completion::Abnormal(error) => RunOutcome::Failed(error),
        };
        info!(
            chain = %chain.id,
            completed = outcome.is_completed(),
            elapsed_ms,
            "chain finished"
        );
        Some(outcome)
    }
}

/// Resolve, check depth, enter the callee's directory and build its runner
///
/// The working directory is left untouched when this fails.
fn open_unit(
    fs: &dyn VirtualFs,
    cwd: &mut WorkingDir,
    specifier: &str,
    depth: usize,
    max_depth: usize,
) -> Result<Runner, LoadError> {
    let resolved = resolve(fs, cwd.get(), specifier)?;
    if depth >= max_depth {
        return Err(LoadError::DepthExceeded {
            path: resolved.path,
            limit: max_depth,
        });
    }

    let saved = cwd.enter(resolved.dir.clone());
    match load_module(fs, &resolved) {
        Ok(module) => Ok(Runner::new(resolved.path, resolved.dir, module)),
        Err(err) => {
            cwd.restore(saved);
            Err(err)
        }
    }
}

/// Host seen by the running unit of a chain
///
/// Builtins complete inline; anything else defers and the unit suspends.
struct EngineHost<'a> {
    builtins: &'a BuiltinTable,
    console: &'a mut dyn Console,
    cwd: &'a WorkingDir,
    module: &'a str,
}

impl Host for EngineHost<'_> {
    fn require(&mut self, specifier: &str) -> Require {
        match self.builtins.resolve(specifier) {
            Some(builtin) => Require::Ready(Completion::Normal(builtin)),
            None => Require::Deferred,
        }
    }

    fn print(&mut self, level: ConsoleLevel, text: String) {
        self.console.write(OutputLine::new(level, self.module, text));
    }

    fn cwd(&self) -> String {
        self.cwd.get().to_string()
    }
}
