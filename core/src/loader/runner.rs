//! One loaded module and its execution state

use crate::executor::{inject_globals, run_steps, Completion, Host, Outcome, Val, VM};
use crate::parser::ModuleDef;
use serde::{Deserialize, Serialize};

/// Lifecycle of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitState {
    Running,
    Suspended,
    Completed,
    Failed,
}

/// What a run of a unit stopped on
#[derive(Debug, Clone, PartialEq)]
pub enum RunnerStatus {
    /// The step budget ran out with work left
    Pending,
    /// Waiting on a deferred import of this specifier
    Suspended(String),
    /// The body finished; the tagged result is the unit's export
    Finished(Completion),
}

/// A module body bound to its path, directory and VM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Runner {
    pub path: String,
    pub dir: String,
    vm: VM,
    state: UnitState,
}

impl Runner {
    pub fn new(path: impl Into<String>, dir: impl Into<String>, module: ModuleDef) -> Self {
        let path = path.into();
        let dir = dir.into();
        let vm = VM::new(module.body, inject_globals(&path, &dir));
        Self {
            path,
            dir,
            vm,
            state: UnitState::Running,
        }
    }

    pub fn state(&self) -> UnitState {
        self.state
    }

    /// Specifier of the pending import, while suspended
    pub fn waiting_on(&self) -> Option<&str> {
        self.vm.suspended_on()
    }

    /// Step the unit for at most `budget` steps
    ///
    /// Returns where it stopped and how many steps that took.
    pub fn run(&mut self, host: &mut dyn Host, budget: usize) -> (RunnerStatus, usize) {
        let (_, used) = run_steps(&mut self.vm, host, budget);
        let status = self.status();
        self.state = match &status {
            RunnerStatus::Pending => UnitState::Running,
            RunnerStatus::Suspended(_) => UnitState::Suspended,
            RunnerStatus::Finished(Completion::Normal(_)) => UnitState::Completed,
            RunnerStatus::Finished(Completion::Abnormal(_)) => UnitState::Failed,
        };
        (status, used)
    }

    /// Deliver the result of the import this unit is suspended on
    pub fn resume(&mut self, completion: Completion) -> bool {
        let resumed = self.vm.resume(completion);
        if resumed {
            self.state = UnitState::Running;
        }
        resumed
    }

    pub fn status(&self) -> RunnerStatus {
        match self.vm.outcome() {
            Outcome::Running => RunnerStatus::Pending,
            Outcome::Suspended(specifier) => RunnerStatus::Suspended(specifier),
            Outcome::Returned(value) | Outcome::FellThrough(value) => {
                RunnerStatus::Finished(Completion::Normal(self.exported(value)))
            }
            Outcome::Threw(error) => RunnerStatus::Finished(Completion::Abnormal(error)),
        }
    }

    /// `module.exports` when it was set, else the body's own result
    fn exported(&self, fallback: Val) -> Val {
        match self.vm.env.global("module") {
            Some(Val::Obj(module)) => match module.get("exports") {
                None | Some(Val::Bool(false)) => fallback,
                Some(exports) => exports.clone(),
            },
            _ => fallback,
        }
    }
}
