//! Run/stop control for hosts on tokio
//!
//! A `Session` moves an `Engine` into its own task and polls it in slices,
//! yielding to the runtime between slices. `stop` aborts the whole chain at
//! the next slice boundary.

use crate::loader::{ChainId, Engine, EngineError, Poll, RunOutcome};
use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub struct Session {
    id: ChainId,
    cancel: CancellationToken,
    handle: JoinHandle<Result<(RunOutcome, Engine), EngineError>>,
}

impl Session {
    /// Start `root` on `engine` and drive it on the current runtime
    pub fn spawn(mut engine: Engine, root: &str) -> Result<Self, EngineError> {
        let id = engine.start(root)?;
        let slice = engine.config().slice_steps;
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move { drive(engine, slice, token).await });
        info!(chain = %id, slice, "session spawned");
        Ok(Self { id, cancel, handle })
    }

    pub fn id(&self) -> ChainId {
        self.id
    }

    /// Ask the session to abort its chain
    pub fn stop(&self) {
        debug!(chain = %self.id, "stop requested");
        self.cancel.cancel();
    }

    /// Token that stops this session when cancelled, for signal handlers
    pub fn stop_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the chain to end; the engine comes back idle and reusable
    pub async fn wait(self) -> Result<(RunOutcome, Engine)> {
        let result = self
            .handle
            .await
            .with_context(|| format!("session task for chain {} did not complete", self.id))?;
        let (outcome, engine) = result.with_context(|| format!("chain {} failed to run", self.id))?;
        Ok((outcome, engine))
    }
}

async fn drive(
    mut engine: Engine,
    slice: usize,
    cancel: CancellationToken,
) -> Result<(RunOutcome, Engine), EngineError> {
    loop {
        if cancel.is_cancelled() {
            engine.abort();
            return Ok((RunOutcome::Aborted, engine));
        }

        match engine.poll(slice) {
            Ok(Poll::Ready(outcome)) => return Ok((outcome, engine)),
            Ok(Poll::Pending) => {}
            Err(err) => {
                engine.abort();
                return Err(err);
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::task::yield_now() => {}
        }
    }
}
