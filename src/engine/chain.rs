// src/engine/chain.rs

use std::path::Path;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::errors::{Result, ScriptCiError};
use crate::exec::{InterpreterDirective, ScriptBackend, ScriptRequest};
use crate::status::{
    collect_status, log_file, ChainStatus, Clock, RunStatus, StatusStore, SystemClock,
};
use crate::tree::{Branch, MaterializedScriptNode};

use super::state::ChainState;

/// Walks a script tree, running exactly one path through it.
///
/// Holds no per-run state: independent chains can share one executor as long
/// as each gets its own run directory.
#[derive(Debug)]
pub struct ChainExecutor<B, S, C = SystemClock> {
    backend: B,
    store: Arc<S>,
    clock: C,
}

impl<B: ScriptBackend, S: StatusStore + 'static> ChainExecutor<B, S, SystemClock> {
    pub fn new(backend: B, store: S) -> Self {
        Self::with_clock(backend, store, SystemClock)
    }
}

impl<B: ScriptBackend, S: StatusStore + 'static, C: Clock> ChainExecutor<B, S, C> {
    pub fn with_clock(backend: B, store: S, clock: C) -> Self {
        Self {
            backend,
            store: Arc::new(store),
            clock,
        }
    }

    /// Check every node's interpreter directive up front so a broken script
    /// deep in the tree cannot fail a chain halfway through.
    pub fn validate(root: &MaterializedScriptNode) -> Result<()> {
        for node in root.iter() {
            InterpreterDirective::from_code(&node.code).map_err(|e| {
                ScriptCiError::ConfigError(format!("{}: {e}", node.location.display()))
            })?;
        }
        Ok(())
    }

    /// Run the chain rooted at `root`, writing status and logs into
    /// `run_dir`, and return the exit code of the last node that ran.
    ///
    /// Each node's finished status is persisted before the next node is
    /// chosen, so after a crash the newest finished record names the last
    /// completed step.
    pub async fn run(
        &self,
        root: &MaterializedScriptNode,
        run_dir: &Path,
        handle: &Handle,
    ) -> Result<i32> {
        Self::validate(root)?;

        info!(
            root = %root.location.display(),
            run_dir = %run_dir.display(),
            "starting chain"
        );

        let mut state = ChainState::start(root);
        while let ChainState::Running(node) = state {
            let code = self.run_node(node, run_dir, handle).await?;
            state = state.advance(code);

            match state {
                ChainState::Running(next) => info!(
                    finished = %node.stem(),
                    exit_code = code,
                    branch = ?Branch::for_exit_code(code),
                    next = %next.stem(),
                    "continuing chain"
                ),
                _ => debug!(finished = %node.stem(), exit_code = code, "no matching child"),
            }
        }

        match state {
            ChainState::Completed(code) => {
                info!(
                    root = %root.location.display(),
                    exit_code = code,
                    "chain completed"
                );
                Ok(code)
            }
            other => Err(ScriptCiError::Other(anyhow!(
                "chain stopped without completing: {other:?}"
            ))),
        }
    }

    async fn run_node(
        &self,
        node: &MaterializedScriptNode,
        run_dir: &Path,
        handle: &Handle,
    ) -> Result<i32> {
        let status = RunStatus::started_at(self.clock.now());
        self.persist(run_dir, node, status.clone(), handle).await?;

        let request = ScriptRequest {
            script: node.location.clone(),
            working_dir: run_dir.to_path_buf(),
            log_file: log_file(run_dir, &node.location),
            handle: handle.clone(),
        };
        let code = self.backend.run_script(request).await?;

        let status = status.finished(self.clock.now(), code);
        self.persist(run_dir, node, status, handle).await?;
        Ok(code)
    }

    /// Write a status record on the blocking pool; the store may fsync.
    async fn persist(
        &self,
        run_dir: &Path,
        node: &MaterializedScriptNode,
        status: RunStatus,
        handle: &Handle,
    ) -> Result<()> {
        let store = Arc::clone(&self.store);
        let run_dir = run_dir.to_path_buf();
        let location = node.location.clone();
        handle
            .spawn_blocking(move || store.write_status(&run_dir, &location, &status))
            .await
            .map_err(anyhow::Error::from)?
    }

    /// Aggregate status of the run in `run_dir`; `None` before it started.
    pub fn status(
        &self,
        root: &MaterializedScriptNode,
        run_dir: &Path,
    ) -> Result<Option<ChainStatus>> {
        collect_status(self.store.as_ref(), root, run_dir)
    }
}
