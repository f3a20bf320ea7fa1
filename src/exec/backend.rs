// src/exec/backend.rs

//! Pluggable script backend abstraction.
//!
//! The chain executor talks to a `ScriptBackend` instead of spawning
//! processes itself. Production code uses [`SupervisorBackend`], which runs
//! each script through a [`ProcessSupervisor`]; tests can provide their own
//! implementation that records scripts and returns canned exit codes.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use tokio::runtime::Handle;

use crate::errors::Result;

use super::supervisor::{ProcessSupervisor, DEFAULT_DRAIN_GRACE};

/// Everything needed to run one node of a chain.
#[derive(Debug, Clone)]
pub struct ScriptRequest {
    /// Script file to run.
    pub script: PathBuf,
    /// Process working directory.
    pub working_dir: PathBuf,
    /// Merged stdout/stderr destination.
    pub log_file: PathBuf,
    /// Runtime the supervisor spawns its drain tasks on.
    pub handle: Handle,
}

/// Trait abstracting how a single script is executed.
pub trait ScriptBackend: Send + Sync {
    /// Run the script and resolve to its exit code.
    fn run_script(
        &self,
        request: ScriptRequest,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + '_>>;
}

/// Real backend: one [`ProcessSupervisor`] per request.
#[derive(Debug, Clone)]
pub struct SupervisorBackend {
    drain_grace: Duration,
}

impl SupervisorBackend {
    pub fn new(drain_grace: Duration) -> Self {
        Self { drain_grace }
    }
}

impl Default for SupervisorBackend {
    fn default() -> Self {
        Self::new(DEFAULT_DRAIN_GRACE)
    }
}

impl ScriptBackend for SupervisorBackend {
    fn run_script(
        &self,
        request: ScriptRequest,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + '_>> {
        let grace = self.drain_grace;

        Box::pin(async move {
            ProcessSupervisor::new(&request.script)?
                .use_directory(request.working_dir)
                .output_to(request.log_file)
                .execute_with(request.handle)
                .drain_grace(grace)
                .run()
                .await
        })
    }
}
