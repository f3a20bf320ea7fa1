// src/job/single.rs

//! Ad-hoc "run this one script now" job.
//!
//! Lives in `<jobs root>/single-job` and is overwritten on every run:
//!
//! ```text
//! single-job/scripts/script.sh
//! single-job/work/              process working directory
//! single-job/out.log
//! single-job/status.json
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tracing::info;

use crate::errors::{Result, ScriptCiError};
use crate::exec::{InterpreterDirective, ProcessSupervisor};
use crate::fs::FileSystem;
use crate::status::{Clock, RunStatus};

pub const SINGLE_JOB_DIR: &str = "single-job";

/// Last single-job status plus its captured output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleJobReport {
    #[serde(flatten)]
    pub status: RunStatus,
    pub log: String,
}

#[derive(Debug, Clone)]
pub struct SingleJob {
    home: PathBuf,
}

impl SingleJob {
    pub fn new(jobs_root: impl AsRef<Path>) -> Self {
        Self {
            home: jobs_root.as_ref().join(SINGLE_JOB_DIR),
        }
    }

    pub fn script_path(&self) -> PathBuf {
        self.home.join("scripts").join("script.sh")
    }

    pub fn work_dir(&self) -> PathBuf {
        self.home.join("work")
    }

    pub fn log_path(&self) -> PathBuf {
        self.home.join("out.log")
    }

    pub fn status_path(&self) -> PathBuf {
        self.home.join("status.json")
    }

    /// Save `code` as the single job's script and run it.
    pub async fn run(
        &self,
        fs: &dyn FileSystem,
        clock: &dyn Clock,
        code: &str,
        handle: &Handle,
        drain_grace: Duration,
    ) -> Result<i32> {
        InterpreterDirective::from_code(code)?;

        let script = self.script_path();
        fs.write(&script, code.as_bytes())
            .map_err(ScriptCiError::persistence)?;
        fs.create_dir_all(&self.work_dir())
            .map_err(ScriptCiError::persistence)?;

        info!(script = %script.display(), "running single-job");
        let status = RunStatus::started_at(clock.now());
        self.write_status(fs, &status)?;

        let exit_code = ProcessSupervisor::new(&script)?
            .use_directory(self.work_dir())
            .output_to(self.log_path())
            .execute_with(handle.clone())
            .drain_grace(drain_grace)
            .spawn()
            .await
            .map_err(anyhow::Error::from)??;

        self.write_status(fs, &status.finished(clock.now(), exit_code))?;
        info!(exit_code, "ran single-job");
        Ok(exit_code)
    }

    /// Current script source, if one was ever saved.
    pub fn script(&self, fs: &dyn FileSystem) -> Result<Option<String>> {
        let path = self.script_path();
        if !fs.is_file(&path) {
            return Ok(None);
        }
        fs.read_to_string(&path)
            .map(Some)
            .map_err(ScriptCiError::persistence)
    }

    /// `None` until the single job has been started once.
    pub fn report(&self, fs: &dyn FileSystem) -> Result<Option<SingleJobReport>> {
        let status_path = self.status_path();
        if !fs.is_file(&status_path) {
            return Ok(None);
        }
        let status: RunStatus = serde_json::from_str(
            &fs.read_to_string(&status_path)
                .map_err(ScriptCiError::persistence)?,
        )?;
        let log_path = self.log_path();
        let log = if fs.is_file(&log_path) {
            fs.read_to_string(&log_path)
                .map_err(ScriptCiError::persistence)?
        } else {
            String::new()
        };
        Ok(Some(SingleJobReport { status, log }))
    }

    fn write_status(&self, fs: &dyn FileSystem, status: &RunStatus) -> Result<()> {
        let json = serde_json::to_vec(status)?;
        fs.write_atomic(&self.status_path(), &json)
            .map_err(ScriptCiError::persistence)
    }
}
