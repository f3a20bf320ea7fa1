// src/status/store.rs

//! Key-value persistence of per-node run status.
//!
//! Records are keyed by `(run directory, node location)`. The file-backed
//! store lays them out as `<run_dir>/<stem>-status.json` next to the node's
//! `<stem>-out.log`.

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{Result, ScriptCiError};
use crate::fs::FileSystem;
use crate::status::record::RunStatus;
use crate::tree::script_stem;

/// Status file of the node at `node` for the run in `run_dir`.
pub fn status_file(run_dir: &Path, node: &Path) -> PathBuf {
    run_dir.join(format!("{}-status.json", script_stem(node)))
}

/// Log file of the node at `node` for the run in `run_dir`.
pub fn log_file(run_dir: &Path, node: &Path) -> PathBuf {
    run_dir.join(format!("{}-out.log", script_stem(node)))
}

pub trait StatusStore: Send + Sync + Debug {
    /// Durably replace the node's record. Readers see either the old or the
    /// new record, never a partial one.
    fn write_status(&self, run_dir: &Path, node: &Path, status: &RunStatus) -> Result<()>;

    /// `None` when the node has not started in this run.
    fn read_status(&self, run_dir: &Path, node: &Path) -> Result<Option<RunStatus>>;

    /// `None` when the node has produced no log in this run.
    fn read_log(&self, run_dir: &Path, node: &Path) -> Result<Option<String>>;
}

/// [`StatusStore`] on top of a [`FileSystem`].
#[derive(Debug, Clone, Default)]
pub struct FsStatusStore<F: FileSystem> {
    fs: F,
}

impl<F: FileSystem> FsStatusStore<F> {
    pub fn new(fs: F) -> Self {
        Self { fs }
    }
}

impl<F: FileSystem> StatusStore for FsStatusStore<F> {
    fn write_status(&self, run_dir: &Path, node: &Path, status: &RunStatus) -> Result<()> {
        let path = status_file(run_dir, node);
        let json = serde_json::to_vec(status)?;
        self.fs
            .write_atomic(&path, &json)
            .map_err(ScriptCiError::persistence)?;
        debug!(status_file = %path.display(), finished = status.is_finished(), "status written");
        Ok(())
    }

    fn read_status(&self, run_dir: &Path, node: &Path) -> Result<Option<RunStatus>> {
        let path = status_file(run_dir, node);
        if !self.fs.is_file(&path) {
            return Ok(None);
        }
        let text = self
            .fs
            .read_to_string(&path)
            .map_err(ScriptCiError::persistence)?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    fn read_log(&self, run_dir: &Path, node: &Path) -> Result<Option<String>> {
        let path = log_file(run_dir, node);
        if !self.fs.is_file(&path) {
            return Ok(None);
        }
        self.fs
            .read_to_string(&path)
            .map(Some)
            .map_err(ScriptCiError::persistence)
    }
}
