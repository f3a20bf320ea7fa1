// src/job/mod.rs

//! Jobs: a numbered directory holding one script tree and its runs.
//!
//! ```text
//! jobs/7/
//!   scripts/script-o.sh        root
//!   scripts/script-oo.sh       root's success child
//!   scripts/script-oe.sh       root's failure child
//!   runs/1/script-o-status.json
//!   runs/1/script-o-out.log
//! ```

pub mod single;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tracing::info;

use crate::engine::ChainExecutor;
use crate::errors::{Result, ScriptCiError};
use crate::exec::{InterpreterDirective, ScriptBackend};
use crate::fs::FileSystem;
use crate::status::{ChainStatus, Clock, StatusStore};
use crate::tree::{read_tree, write_tree, Branch, MaterializedScriptNode, ScriptNode};

pub use single::{SingleJob, SingleJobReport};

pub const SCRIPTS_DIR: &str = "scripts";
pub const RUNS_DIR: &str = "runs";
pub const ROOT_SCRIPT: &str = "script-o.sh";

/// Job as submitted by a client or shown back to one.
///
/// ```json
/// { "okScript": { "code": "#!/bin/sh\nmake", "okScript": { "code": "#!/bin/sh\nmake install" } } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDefinition {
    /// Only filled in when showing an existing job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,

    #[serde(rename = "okScript", default)]
    pub ok_script: Option<ScriptNode>,
}

impl JobDefinition {
    pub fn new(root: ScriptNode) -> Self {
        Self {
            id: None,
            ok_script: Some(root),
        }
    }

    /// Check that a root exists and every node has a usable interpreter
    /// directive. Returns the root.
    pub fn validate(&self) -> Result<&ScriptNode> {
        let root = self
            .ok_script
            .as_ref()
            .ok_or_else(|| ScriptCiError::ConfigError("missing Job#okScript".to_string()))?;
        validate_node(root, "okScript")?;
        Ok(root)
    }
}

fn validate_node(node: &ScriptNode, path: &str) -> Result<()> {
    if node.code.trim().is_empty() {
        return Err(ScriptCiError::ConfigError(format!("missing Script#code at {path}")));
    }
    InterpreterDirective::from_code(&node.code)
        .map_err(|e| ScriptCiError::ConfigError(format!("{path}: {e}")))?;

    for branch in [Branch::Success, Branch::Failure] {
        if let Some(child) = node.child(branch) {
            let key = match branch {
                Branch::Success => "okScript",
                Branch::Failure => "errorScript",
            };
            validate_node(child, &format!("{path}.{key}"))?;
        }
    }
    Ok(())
}

/// Report for one run of a job.
///
/// `started` comes from the first node of the chain; `ended` and `exitCode`
/// from the last one that ran, so they stay empty while it is still running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRunSummary {
    pub run: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok_script_status: Option<ChainStatus>,
}

impl JobRunSummary {
    pub fn from_status(run: u32, status: Option<ChainStatus>) -> Self {
        let (started, ended, exit_code) = match &status {
            Some(root) => {
                let path = root.path();
                let last = path.last().map_or(&root.record, |s| &s.record);
                (Some(root.record.started), last.ended, last.exit_code)
            }
            None => (None, None, None),
        };
        Self {
            run,
            started,
            ended,
            exit_code,
            ok_script_status: status,
        }
    }
}

/// A job that exists on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    id: u32,
    directory: PathBuf,
    root: MaterializedScriptNode,
}

impl Job {
    /// Persist `definition` into `directory`, whose name is the job id.
    pub fn write_to(
        fs: &dyn FileSystem,
        definition: &JobDefinition,
        directory: impl AsRef<Path>,
    ) -> Result<Self> {
        let directory = directory.as_ref();
        let root = definition.validate()?;
        let id = parse_job_id(directory)?;

        let scripts = directory.join(SCRIPTS_DIR);
        fs.create_dir_all(&scripts)
            .map_err(ScriptCiError::persistence)?;
        let root = write_tree(fs, root, &scripts.join(ROOT_SCRIPT))?;

        info!(job = id, dir = %directory.display(), scripts = root.iter().count(), "job written");
        Ok(Self {
            id,
            directory: directory.to_path_buf(),
            root,
        })
    }

    /// Load the job stored in `directory`.
    pub fn open(fs: &dyn FileSystem, directory: impl AsRef<Path>) -> Result<Self> {
        let directory = directory.as_ref();
        let id = parse_job_id(directory)?;
        let root_path = directory.join(SCRIPTS_DIR).join(ROOT_SCRIPT);
        if !fs.is_file(&root_path) {
            return Err(ScriptCiError::ConfigError(format!(
                "no job at {:?} (missing {ROOT_SCRIPT})",
                directory
            )));
        }
        let root = read_tree(fs, &root_path)?;
        Ok(Self {
            id,
            directory: directory.to_path_buf(),
            root,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn root(&self) -> &MaterializedScriptNode {
        &self.root
    }

    pub fn run_dir(&self, run_id: u32) -> PathBuf {
        self.directory.join(RUNS_DIR).join(run_id.to_string())
    }

    pub fn definition(&self) -> JobDefinition {
        JobDefinition {
            id: Some(self.id),
            ok_script: Some(self.root.to_script_node()),
        }
    }

    /// Clear the run directory and run the whole chain in it.
    pub async fn run<F, B, S, C>(
        &self,
        fs: &F,
        executor: &ChainExecutor<B, S, C>,
        run_id: u32,
        handle: &Handle,
    ) -> Result<i32>
    where
        F: FileSystem + Clone + 'static,
        B: ScriptBackend,
        S: StatusStore + 'static,
        C: Clock,
    {
        let run_dir = self.run_dir(run_id);
        let clear = {
            let fs = fs.clone();
            let run_dir = run_dir.clone();
            move || fs.clear_dir(&run_dir)
        };
        handle
            .spawn_blocking(clear)
            .await
            .map_err(anyhow::Error::from)?
            .map_err(ScriptCiError::persistence)?;

        info!(job = self.id, run = run_id, "running job");
        executor.run(&self.root, &run_dir, handle).await
    }

    pub fn summary<B, S, C>(
        &self,
        executor: &ChainExecutor<B, S, C>,
        run_id: u32,
    ) -> Result<JobRunSummary>
    where
        B: ScriptBackend,
        S: StatusStore + 'static,
        C: Clock,
    {
        let status = executor.status(&self.root, &self.run_dir(run_id))?;
        Ok(JobRunSummary::from_status(run_id, status))
    }
}

fn parse_job_id(directory: &Path) -> Result<u32> {
    directory
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.parse::<u32>().ok())
        .ok_or_else(|| {
            ScriptCiError::ConfigError(format!(
                "job directory name must be a number, got {:?}",
                directory
            ))
        })
}
