// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [runner]
/// drain_grace_ms = 500
///
/// [jobs]
/// root = "jobs"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub runner: RunnerSection,

    #[serde(default)]
    pub jobs: JobsSection,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub runner: RunnerSection,
    pub jobs: JobsSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(runner: RunnerSection, jobs: JobsSection) -> Self {
        Self { runner, jobs }
    }
}

/// `[runner]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerSection {
    /// How long to keep draining script output after the process exited
    /// before giving up with a warning.
    #[serde(default = "default_drain_grace_ms")]
    pub drain_grace_ms: u64,
}

impl RunnerSection {
    pub fn drain_grace(&self) -> Duration {
        Duration::from_millis(self.drain_grace_ms)
    }
}

fn default_drain_grace_ms() -> u64 {
    500
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            drain_grace_ms: default_drain_grace_ms(),
        }
    }
}

/// `[jobs]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct JobsSection {
    /// Directory holding one numbered sub-directory per job.
    #[serde(default = "default_jobs_root")]
    pub root: PathBuf,
}

impl JobsSection {
    pub fn job_dir(&self, id: u32) -> PathBuf {
        self.root.join(id.to_string())
    }
}

fn default_jobs_root() -> PathBuf {
    PathBuf::from("jobs")
}

impl Default for JobsSection {
    fn default() -> Self {
        Self {
            root: default_jobs_root(),
        }
    }
}
