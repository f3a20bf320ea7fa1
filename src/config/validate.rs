// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, ScriptCiError};

/// Upper bound for `[runner].drain_grace_ms`.
pub const MAX_DRAIN_GRACE_MS: u64 = 60_000;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::ScriptCiError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.runner, raw.jobs))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_runner(cfg)?;
    validate_jobs(cfg)?;
    Ok(())
}

fn validate_runner(cfg: &RawConfigFile) -> Result<()> {
    let grace = cfg.runner.drain_grace_ms;
    if grace == 0 || grace > MAX_DRAIN_GRACE_MS {
        return Err(ScriptCiError::ConfigError(format!(
            "[runner].drain_grace_ms must be between 1 and {MAX_DRAIN_GRACE_MS} (got {grace})"
        )));
    }
    Ok(())
}

fn validate_jobs(cfg: &RawConfigFile) -> Result<()> {
    if cfg.jobs.root.as_os_str().is_empty() {
        return Err(ScriptCiError::ConfigError(
            "[jobs].root must not be empty".to_string(),
        ));
    }
    Ok(())
}
