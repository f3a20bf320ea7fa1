// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Process launch failures never show up here: the supervisor turns them into
//! the sentinel exit code so that the chain can branch on them. What remains
//! are faults the caller has to see: bad script sources and lost persistence.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptCiError {
    /// Missing or invalid script source, malformed interpreter directive,
    /// invalid job definition or config file.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A status, log or script file could not be read or written.
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScriptCiError {
    /// Wrap a filesystem-layer error as a persistence fault, keeping the
    /// whole context chain in the message.
    pub fn persistence(err: anyhow::Error) -> Self {
        ScriptCiError::Persistence(format!("{err:#}"))
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ScriptCiError>;
