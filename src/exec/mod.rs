// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running scripts, using
//! `tokio::process::Command`, and reporting their exit codes.
//!
//! - [`directive`] parses the `#!` line that names a script's interpreter.
//! - [`sink`] drains stdout/stderr concurrently into one merged log.
//! - [`supervisor`] owns the [`ProcessSupervisor`] that launches a script,
//!   waits for it and turns launch failures into a sentinel exit code.
//! - [`backend`] provides the `ScriptBackend` trait and the production
//!   `SupervisorBackend`, which tests can replace with a fake implementation.

pub mod backend;
pub mod directive;
pub mod sink;
pub mod supervisor;

pub use backend::{ScriptBackend, ScriptRequest, SupervisorBackend};
pub use directive::InterpreterDirective;
pub use supervisor::{ProcessSupervisor, DEFAULT_DRAIN_GRACE, LAUNCH_FAILURE_EXIT_CODE};
