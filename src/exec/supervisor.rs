// src/exec/supervisor.rs

//! Running a single script as a supervised child process.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::errors::{Result, ScriptCiError};
use crate::exec::directive::InterpreterDirective;
use crate::exec::sink::{drain, LogLine, LogSink, StreamKind, LINE_CHANNEL_CAPACITY};

/// Exit code reported when the process could not be launched or supervised.
pub const LAUNCH_FAILURE_EXIT_CODE: i32 = 1;

/// How long to wait for output to finish draining once the process exited.
pub const DEFAULT_DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Runs one script file through the interpreter named on its first line.
///
/// ```no_run
/// # async fn demo() -> scriptci::errors::Result<()> {
/// use scriptci::exec::ProcessSupervisor;
///
/// let code = ProcessSupervisor::new("jobs/1/scripts/script-o.sh")?
///     .use_directory("jobs/1/runs/1")
///     .output_to("jobs/1/runs/1/script-o-out.log")
///     .run()
///     .await?;
/// # let _ = code;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ProcessSupervisor {
    script: PathBuf,
    directive: InterpreterDirective,
    working_dir: Option<PathBuf>,
    output: Option<PathBuf>,
    handle: Option<Handle>,
    drain_grace: Duration,
}

impl ProcessSupervisor {
    /// Read the interpreter directive from `script`.
    ///
    /// Fails with [`ScriptCiError::ConfigError`] when the file cannot be read
    /// or its first line is not a `#!` directive.
    pub fn new(script: impl AsRef<Path>) -> Result<Self> {
        let script = std::path::absolute(script.as_ref()).map_err(|e| {
            ScriptCiError::ConfigError(format!("resolving script path {:?}: {e}", script.as_ref()))
        })?;

        let file = std::fs::File::open(&script).map_err(|e| {
            ScriptCiError::ConfigError(format!("reading script {:?}: {e}", script))
        })?;
        let mut header = String::new();
        std::io::BufReader::new(file)
            .read_line(&mut header)
            .map_err(|e| ScriptCiError::ConfigError(format!("reading script {:?}: {e}", script)))?;
        if header.is_empty() {
            return Err(ScriptCiError::ConfigError(format!(
                "script {:?} is empty; expected an interpreter directive",
                script
            )));
        }
        let directive = InterpreterDirective::parse_line(header.trim_end_matches('\n'))?;

        Ok(Self {
            script,
            directive,
            working_dir: None,
            output: None,
            handle: None,
            drain_grace: DEFAULT_DRAIN_GRACE,
        })
    }

    /// Working directory of the process; created if missing.
    pub fn use_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Write merged stdout/stderr to this file instead of the process log.
    pub fn output_to(mut self, file: impl Into<PathBuf>) -> Self {
        self.output = Some(file.into());
        self
    }

    /// Runtime used for the drain tasks. Defaults to the current one.
    pub fn execute_with(mut self, handle: Handle) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn drain_grace(mut self, grace: Duration) -> Self {
        self.drain_grace = grace;
        self
    }

    /// Run on the configured runtime and hand back the join handle.
    pub fn spawn(self) -> JoinHandle<Result<i32>> {
        let handle = self.handle.clone().unwrap_or_else(Handle::current);
        handle.spawn(async move { self.run().await })
    }

    /// Run the script to completion and return its exit code.
    ///
    /// Only a log file that cannot be prepared is an error. Launch and wait
    /// failures are logged and reported as [`LAUNCH_FAILURE_EXIT_CODE`].
    pub async fn run(&self) -> Result<i32> {
        let handle = self.handle.clone().unwrap_or_else(Handle::current);
        let script = self.script.display().to_string();

        let sink = match &self.output {
            Some(path) => LogSink::create_file(path).await?,
            None => LogSink::tracing(script.clone()),
        };

        if let Some(dir) = &self.working_dir {
            if let Err(e) = tokio::fs::create_dir_all(dir).await {
                error!(
                    script = %script,
                    cwd = %dir.display(),
                    error = %e,
                    "cannot create working directory"
                );
                return Ok(LAUNCH_FAILURE_EXIT_CODE);
            }
        }

        let mut cmd = Command::new(&self.directive.program);
        cmd.args(self.directive.command_args(&self.script))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        info!(
            script = %script,
            interpreter = %self.directive.program,
            "starting script process"
        );

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                error!(
                    script = %script,
                    interpreter = %self.directive.program,
                    error = %e,
                    "failed to launch script"
                );
                return Ok(LAUNCH_FAILURE_EXIT_CODE);
            }
        };

        let (tx, rx) = mpsc::channel::<LogLine>(LINE_CHANNEL_CAPACITY);
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(handle.spawn(drain(stdout, StreamKind::Stdout, tx.clone())));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(handle.spawn(drain(stderr, StreamKind::Stderr, tx.clone())));
        }
        drop(tx);
        let mut sink_task = handle.spawn(sink.consume(rx));

        let code = match child.wait().await {
            Ok(status) => exit_code_of(status),
            Err(e) => {
                error!(script = %script, error = %e, "failed waiting for script process");
                LAUNCH_FAILURE_EXIT_CODE
            }
        };

        match tokio::time::timeout(self.drain_grace, &mut sink_task).await {
            Ok(Ok(lines)) => debug!(script = %script, lines, "script output drained"),
            Ok(Err(e)) => warn!(script = %script, error = %e, "log sink task failed"),
            Err(_) => {
                warn!(
                    script = %script,
                    grace_ms = self.drain_grace.as_millis() as u64,
                    "script output still draining after grace period; continuing without it"
                );
                for reader in &readers {
                    reader.abort();
                }
                sink_task.abort();
            }
        }

        info!(script = %script, exit_code = code, "script process exited");
        Ok(code)
    }
}

/// Exit code, or `128 + signal` for a signal-terminated process on Unix.
fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    LAUNCH_FAILURE_EXIT_CODE
}
