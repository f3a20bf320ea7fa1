// src/exec/sink.rs

//! Stream draining and the merged log sink.
//!
//! One reader task per child stream forwards complete lines over a bounded
//! channel; a single sink task owns the destination and writes each line as
//! it arrives. Readers never wait on each other, so a chatty stderr cannot
//! stall stdout (or the other way round).

use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::errors::{Result, ScriptCiError};

/// Lines buffered between the readers and the sink.
pub const LINE_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StreamKind::Stdout => "stdout",
            StreamKind::Stderr => "stderr",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogLine {
    pub stream: StreamKind,
    pub text: String,
}

/// Where merged script output goes.
#[derive(Debug)]
pub enum LogSink {
    /// Append to a log file, one line per entry.
    File { path: PathBuf, writer: BufWriter<File> },
    /// Emit through `tracing` under the `scriptci::script` target.
    Tracing { script: String },
}

impl LogSink {
    /// Start a fresh log file at `path`, discarding any previous content.
    pub async fn create_file(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ScriptCiError::Persistence(format!("creating log dir {:?}: {e}", parent))
            })?;
        }
        match tokio::fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ScriptCiError::Persistence(format!(
                    "removing stale log {:?}: {e}",
                    path
                )));
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| ScriptCiError::Persistence(format!("creating log {:?}: {e}", path)))?;

        Ok(LogSink::File {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn tracing(script: impl Into<String>) -> Self {
        LogSink::Tracing {
            script: script.into(),
        }
    }

    /// Consume lines until every reader has hung up. Returns the number of
    /// lines received.
    ///
    /// A failing file write is logged once and the remaining lines are
    /// discarded; the channel keeps being drained so the child never blocks.
    pub async fn consume(mut self, mut rx: mpsc::Receiver<LogLine>) -> usize {
        let mut count = 0usize;
        let mut broken = false;

        while let Some(line) = rx.recv().await {
            count += 1;
            match &mut self {
                LogSink::Tracing { script } => {
                    info!(
                        target: "scriptci::script",
                        script = %script,
                        stream = line.stream.as_str(),
                        "{}",
                        line.text
                    );
                }
                LogSink::File { path, writer } => {
                    if broken {
                        continue;
                    }
                    let res = async {
                        writer.write_all(line.text.as_bytes()).await?;
                        writer.write_all(b"\n").await?;
                        if rx.is_empty() {
                            writer.flush().await?;
                        }
                        Ok::<(), std::io::Error>(())
                    }
                    .await;
                    if let Err(e) = res {
                        warn!(log = %path.display(), error = %e, "failed to write script log; discarding further output");
                        broken = true;
                    }
                }
            }
        }

        if let LogSink::File { path, writer } = &mut self {
            if !broken {
                if let Err(e) = writer.flush().await {
                    warn!(log = %path.display(), error = %e, "failed to flush script log");
                }
            }
        }
        count
    }
}

/// Read `stream` line by line until EOF, forwarding each line to `tx`.
///
/// Invalid UTF-8 is replaced rather than ending the drain early.
pub async fn drain<R>(stream: R, kind: StreamKind, tx: mpsc::Sender<LogLine>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                    if buf.last() == Some(&b'\r') {
                        buf.pop();
                    }
                }
                let text = String::from_utf8_lossy(&buf).into_owned();
                // With the sink gone we still read on so the pipe never fills.
                let _ = tx.send(LogLine { stream: kind, text }).await;
            }
            Err(e) => {
                warn!(stream = kind.as_str(), error = %e, "error reading script output");
                break;
            }
        }
    }
}
