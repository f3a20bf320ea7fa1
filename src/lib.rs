// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod job;
pub mod logging;
pub mod status;
pub mod tree;

use std::path::Path;

use anyhow::{Context, Result};
use tokio::runtime::Handle;
use tracing::debug;

use crate::cli::{CliArgs, Command};
use crate::config::{load_or_default, ConfigFile};
use crate::engine::ChainExecutor;
use crate::exec::SupervisorBackend;
use crate::fs::RealFileSystem;
use crate::job::{Job, JobDefinition, SingleJob};
use crate::status::{FsStatusStore, SystemClock};

/// High-level entry point used by `main.rs`.
///
/// Returns the process exit code: the chain's exit code for `run` and
/// `single`, 0 for everything else.
pub async fn run(args: CliArgs) -> Result<i32> {
    let cfg = load_or_default(&args.config)?;
    debug!(?cfg, "configuration loaded");

    let fs = RealFileSystem;
    let handle = Handle::current();

    match args.command {
        Command::Create { job, definition } => {
            let text = std::fs::read_to_string(&definition)
                .with_context(|| format!("reading job definition {:?}", definition))?;
            let definition: JobDefinition = serde_json::from_str(&text)
                .with_context(|| format!("parsing job definition {:?}", definition))?;
            let job = Job::write_to(&fs, &definition, cfg.jobs.job_dir(job))?;
            print_json(&serde_json::json!({ "id": job.id() }))?;
            Ok(0)
        }
        Command::Run { job, run } => {
            let job = Job::open(&fs, cfg.jobs.job_dir(job))?;
            let executor = executor(&cfg);
            let code = job.run(&fs, &executor, run, &handle).await?;
            print_json(&job.summary(&executor, run)?)?;
            Ok(code)
        }
        Command::Status { job, run } => {
            let job = Job::open(&fs, cfg.jobs.job_dir(job))?;
            print_json(&job.summary(&executor(&cfg), run)?)?;
            Ok(0)
        }
        Command::Show { job } => {
            let job = Job::open(&fs, cfg.jobs.job_dir(job))?;
            print_json(&job.definition())?;
            Ok(0)
        }
        Command::Single { script } => run_single(&cfg, &fs, &script, &handle).await,
    }
}

fn executor(
    cfg: &ConfigFile,
) -> ChainExecutor<SupervisorBackend, FsStatusStore<RealFileSystem>> {
    ChainExecutor::new(
        SupervisorBackend::new(cfg.runner.drain_grace()),
        FsStatusStore::new(RealFileSystem),
    )
}

async fn run_single(
    cfg: &ConfigFile,
    fs: &RealFileSystem,
    script: &Path,
    handle: &Handle,
) -> Result<i32> {
    let code = std::fs::read_to_string(script)
        .with_context(|| format!("reading script {:?}", script))?;
    let single = SingleJob::new(&cfg.jobs.root);
    let exit_code = single
        .run(fs, &SystemClock, &code, handle, cfg.runner.drain_grace())
        .await?;
    if let Some(report) = single.report(fs)? {
        print_json(&report)?;
    }
    Ok(exit_code)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
