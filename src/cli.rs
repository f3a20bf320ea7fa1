// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `scriptci`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "scriptci",
    version,
    about = "Run chains of shell scripts, branching on exit codes, and record their progress.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML). A missing file means defaults.
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        default_value_os_t = default_config_path()
    )]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SCRIPTCI_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Store a job definition (JSON) under the given job id.
    Create {
        #[arg(long, value_name = "ID")]
        job: u32,

        /// JSON file shaped like `{"okScript": {"code": "#!/bin/sh\n..."}}`.
        #[arg(value_name = "DEFINITION")]
        definition: PathBuf,
    },

    /// Run a job's script chain and print the run summary.
    ///
    /// The process exits with the exit code of the last script that ran.
    Run {
        #[arg(long, value_name = "ID")]
        job: u32,

        #[arg(long, value_name = "RUN", default_value_t = 1)]
        run: u32,
    },

    /// Print the summary of a (possibly still running) job run.
    Status {
        #[arg(long, value_name = "ID")]
        job: u32,

        #[arg(long, value_name = "RUN", default_value_t = 1)]
        run: u32,
    },

    /// Print a job's script tree.
    Show {
        #[arg(long, value_name = "ID")]
        job: u32,
    },

    /// Run a single script file as the ad-hoc single job.
    Single {
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
