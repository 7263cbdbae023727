// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::ProcessSupport;

/// Command-line arguments for `spoolr`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "spoolr",
    version,
    about = "Bring up a vending machine's connections and supervise its system scripts.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Spoolr.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Spoolr.toml")]
    pub config: String,

    /// Override `[system].scripts_dir`.
    #[arg(long, value_name = "DIR")]
    pub scripts_dir: Option<PathBuf>,

    /// Override `[system].process_support` (auto, enabled, disabled).
    ///
    /// `disabled` lets the supervisor run on a development machine: every
    /// operation completes at once with empty output.
    #[arg(long, value_name = "MODE")]
    pub process_support: Option<ProcessSupport>,

    /// Establish connections, run startup operations, then exit once every
    /// launched task has reported back.
    #[arg(long)]
    pub once: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SPOOLR_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the connection plan, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
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
