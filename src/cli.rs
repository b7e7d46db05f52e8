// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every flag here is an override on top of the TOML config; the engine never
//! sees these arguments directly, only the merged [`ConfigFile`].
//!
//! [`ConfigFile`]: crate::config::ConfigFile

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `adwatch`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "adwatch",
    version,
    about = "Run an advert-detection tool exactly once over each finished recording.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// If omitted, `Adwatch.toml` in the current directory is used when it
    /// exists; otherwise built-in defaults apply.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Root folder to scan (can be provided multiple times).
    ///
    /// Replaces `[watch].roots` from the config file.
    #[arg(long = "input-root", value_name = "DIR")]
    pub input_roots: Vec<PathBuf>,

    /// Where the tool writes its outputs.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Path to the advert-detection executable.
    #[arg(long, value_name = "PATH")]
    pub tool: Option<PathBuf>,

    /// Filename glob pattern (default: `*.ts`).
    #[arg(long, value_name = "GLOB")]
    pub pattern: Option<String>,

    /// Seconds between size checks to detect active recordings.
    #[arg(long, value_name = "SECS")]
    pub size_check_seconds: Option<u64>,

    /// Do not delete the tool's `.txt`/`.edl`/`.log` side files.
    #[arg(long)]
    pub no_delete_extras: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ADWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load and validate config, print it, but don't take the lock or run
    /// anything.
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
