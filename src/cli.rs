// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `toolwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "toolwatch",
    version,
    about = "Run external analysis tools and supervise them through their console output and log files.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Toolwatch.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Toolwatch.toml")]
    pub config: String,

    /// Run only this job (plus the jobs it lists in `after`).
    #[arg(long, value_name = "NAME")]
    pub job: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TOOLWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the job plan, but don't launch anything.
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
