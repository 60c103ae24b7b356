// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolwatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Cycle detected in job graph: {0}")]
    DagCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// The only failures a supervised run surfaces as an `Err`.
///
/// Everything that happens after the child process is running is reported
/// through [`crate::supervise::RunOutcome`] instead.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("executable not found: {0}")]
    ExecutableNotFound(PathBuf),

    #[error("executable is not a runnable file: {0}")]
    NotExecutable(PathBuf),

    #[error("working directory does not exist: {0}")]
    WorkingDirMissing(PathBuf),

    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,

    #[error("failed to spawn {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create console output file {path}: {source}")]
    ConsoleCapture {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ToolwatchError>;
