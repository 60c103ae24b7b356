// src/version.rs

//! Sinks for tool version strings parsed during a run.
//!
//! The supervisor only exposes the parsed version in its telemetry; the
//! pipeline runner notifies a [`VersionRecorder`] once per run when one was
//! found.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use crate::fs::FileSystem;

pub trait VersionRecorder: Send + Sync {
    /// Record `version` for `job`. Returns the file written, if any.
    fn record(&self, job: &str, tool: &str, version: &str, working_dir: &Path)
        -> Result<Option<PathBuf>>;
}

/// Only logs the version.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogVersionRecorder;

impl VersionRecorder for LogVersionRecorder {
    fn record(
        &self,
        job: &str,
        tool: &str,
        version: &str,
        _working_dir: &Path,
    ) -> Result<Option<PathBuf>> {
        info!(job, tool, version, "tool version");
        Ok(None)
    }
}

/// Writes `Tool_Version_Info_<job>.txt` into the job's working directory,
/// for the packaging step to pick up alongside the tool's results.
#[derive(Debug, Default, Clone)]
pub struct FileVersionRecorder<F: FileSystem> {
    fs: F,
}

impl<F: FileSystem> FileVersionRecorder<F> {
    pub fn new(fs: F) -> Self {
        Self { fs }
    }

    pub fn file_name(job: &str) -> String {
        format!("Tool_Version_Info_{job}.txt")
    }
}

impl<F: FileSystem> VersionRecorder for FileVersionRecorder<F> {
    fn record(
        &self,
        job: &str,
        tool: &str,
        version: &str,
        working_dir: &Path,
    ) -> Result<Option<PathBuf>> {
        let path = working_dir.join(Self::file_name(job));
        let contents = format!("job: {job}\ntool: {tool}\nversion: {version}\n");
        self.fs.write(&path, contents.as_bytes())?;
        info!(job, tool, version, path = ?path, "recorded tool version");
        Ok(Some(path))
    }
}
