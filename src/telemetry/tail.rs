// src/telemetry/tail.rs

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::fs::FileSystem;

/// Incremental reader for a log file that another process is appending to.
///
/// Only complete lines are returned by [`LogTail::read_new_lines`]; a
/// trailing partial line stays unread until the writer finishes it. If the
/// file shrinks (the tool rewrote it), reading restarts from the beginning.
#[derive(Debug, Clone)]
pub struct LogTail {
    path: PathBuf,
    offset: usize,
}

impl LogTail {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            offset: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines completed since the previous call. A missing file yields no
    /// lines.
    pub fn read_new_lines(&mut self, fs: &dyn FileSystem) -> Result<Vec<String>> {
        self.read(fs, false)
    }

    /// Like [`read_new_lines`](Self::read_new_lines) but also returns an
    /// unterminated last line. Used once the writer has exited.
    pub fn read_remaining(&mut self, fs: &dyn FileSystem) -> Result<Vec<String>> {
        self.read(fs, true)
    }

    fn read(&mut self, fs: &dyn FileSystem, include_partial: bool) -> Result<Vec<String>> {
        let Some(bytes) = fs.read_if_exists(&self.path)? else {
            return Ok(Vec::new());
        };

        if bytes.len() < self.offset {
            debug!(path = ?self.path, "telemetry file shrank; re-reading from start");
            self.offset = 0;
        }

        let fresh = &bytes[self.offset..];
        let end = if include_partial {
            fresh.len()
        } else {
            match fresh.iter().rposition(|b| *b == b'\n') {
                Some(idx) => idx + 1,
                None => return Ok(Vec::new()),
            }
        };

        let chunk = String::from_utf8_lossy(&fresh[..end]);
        self.offset += end;

        Ok(chunk
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect())
    }
}
