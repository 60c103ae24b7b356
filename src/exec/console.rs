// src/exec/console.rs

//! Console capture for a supervised child.
//!
//! stdout and stderr are read line by line by two reader tasks. A single
//! writer task appends every line to the capture file (if any), logs it at
//! debug, and buffers it for the supervisor, which drains the buffer on
//! each poll.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{ChildStderr, ChildStdout};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::errors::LaunchError;

/// Create (or truncate) the console capture file.
///
/// Done before the child is spawned so that an unwritable path fails the
/// launch instead of leaving a running process behind.
pub async fn open_sink(path: Option<&Path>) -> Result<Option<File>, LaunchError> {
    let Some(path) = path else {
        return Ok(None);
    };
    let file = File::create(path)
        .await
        .map_err(|source| LaunchError::ConsoleCapture {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(Some(file))
}

/// Running capture of a child's stdout and stderr.
#[derive(Debug)]
pub struct ConsoleCapture {
    lines: mpsc::UnboundedReceiver<String>,
    writer: JoinHandle<()>,
}

impl ConsoleCapture {
    pub fn attach(
        stdout: Option<ChildStdout>,
        stderr: Option<ChildStderr>,
        sink: Option<File>,
        path: Option<PathBuf>,
    ) -> Self {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel::<String>();

        if let Some(stdout) = stdout {
            spawn_reader("stdout", stdout, raw_tx.clone());
        }
        if let Some(stderr) = stderr {
            spawn_reader("stderr", stderr, raw_tx.clone());
        }
        drop(raw_tx);

        // Lines are buffered here until the next poll drains them.
        let (out_tx, out_rx) = mpsc::unbounded_channel::<String>();
        let writer = tokio::spawn(write_lines(raw_rx, out_tx, sink, path));

        Self {
            lines: out_rx,
            writer,
        }
    }

    /// Lines received since the last drain.
    pub fn drain(&mut self) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(line) = self.lines.try_recv() {
            out.push(line);
        }
        out
    }

    /// Wait (at most `wait`) for both streams to close, then return every
    /// line not yet drained.
    ///
    /// Streams can stay open after the child exits if a grandchild inherited
    /// them; the bound keeps that from stalling the supervisor.
    pub async fn finish(mut self, wait: Duration) -> Vec<String> {
        if tokio::time::timeout(wait, &mut self.writer).await.is_err() {
            debug!("console streams still open after child exit; abandoning capture");
            self.writer.abort();
        }
        self.drain()
    }
}

fn spawn_reader<R>(stream: &'static str, reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(['\n', '\r']);
                    if tx.send(line.to_string()).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    debug!(stream, error = %e, "console stream read failed");
                    break;
                }
            }
        }
        debug!(stream, "console stream closed");
    });
}

async fn write_lines(
    mut raw_rx: mpsc::UnboundedReceiver<String>,
    out_tx: mpsc::UnboundedSender<String>,
    mut sink: Option<File>,
    path: Option<PathBuf>,
) {
    while let Some(line) = raw_rx.recv().await {
        debug!("console: {}", line);

        if let Some(file) = sink.as_mut() {
            let written = async {
                file.write_all(line.as_bytes()).await?;
                file.write_all(b"\n").await?;
                file.flush().await
            }
            .await;
            if let Err(e) = written {
                warn!(path = ?path, error = %e, "failed to write console output; capture disabled");
                sink = None;
            }
        }

        // Receiver gone means the supervisor stopped caring; keep capturing.
        let _ = out_tx.send(line);
    }
}
