// src/supervise/mod.rs

//! External process supervision.
//!
//! A supervised run launches one executable, polls it at a fixed interval,
//! feeds its textual telemetry through a [`TelemetryParser`], enforces
//! runtime and idle bounds, and produces a single [`RunResult`].
//!
//! The decision logic lives in the pure [`core`] state machine; the tokio
//! shell that owns the child process, the console capture and the poll
//! timer is in [`runtime`].
//!
//! [`TelemetryParser`]: crate::telemetry::TelemetryParser

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::telemetry::TelemetryState;

pub mod core;
pub mod runtime;

pub use self::core::{CoreDecision, SupervisorCore, SupervisorEvent, TerminationReason};
pub use runtime::Supervisor;

/// Terminal state of a supervised run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    FailedExitCode,
    FailedTimeout,
    FailedParseIndicatedError,
    Aborted,
}

impl RunOutcome {
    pub fn is_success(self) -> bool {
        self == RunOutcome::Completed
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunOutcome::Completed => "completed",
            RunOutcome::FailedExitCode => "failed (exit code)",
            RunOutcome::FailedTimeout => "failed (timeout)",
            RunOutcome::FailedParseIndicatedError => "failed (error reported by tool)",
            RunOutcome::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// Where the supervisor reads telemetry from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetrySource {
    /// The child's own stdout and stderr.
    Console,
    /// A file the tool writes while it runs.
    File(PathBuf),
}

/// Bounds and I/O settings for one supervised run.
#[derive(Debug, Clone)]
pub struct SupervisionPolicy {
    pub poll_interval: Duration,
    /// Wall-clock bound measured from launch.
    pub max_runtime: Duration,
    /// Bound on time since the last telemetry that changed state.
    pub max_idle: Option<Duration>,
    /// How long to wait for the child to be reaped after a forced kill,
    /// and for console streams to close after exit.
    pub termination_grace: Duration,
    /// Console capture file, overwritten at launch.
    pub console_output: Option<PathBuf>,
    pub telemetry: TelemetrySource,
    /// Trust a completion marker over a non-zero exit code.
    pub trust_completion_marker: bool,
    pub delete_console_output_on_success: bool,
}

impl SupervisionPolicy {
    pub fn new(poll_interval: Duration, max_runtime: Duration) -> Self {
        Self {
            poll_interval,
            max_runtime,
            max_idle: None,
            termination_grace: Duration::from_secs(5),
            console_output: None,
            telemetry: TelemetrySource::Console,
            trust_completion_marker: true,
            delete_console_output_on_success: false,
        }
    }
}

/// Result of one supervised run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub outcome: RunOutcome,
    pub exit_code: Option<i32>,
    pub telemetry: TelemetryState,
    /// Retained console capture, if any.
    pub console_output: Option<PathBuf>,
    pub elapsed: Duration,
    /// Files the run created or overwrote in the working directory.
    pub touched_files: Vec<PathBuf>,
}

/// Caller side of an abort request.
#[derive(Debug, Clone)]
pub struct AbortHandle(Arc<watch::Sender<bool>>);

/// Supervisor side of an abort request.
#[derive(Debug, Clone)]
pub struct AbortSignal(watch::Receiver<bool>);

/// Create a connected abort handle and signal.
pub fn abort_pair() -> (AbortHandle, AbortSignal) {
    let (tx, rx) = watch::channel(false);
    (AbortHandle(Arc::new(tx)), AbortSignal(rx))
}

impl AbortHandle {
    pub fn abort(&self) {
        self.0.send_replace(true);
    }
}

impl AbortSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        AbortSignal(rx)
    }

    pub fn is_aborted(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once an abort has been requested. Pends forever if every
    /// handle is dropped without aborting.
    pub async fn aborted(&mut self) {
        loop {
            if *self.0.borrow_and_update() {
                return;
            }
            if self.0.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
