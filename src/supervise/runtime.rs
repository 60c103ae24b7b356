// src/supervise/runtime.rs

use std::path::PathBuf;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::errors::LaunchError;
use crate::exec::{self, ConsoleCapture, ProcessSpec};
use crate::fs::{FileSystem, RealFileSystem};
use crate::supervise::core::{CoreDecision, SupervisorCore, SupervisorEvent, TerminationReason};
use crate::supervise::{AbortSignal, RunOutcome, RunResult, SupervisionPolicy, TelemetrySource};
use crate::telemetry::{LogTail, TelemetryParser};

/// Async IO shell around [`SupervisorCore`].
///
/// Owns the child process, console capture and poll timer for the duration
/// of [`Supervisor::run`]; every decision is delegated to the core.
#[derive(Debug, Clone, Default)]
pub struct Supervisor<F: FileSystem = RealFileSystem> {
    fs: F,
}

impl Supervisor<RealFileSystem> {
    pub fn new() -> Self {
        Self { fs: RealFileSystem }
    }
}

/// Why the poll loop stopped.
enum LoopExit {
    Exited(Option<i32>),
    Terminate(TerminationReason),
}

impl<F: FileSystem> Supervisor<F> {
    /// Use a different filesystem for telemetry files (tests).
    pub fn with_fs(fs: F) -> Self {
        Self { fs }
    }

    /// Launch `spec` and supervise it until it exits or is terminated.
    ///
    /// Only launch problems are returned as `Err`; everything after the
    /// child is running is reported through [`RunResult::outcome`].
    pub async fn run(
        &self,
        spec: &ProcessSpec,
        policy: &SupervisionPolicy,
        parser: &dyn TelemetryParser,
        mut abort: AbortSignal,
    ) -> Result<RunResult, LaunchError> {
        if policy.poll_interval.is_zero() {
            return Err(LaunchError::ZeroPollInterval);
        }

        let mut core = SupervisorCore::new(policy);

        if abort.is_aborted() {
            info!(cmd = %spec.command_line(), "abort requested before launch; not starting");
            return Ok(RunResult {
                outcome: RunOutcome::Aborted,
                exit_code: None,
                telemetry: core.into_telemetry(),
                console_output: None,
                elapsed: Duration::ZERO,
                touched_files: Vec::new(),
            });
        }

        let exe = exec::preflight(spec)?;
        let sink = exec::console::open_sink(policy.console_output.as_deref()).await?;
        let mut child = exec::spawn(spec, &exe)?;
        let started = Instant::now();
        let pid = child.id();

        let mut console = ConsoleCapture::attach(
            child.stdout.take(),
            child.stderr.take(),
            sink,
            policy.console_output.clone(),
        );
        let mut tail = match &policy.telemetry {
            TelemetrySource::File(path) => Some(LogTail::new(path.clone())),
            TelemetrySource::Console => None,
        };

        let mut ticker = interval_at(started + policy.poll_interval, policy.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let exit = loop {
            tokio::select! {
                status = child.wait() => {
                    match status {
                        Ok(status) => break LoopExit::Exited(status.code()),
                        Err(e) => {
                            warn!(pid, error = %e, "waiting for child failed");
                            break LoopExit::Exited(None);
                        }
                    }
                }

                _ = ticker.tick() => {
                    let elapsed = started.elapsed();
                    let before = core.telemetry().progress();
                    self.poll_telemetry(&mut core, &mut console, tail.as_mut(), parser, elapsed);
                    let after = core.telemetry().progress();
                    if after != before {
                        info!(pid, tool = parser.name(), progress = after.unwrap_or(0.0), "progress");
                    }

                    if let CoreDecision::Terminate(reason) =
                        core.step(SupervisorEvent::Tick { elapsed })
                    {
                        warn!(pid, ?reason, elapsed_s = elapsed.as_secs(), "bound exceeded; terminating");
                        break LoopExit::Terminate(reason);
                    }
                }

                _ = abort.aborted() => {
                    info!(pid, "abort requested; terminating");
                    core.step(SupervisorEvent::AbortRequested);
                    break LoopExit::Terminate(TerminationReason::AbortRequested);
                }
            }
        };

        let (final_event, exit_code) = match exit {
            LoopExit::Exited(code) => {
                info!(pid, exit_code = code, "external process exited");
                (SupervisorEvent::Exited { code }, code)
            }
            LoopExit::Terminate(_) => {
                let t = exec::terminate(&mut child, policy.termination_grace).await;
                (SupervisorEvent::Terminated { reaped: t.reaped }, t.exit_code)
            }
        };

        // Telemetry written right before exit still counts.
        let elapsed = started.elapsed();
        let remaining = console.finish(policy.termination_grace).await;
        if matches!(policy.telemetry, TelemetrySource::Console) {
            ingest(&mut core, parser, remaining, elapsed);
        }
        if let Some(tail) = tail.as_mut() {
            match tail.read_remaining(&self.fs) {
                Ok(lines) => ingest(&mut core, parser, lines, elapsed),
                Err(e) => warn!(path = ?tail.path(), error = %e, "failed to read telemetry file"),
            }
        }

        let outcome = match core.step(final_event) {
            CoreDecision::Finish(outcome) => outcome,
            other => {
                warn!(?other, "core did not finish after process end; treating as aborted");
                RunOutcome::Aborted
            }
        };

        let console_output = self.settle_console_output(policy, outcome);
        let touched_files: Vec<PathBuf> = console_output.iter().cloned().collect();
        let telemetry = core.into_telemetry();

        info!(
            pid,
            tool = parser.name(),
            %outcome,
            exit_code,
            progress = telemetry.progress().unwrap_or(0.0),
            version = telemetry.version().unwrap_or(""),
            elapsed_s = started.elapsed().as_secs_f64(),
            "supervised run finished"
        );

        Ok(RunResult {
            outcome,
            exit_code,
            telemetry,
            console_output,
            elapsed: started.elapsed(),
            touched_files,
        })
    }

    fn poll_telemetry(
        &self,
        core: &mut SupervisorCore,
        console: &mut ConsoleCapture,
        tail: Option<&mut LogTail>,
        parser: &dyn TelemetryParser,
        elapsed: Duration,
    ) {
        // Always drain so the buffer doesn't grow when the console isn't
        // the telemetry source.
        let console_lines = console.drain();
        if tail.is_none() {
            ingest(core, parser, console_lines, elapsed);
        }

        if let Some(tail) = tail {
            match tail.read_new_lines(&self.fs) {
                Ok(lines) => ingest(core, parser, lines, elapsed),
                Err(e) => debug!(path = ?tail.path(), error = %e, "telemetry file not readable yet"),
            }
        }
    }

    /// Keep or delete the console capture; returns the retained path.
    fn settle_console_output(
        &self,
        policy: &SupervisionPolicy,
        outcome: RunOutcome,
    ) -> Option<PathBuf> {
        let path = policy.console_output.clone()?;
        if outcome.is_success() && policy.delete_console_output_on_success {
            match self.fs.remove_file(&path) {
                Ok(()) => {
                    debug!(path = ?path, "deleted console output after success");
                    return None;
                }
                Err(e) => warn!(path = ?path, error = %e, "failed to delete console output"),
            }
        }
        Some(path)
    }
}

fn ingest(
    core: &mut SupervisorCore,
    parser: &dyn TelemetryParser,
    lines: Vec<String>,
    at: Duration,
) {
    for line in lines {
        let partial = parser.parse(&line);
        if partial.is_empty() {
            continue;
        }
        if let Some(err) = &partial.error_marker {
            warn!(tool = parser.name(), line = %err, "tool reported an error");
        }
        if let Some(done) = &partial.completion_marker {
            debug!(tool = parser.name(), line = %done, "completion marker");
        }
        core.step(SupervisorEvent::Telemetry { partial, at });
    }
}
