// src/supervise/core.rs

//! Pure supervisor state machine.
//!
//! [`SupervisorCore`] consumes [`SupervisorEvent`]s and answers with a
//! [`CoreDecision`]. It owns the run's [`TelemetryState`] and knows the
//! bounds, but has no Tokio types, no process handle and performs no IO, so
//! every outcome rule can be unit tested directly.

use std::time::Duration;

use crate::supervise::{RunOutcome, SupervisionPolicy};
use crate::telemetry::{PartialTelemetry, TelemetryState};

/// Input to the core, produced by the async shell.
#[derive(Debug, Clone)]
pub enum SupervisorEvent {
    /// One parsed line of telemetry, observed `at` (elapsed since launch).
    Telemetry { partial: PartialTelemetry, at: Duration },
    /// A poll interval elapsed.
    Tick { elapsed: Duration },
    /// The child exited on its own.
    Exited { code: Option<i32> },
    /// The caller asked for the run to stop.
    AbortRequested,
    /// A termination the core asked for has been carried out.
    Terminated { reaped: bool },
}

/// Why the core wants the child killed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    RuntimeExceeded,
    Idle,
    AbortRequested,
}

/// What the shell should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreDecision {
    Continue,
    Terminate(TerminationReason),
    Finish(RunOutcome),
}

#[derive(Debug, Clone)]
pub struct SupervisorCore {
    telemetry: TelemetryState,
    max_runtime: Duration,
    max_idle: Option<Duration>,
    trust_completion_marker: bool,
    termination: Option<TerminationReason>,
}

impl SupervisorCore {
    pub fn new(policy: &SupervisionPolicy) -> Self {
        Self {
            telemetry: TelemetryState::new(),
            max_runtime: policy.max_runtime,
            max_idle: policy.max_idle,
            trust_completion_marker: policy.trust_completion_marker,
            termination: None,
        }
    }

    pub fn telemetry(&self) -> &TelemetryState {
        &self.telemetry
    }

    pub fn into_telemetry(self) -> TelemetryState {
        self.telemetry
    }

    pub fn step(&mut self, event: SupervisorEvent) -> CoreDecision {
        match event {
            SupervisorEvent::Telemetry { partial, at } => {
                self.telemetry.merge(partial, at);
                CoreDecision::Continue
            }
            SupervisorEvent::Tick { elapsed } => self.check_bounds(elapsed),
            SupervisorEvent::AbortRequested => {
                self.termination = Some(TerminationReason::AbortRequested);
                CoreDecision::Terminate(TerminationReason::AbortRequested)
            }
            SupervisorEvent::Exited { code } => match self.termination {
                // Exited while we were killing it: the kill decides.
                Some(reason) => CoreDecision::Finish(termination_outcome(reason, true)),
                None => CoreDecision::Finish(self.exit_outcome(code)),
            },
            SupervisorEvent::Terminated { reaped } => match self.termination {
                Some(reason) => CoreDecision::Finish(termination_outcome(reason, reaped)),
                None => CoreDecision::Finish(RunOutcome::Aborted),
            },
        }
    }

    fn check_bounds(&mut self, elapsed: Duration) -> CoreDecision {
        if self.termination.is_some() {
            return CoreDecision::Continue;
        }

        if elapsed >= self.max_runtime {
            self.termination = Some(TerminationReason::RuntimeExceeded);
            return CoreDecision::Terminate(TerminationReason::RuntimeExceeded);
        }

        if let Some(max_idle) = self.max_idle {
            let since = self.telemetry.last_activity().unwrap_or(Duration::ZERO);
            if elapsed.saturating_sub(since) >= max_idle {
                self.termination = Some(TerminationReason::Idle);
                return CoreDecision::Terminate(TerminationReason::Idle);
            }
        }

        CoreDecision::Continue
    }

    /// Outcome for a child that exited on its own.
    ///
    /// An error marker latches failure unless a completion marker was parsed
    /// after it. Without error markers, exit code zero completes, and a
    /// completion marker overrides a non-zero code when trusted.
    fn exit_outcome(&self, code: Option<i32>) -> RunOutcome {
        let exit_ok = code == Some(0);
        let t = &self.telemetry;

        if t.error_seen() {
            if t.completion_after_last_error() && (exit_ok || self.trust_completion_marker) {
                RunOutcome::Completed
            } else {
                RunOutcome::FailedParseIndicatedError
            }
        } else if exit_ok || (t.completion_seen() && self.trust_completion_marker) {
            RunOutcome::Completed
        } else {
            RunOutcome::FailedExitCode
        }
    }
}

fn termination_outcome(reason: TerminationReason, reaped: bool) -> RunOutcome {
    match reason {
        TerminationReason::AbortRequested => RunOutcome::Aborted,
        TerminationReason::RuntimeExceeded | TerminationReason::Idle if reaped => {
            RunOutcome::FailedTimeout
        }
        TerminationReason::RuntimeExceeded | TerminationReason::Idle => RunOutcome::Aborted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core() -> SupervisorCore {
        SupervisorCore::new(&SupervisionPolicy::new(
            Duration::from_secs(30),
            Duration::from_secs(600),
        ))
    }

    fn line(core: &mut SupervisorCore, partial: PartialTelemetry) {
        core.step(SupervisorEvent::Telemetry {
            partial,
            at: Duration::from_secs(1),
        });
    }

    #[test]
    fn clean_exit_without_telemetry_completes() {
        let mut c = core();
        assert_eq!(
            c.step(SupervisorEvent::Exited { code: Some(0) }),
            CoreDecision::Finish(RunOutcome::Completed)
        );
        assert_eq!(c.telemetry().progress(), None);
    }

    #[test]
    fn killed_without_marker_fails_on_exit_code() {
        let mut c = core();
        assert_eq!(
            c.step(SupervisorEvent::Exited { code: Some(137) }),
            CoreDecision::Finish(RunOutcome::FailedExitCode)
        );
    }

    #[test]
    fn completion_after_error_overrides_exit_code() {
        let mut c = core();
        line(&mut c, PartialTelemetry::default().with_error("ERROR THROWN: x"));
        line(
            &mut c,
            PartialTelemetry::default().with_completion("finished file processing at 2024-01-01"),
        );
        assert_eq!(
            c.step(SupervisorEvent::Exited { code: Some(1) }),
            CoreDecision::Finish(RunOutcome::Completed)
        );
    }

    #[test]
    fn error_marker_fails_even_with_zero_exit() {
        let mut c = core();
        line(&mut c, PartialTelemetry::default().with_error("ERROR THROWN: x"));
        assert_eq!(
            c.step(SupervisorEvent::Exited { code: Some(0) }),
            CoreDecision::Finish(RunOutcome::FailedParseIndicatedError)
        );
    }

    #[test]
    fn error_after_completion_fails() {
        let mut c = core();
        line(&mut c, PartialTelemetry::default().with_completion("done"));
        line(&mut c, PartialTelemetry::default().with_error("error: late"));
        assert_eq!(
            c.step(SupervisorEvent::Exited { code: Some(0) }),
            CoreDecision::Finish(RunOutcome::FailedParseIndicatedError)
        );
    }

    #[test]
    fn untrusted_marker_does_not_override_exit_code() {
        let mut policy = SupervisionPolicy::new(Duration::from_secs(1), Duration::from_secs(60));
        policy.trust_completion_marker = false;
        let mut c = SupervisorCore::new(&policy);
        line(&mut c, PartialTelemetry::default().with_completion("done"));
        assert_eq!(
            c.step(SupervisorEvent::Exited { code: Some(2) }),
            CoreDecision::Finish(RunOutcome::FailedExitCode)
        );
    }

    #[test]
    fn runtime_bound_requests_termination_once() {
        let mut c = core();
        assert_eq!(
            c.step(SupervisorEvent::Tick {
                elapsed: Duration::from_secs(300)
            }),
            CoreDecision::Continue
        );
        assert_eq!(
            c.step(SupervisorEvent::Tick {
                elapsed: Duration::from_secs(630)
            }),
            CoreDecision::Terminate(TerminationReason::RuntimeExceeded)
        );
        assert_eq!(
            c.step(SupervisorEvent::Tick {
                elapsed: Duration::from_secs(660)
            }),
            CoreDecision::Continue
        );
        assert_eq!(
            c.step(SupervisorEvent::Terminated { reaped: true }),
            CoreDecision::Finish(RunOutcome::FailedTimeout)
        );
    }

    #[test]
    fn failed_kill_reports_aborted() {
        let mut c = core();
        c.step(SupervisorEvent::Tick {
            elapsed: Duration::from_secs(601),
        });
        assert_eq!(
            c.step(SupervisorEvent::Terminated { reaped: false }),
            CoreDecision::Finish(RunOutcome::Aborted)
        );
    }

    #[test]
    fn idle_bound_measures_from_last_activity() {
        let mut policy = SupervisionPolicy::new(Duration::from_secs(10), Duration::from_secs(3600));
        policy.max_idle = Some(Duration::from_secs(60));
        let mut c = SupervisorCore::new(&policy);

        c.step(SupervisorEvent::Telemetry {
            partial: PartialTelemetry::default().with_percent(10.0),
            at: Duration::from_secs(50),
        });
        assert_eq!(
            c.step(SupervisorEvent::Tick {
                elapsed: Duration::from_secs(100)
            }),
            CoreDecision::Continue
        );
        assert_eq!(
            c.step(SupervisorEvent::Tick {
                elapsed: Duration::from_secs(110)
            }),
            CoreDecision::Terminate(TerminationReason::Idle)
        );
    }

    #[test]
    fn abort_wins_over_exit_status() {
        let mut c = core();
        assert_eq!(
            c.step(SupervisorEvent::AbortRequested),
            CoreDecision::Terminate(TerminationReason::AbortRequested)
        );
        assert_eq!(
            c.step(SupervisorEvent::Exited { code: Some(0) }),
            CoreDecision::Finish(RunOutcome::Aborted)
        );
    }
}
