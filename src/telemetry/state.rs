// src/telemetry/state.rs

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use super::PartialTelemetry;

/// Telemetry accumulated over a single supervised run.
///
/// Owned by the supervisor while the run is active and frozen into the
/// [`crate::supervise::RunResult`] afterwards.
///
/// Invariants:
/// - `progress` and every counter only move forward.
/// - The first completion marker wins; later ones are no-ops.
/// - Merging telemetry that carries nothing new leaves the state unchanged.
///   An error line already merged once is not new, so re-reading a rewritten
///   log cannot move the error latch past a completion marker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryState {
    progress: Option<f64>,
    last_activity: Option<Duration>,
    version: Option<String>,
    completion_marker: Option<String>,
    error_marker: Option<String>,
    counters: BTreeMap<String, u64>,

    // Ordering of markers, so a completion marker can be compared against
    // the most recent error marker.
    marker_seq: u64,
    completion_seq: Option<u64>,
    last_error_seq: Option<u64>,
    seen_errors: BTreeSet<String>,
}

impl TelemetryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one line's worth of telemetry observed `at` (elapsed since
    /// launch). Returns `true` if anything changed.
    pub fn merge(&mut self, partial: PartialTelemetry, at: Duration) -> bool {
        let mut changed = false;

        if let Some(p) = partial.progress {
            if p.is_finite() {
                let p = p.clamp(0.0, 1.0);
                if self.progress.is_none_or(|prev| p > prev) {
                    self.progress = Some(p);
                    changed = true;
                }
            }
        }

        for (name, value) in partial.counters {
            let slot = self.counters.entry(name).or_insert(0);
            if value > *slot {
                *slot = value;
                changed = true;
            }
        }

        if let Some(version) = partial.version {
            if self.version.is_none() {
                self.version = Some(version);
                changed = true;
            }
        }

        if let Some(error) = partial.error_marker {
            if self.seen_errors.insert(error.clone()) {
                self.marker_seq += 1;
                self.last_error_seq = Some(self.marker_seq);
                if self.error_marker.is_none() {
                    self.error_marker = Some(error);
                }
                changed = true;
            }
        }

        if let Some(done) = partial.completion_marker {
            if self.completion_marker.is_none() {
                self.marker_seq += 1;
                self.completion_seq = Some(self.marker_seq);
                self.completion_marker = Some(done);
                changed = true;
            }
        }

        if changed {
            self.last_activity = Some(at);
        }
        changed
    }

    pub fn progress(&self) -> Option<f64> {
        self.progress
    }

    /// Elapsed time (since launch) of the last merge that changed state.
    pub fn last_activity(&self) -> Option<Duration> {
        self.last_activity
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn completion_marker(&self) -> Option<&str> {
        self.completion_marker.as_deref()
    }

    /// The first error line seen.
    pub fn error_marker(&self) -> Option<&str> {
        self.error_marker.as_deref()
    }

    pub fn counter(&self, name: &str) -> Option<u64> {
        self.counters.get(name).copied()
    }

    pub fn counters(&self) -> &BTreeMap<String, u64> {
        &self.counters
    }

    pub fn error_seen(&self) -> bool {
        self.last_error_seq.is_some()
    }

    pub fn completion_seen(&self) -> bool {
        self.completion_seq.is_some()
    }

    /// True when a completion marker was parsed after the most recent error
    /// marker (or no error marker was ever parsed).
    pub fn completion_after_last_error(&self) -> bool {
        match (self.completion_seq, self.last_error_seq) {
            (Some(done), Some(err)) => done > err,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}
