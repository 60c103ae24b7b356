// src/telemetry/mod.rs

//! Best-effort telemetry extracted from a supervised tool's text output.
//!
//! - [`PartialTelemetry`] is what a parser extracts from a single line.
//! - [`TelemetryState`] accumulates partial results over one run, with
//!   monotonic progress and first-wins markers.
//! - [`TelemetryParser`] is the per-tool grammar seam; implementations live
//!   in [`crate::parsers`].
//! - [`LogTail`] reads newly appended lines from a tool-written log file.

pub mod state;
pub mod tail;

pub use state::TelemetryState;
pub use tail::LogTail;

/// Facts a parser recognised in one line of tool output.
///
/// Every field is optional; a line the parser doesn't understand yields
/// `PartialTelemetry::default()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialTelemetry {
    /// Fraction complete in `[0.0, 1.0]`.
    pub progress: Option<f64>,
    pub version: Option<String>,
    pub error_marker: Option<String>,
    pub completion_marker: Option<String>,
    /// Named monotone counters, e.g. `("scan", 1234)`.
    pub counters: Vec<(String, u64)>,
}

impl PartialTelemetry {
    pub fn is_empty(&self) -> bool {
        self.progress.is_none()
            && self.version.is_none()
            && self.error_marker.is_none()
            && self.completion_marker.is_none()
            && self.counters.is_empty()
    }

    /// Progress given as a percentage; out-of-range values are clamped.
    pub fn with_percent(mut self, percent: f64) -> Self {
        if percent.is_finite() {
            self.progress = Some((percent / 100.0).clamp(0.0, 1.0));
        }
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_error(mut self, line: impl Into<String>) -> Self {
        self.error_marker = Some(line.into());
        self
    }

    pub fn with_completion(mut self, line: impl Into<String>) -> Self {
        self.completion_marker = Some(line.into());
        self
    }

    pub fn with_counter(mut self, name: impl Into<String>, value: u64) -> Self {
        self.counters.push((name.into(), value));
        self
    }
}

/// Tool-specific grammar for one external executable.
///
/// `parse` receives a single line of output (without the line terminator)
/// and must never fail: unrecognised lines produce an empty result.
pub trait TelemetryParser: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn parse(&self, line: &str) -> PartialTelemetry;
}
