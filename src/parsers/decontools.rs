// src/parsers/decontools.rs

//! DeconTools log file grammar.
//!
//! DeconTools writes a `<dataset>_log.txt` while it runs, e.g.:
//!
//! ```text
//! 2/26/2014 10:15:33 AM  Started file processing at 2/26/2014 10:15:33 AM
//! 2/26/2014 10:16:02 AM  Scan/Frame= 1234; PercentComplete= 45.2; AccumlatedFeatures= 23456
//! 2/26/2014 10:30:00 AM  Finished file processing at 2/26/2014 10:30:00 AM
//! ```
//!
//! The log is authoritative: a "finished file processing" line is trusted
//! even when the console wrapper reports a non-zero exit code.

use regex::Regex;

use super::{builtin, capture_number};
use crate::telemetry::{PartialTelemetry, TelemetryParser};

#[derive(Debug, Clone)]
pub struct DeconToolsParser {
    scan: Regex,
    percent_complete: Regex,
    percent_finished: Regex,
    features: Regex,
    finished: Regex,
    error: Regex,
    version: Regex,
}

impl DeconToolsParser {
    pub fn new() -> Self {
        Self {
            scan: builtin(r"(?i)scan/frame\s*=\s*(\d+)"),
            percent_complete: builtin(r"(?i)percentcomplete\s*=\s*(\d+(?:\.\d+)?)"),
            percent_finished: builtin(r"(?i)(\d+(?:\.\d+)?)\s*%\s*(?:complete|finished)"),
            features: builtin(r"(?i)accum(?:u)?latedfeatures\s*=\s*(\d+)"),
            finished: builtin(r"(?i)finished file processing"),
            error: builtin(r"(?i)error thrown|an error has occurred"),
            version: builtin(r"(?i)decontools(?:\s+version|\s+v)\s*:?\s*(\d+(?:\.\d+)+)"),
        }
    }
}

impl Default for DeconToolsParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryParser for DeconToolsParser {
    fn name(&self) -> &str {
        "decontools"
    }

    fn parse(&self, line: &str) -> PartialTelemetry {
        let mut out = PartialTelemetry::default();

        if self.finished.is_match(line) {
            out = out.with_completion(line.trim());
        }
        if self.error.is_match(line) {
            out = out.with_error(line.trim());
        }

        if let Some(scan) = capture_number::<u64>(&self.scan, line, 1) {
            out = out.with_counter("scan", scan);
        }
        if let Some(features) = capture_number::<u64>(&self.features, line, 1) {
            out = out.with_counter("features", features);
        }

        let percent = capture_number::<f64>(&self.percent_complete, line, 1)
            .or_else(|| capture_number::<f64>(&self.percent_finished, line, 1));
        if let Some(percent) = percent {
            out = out.with_percent(percent);
        }

        if let Some(caps) = self.version.captures(line) {
            out = out.with_version(&caps[1]);
        }

        out
    }
}
