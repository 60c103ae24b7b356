// src/parsers/msalign.rs

//! MSAlign console grammar.
//!
//! ```text
//! MS-Align+ 0.7.1.7143 2013-03-18
//! Processing spectrum Scan_2...  1% finished.
//! Processing spectrum Scan_3...  2% finished.
//! Exception in thread "main" java.lang.OutOfMemoryError: Java heap space
//! ```

use regex::Regex;

use super::{builtin, capture_number};
use crate::telemetry::{PartialTelemetry, TelemetryParser};

#[derive(Debug, Clone)]
pub struct MsAlignParser {
    version: Regex,
    percent: Regex,
    spectrum: Regex,
    error: Regex,
    finished: Regex,
}

impl MsAlignParser {
    pub fn new() -> Self {
        Self {
            version: builtin(r"^\s*(MS-Align\+?\s+\S+.*?)\s*$"),
            percent: builtin(r"(?i)(\d+(?:\.\d+)?)\s*%\s*finished"),
            spectrum: builtin(r"(?i)processing spectrum\s+scan_(\d+)"),
            error: builtin(r"(?i)^\s*(?:error\b|exception\b)|exception in thread|\berror:"),
            finished: builtin(r"(?i)^\s*(?:processing\s+)?(?:finished|completed)(?:\s+processing)?\.?\s*$"),
        }
    }
}

impl Default for MsAlignParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryParser for MsAlignParser {
    fn name(&self) -> &str {
        "msalign"
    }

    fn parse(&self, line: &str) -> PartialTelemetry {
        let mut out = PartialTelemetry::default();

        if let Some(caps) = self.version.captures(line) {
            return out.with_version(&caps[1]);
        }

        if self.error.is_match(line) {
            out = out.with_error(line.trim());
        }
        if self.finished.is_match(line) {
            out = out.with_completion(line.trim());
        }
        if let Some(percent) = capture_number::<f64>(&self.percent, line, 1) {
            out = out.with_percent(percent);
        }
        if let Some(scan) = capture_number::<u64>(&self.spectrum, line, 1) {
            out = out.with_counter("scan", scan);
        }

        out
    }
}
