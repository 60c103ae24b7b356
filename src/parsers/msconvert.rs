// src/parsers/msconvert.rs

//! MSConvert console grammar, used both for plain conversions and for
//! mzRefiner passes.
//!
//! ```text
//! format: mzML (Precision_64 [ 1000514:Precision_64 1000515:Precision_32 ], ...)
//! ProteoWizard release: 3.0.6002 (2014-1-14)
//! processing file: Dataset.raw
//! writing spectra: 1200/3456
//! mzRefiner: Low number of good identifications found. Will not perform dependent shifts.
//! Error processing file Dataset.raw
//! ```

use regex::Regex;

use super::builtin;
use crate::telemetry::{PartialTelemetry, TelemetryParser};

/// Counter set to 1 when mzRefiner declines to shift masses for lack of
/// identifications.
pub const LOW_IDENTIFICATIONS_COUNTER: &str = "low_identifications";

#[derive(Debug, Clone)]
pub struct MsConvertParser {
    version: Regex,
    spectra: Regex,
    error: Regex,
    low_ids: Regex,
}

impl MsConvertParser {
    pub fn new() -> Self {
        Self {
            version: builtin(
                r"(?i)(?:proteowizard release:?|msconvert.*?version:?)\s*(\d+(?:\.\d+)+)",
            ),
            spectra: builtin(r"(?i)(?:writing|processing)\s+spectr(?:a|um):?\s*(\d+)\s*/\s*(\d+)"),
            error: builtin(r"(?i)^\s*error\b|\berror:"),
            low_ids: builtin(r"(?i)low number of good identifications"),
        }
    }
}

impl Default for MsConvertParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryParser for MsConvertParser {
    fn name(&self) -> &str {
        "msconvert"
    }

    fn parse(&self, line: &str) -> PartialTelemetry {
        let mut out = PartialTelemetry::default();

        if let Some(caps) = self.version.captures(line) {
            out = out.with_version(&caps[1]);
        }

        if let Some(caps) = self.spectra.captures(line) {
            let done = caps[1].parse::<u64>().ok();
            let total = caps[2].parse::<u64>().ok();
            if let (Some(done), Some(total)) = (done, total) {
                out = out.with_counter("spectra", done);
                if total > 0 {
                    out = out.with_percent(done as f64 * 100.0 / total as f64);
                }
            }
        }

        if self.low_ids.is_match(line) {
            out = out.with_counter(LOW_IDENTIFICATIONS_COUNTER, 1);
        } else if self.error.is_match(line) {
            out = out.with_error(line.trim());
        }

        out
    }
}
