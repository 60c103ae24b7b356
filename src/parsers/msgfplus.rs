// src/parsers/msgfplus.rs

//! MS-GF+ console grammar.
//!
//! ```text
//! MS-GF+ Release (v2019.07.03) (3 July 2019)
//! Search progress: 3 / 4 tasks, 75.00%
//! MS-GF+ complete (total elapsed time: 123.45 sec)
//! ```

use regex::Regex;

use super::{builtin, capture_number};
use crate::telemetry::{PartialTelemetry, TelemetryParser};

#[derive(Debug, Clone)]
pub struct MsgfPlusParser {
    version: Regex,
    progress: Regex,
    complete: Regex,
    error: Regex,
}

impl MsgfPlusParser {
    pub fn new() -> Self {
        Self {
            version: builtin(r"MS-GF\+\s+(?:Release|Beta)\s*\((v[^)]+)\)"),
            progress: builtin(r"(?i)search progress:\s*(\d+)\s*/\s*\d+\s*tasks?,\s*(\d+(?:\.\d+)?)\s*%"),
            complete: builtin(r"(?i)^\s*ms-gf\+ complete"),
            error: builtin(r"(?i)^\s*\[error\]|^\s*error\b|exception in thread|^\s*java\.\S+exception"),
        }
    }
}

impl Default for MsgfPlusParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryParser for MsgfPlusParser {
    fn name(&self) -> &str {
        "msgfplus"
    }

    fn parse(&self, line: &str) -> PartialTelemetry {
        let mut out = PartialTelemetry::default();

        if let Some(caps) = self.version.captures(line) {
            out = out.with_version(&caps[1]);
        }
        if let Some(tasks) = capture_number::<u64>(&self.progress, line, 1) {
            out = out.with_counter("tasks", tasks);
        }
        if let Some(percent) = capture_number::<f64>(&self.progress, line, 2) {
            out = out.with_percent(percent);
        }
        if self.complete.is_match(line) {
            out = out.with_completion(line.trim());
        }
        if self.error.is_match(line) {
            out = out.with_error(line.trim());
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_release_banner() {
        let p = MsgfPlusParser::new();
        assert_eq!(
            p.parse("MS-GF+ Release (v2019.07.03) (3 July 2019)").version.as_deref(),
            Some("v2019.07.03")
        );
    }

    #[test]
    fn parses_search_progress() {
        let p = MsgfPlusParser::new();
        let t = p.parse("Search progress: 3 / 4 tasks, 75.00%");
        assert_eq!(t.progress, Some(0.75));
        assert_eq!(t.counters, vec![("tasks".to_string(), 3)]);
    }

    #[test]
    fn completion_and_errors() {
        let p = MsgfPlusParser::new();
        assert!(p
            .parse("MS-GF+ complete (total elapsed time: 123.45 sec)")
            .completion_marker
            .is_some());
        assert!(p.parse("[Error] Invalid parameter").error_marker.is_some());
        assert!(p.parse("Loading database files...").is_empty());
    }
}
