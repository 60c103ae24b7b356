// src/parsers/pattern.rs

//! Config-driven parser for tools without a built-in grammar.
//!
//! ```toml
//! [job.charter.markers]
//! completion = "^Plots saved"
//! error = "(?i)^error"
//! progress = "(\\d+)% done"
//! version = "PPMErrorCharter v(\\S+)"
//! ```
//!
//! `progress` must capture the percentage in group 1. `version` uses group 1
//! when present, otherwise the whole match.

use regex::Regex;

use super::capture_number;
use crate::config::MarkerPatterns;
use crate::telemetry::{PartialTelemetry, TelemetryParser};

#[derive(Debug, Clone)]
pub struct PatternParser {
    completion: Option<Regex>,
    error: Option<Regex>,
    progress: Option<Regex>,
    version: Option<Regex>,
}

impl PatternParser {
    pub fn from_markers(markers: &MarkerPatterns) -> Result<Self, regex::Error> {
        fn compile(pattern: &Option<String>) -> Result<Option<Regex>, regex::Error> {
            pattern.as_deref().map(Regex::new).transpose()
        }

        Ok(Self {
            completion: compile(&markers.completion)?,
            error: compile(&markers.error)?,
            progress: compile(&markers.progress)?,
            version: compile(&markers.version)?,
        })
    }
}

impl TelemetryParser for PatternParser {
    fn name(&self) -> &str {
        "pattern"
    }

    fn parse(&self, line: &str) -> PartialTelemetry {
        let mut out = PartialTelemetry::default();

        if self.completion.as_ref().is_some_and(|re| re.is_match(line)) {
            out = out.with_completion(line.trim());
        }
        if self.error.as_ref().is_some_and(|re| re.is_match(line)) {
            out = out.with_error(line.trim());
        }
        if let Some(percent) = self
            .progress
            .as_ref()
            .and_then(|re| capture_number::<f64>(re, line, 1))
        {
            out = out.with_percent(percent);
        }
        if let Some(caps) = self.version.as_ref().and_then(|re| re.captures(line)) {
            let m = caps.get(1).or_else(|| caps.get(0));
            if let Some(m) = m {
                out = out.with_version(m.as_str());
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn charter() -> PatternParser {
        PatternParser::from_markers(&MarkerPatterns {
            completion: Some("^Plots saved".to_string()),
            error: Some("(?i)^error".to_string()),
            progress: Some(r"(\d+)% done".to_string()),
            version: Some(r"PPMErrorCharter v(\S+)".to_string()),
        })
        .unwrap()
    }

    #[test]
    fn applies_configured_patterns() {
        let p = charter();
        assert_eq!(p.parse("40% done").progress, Some(0.4));
        assert_eq!(
            p.parse("PPMErrorCharter v1.2.6").version.as_deref(),
            Some("1.2.6")
        );
        assert!(p.parse("Plots saved to Dataset_MZRefinery_Histograms.png").completion_marker.is_some());
        assert!(p.parse("ERROR: no data").error_marker.is_some());
    }

    #[test]
    fn unset_patterns_match_nothing() {
        let p = PatternParser::from_markers(&MarkerPatterns::default()).unwrap();
        assert!(p.parse("ERROR: anything").is_empty());
    }

    #[test]
    fn version_without_group_uses_whole_match() {
        let p = PatternParser::from_markers(&MarkerPatterns {
            version: Some(r"v\d+\.\d+".to_string()),
            ..MarkerPatterns::default()
        })
        .unwrap();
        assert_eq!(p.parse("tool v3.1 starting").version.as_deref(), Some("v3.1"));
    }
}
