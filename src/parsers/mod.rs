// src/parsers/mod.rs

//! Built-in [`TelemetryParser`] implementations, one per external tool.
//!
//! - [`decontools`]: the log file DeconTools writes next to its output.
//! - [`msalign`]: MSAlign (Java) console output.
//! - [`msconvert`]: MSConvert console output, including the mzRefiner filter.
//! - [`msgfplus`]: MS-GF+ console output.
//! - [`pattern`]: regexes supplied by the job config, for anything else.
//!
//! [`for_tool`] picks the parser for a job's `tool` setting.

pub mod decontools;
pub mod msalign;
pub mod msconvert;
pub mod msgfplus;
pub mod pattern;

use regex::Regex;

use crate::config::MarkerPatterns;
use crate::errors::{Result, ToolwatchError};
use crate::telemetry::{PartialTelemetry, TelemetryParser};
use crate::types::ToolKind;

pub use decontools::DeconToolsParser;
pub use msalign::MsAlignParser;
pub use msconvert::MsConvertParser;
pub use msgfplus::MsgfPlusParser;
pub use pattern::PatternParser;

/// Parser that recognises nothing; the exit code alone decides the outcome.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullParser;

impl TelemetryParser for NullParser {
    fn name(&self) -> &str {
        "none"
    }

    fn parse(&self, _line: &str) -> PartialTelemetry {
        PartialTelemetry::default()
    }
}

/// Build the parser for a job.
///
/// `markers` is only consulted for [`ToolKind::Pattern`].
pub fn for_tool(kind: ToolKind, markers: &MarkerPatterns) -> Result<Box<dyn TelemetryParser>> {
    let parser: Box<dyn TelemetryParser> = match kind {
        ToolKind::DeconTools => Box::new(DeconToolsParser::new()),
        ToolKind::MsAlign => Box::new(MsAlignParser::new()),
        ToolKind::MsConvert => Box::new(MsConvertParser::new()),
        ToolKind::MsgfPlus => Box::new(MsgfPlusParser::new()),
        ToolKind::Pattern => Box::new(
            PatternParser::from_markers(markers)
                .map_err(|e| ToolwatchError::ConfigError(e.to_string()))?,
        ),
        ToolKind::None => Box::new(NullParser),
    };
    Ok(parser)
}

/// Compile a built-in pattern. Only used for literals in this module tree.
fn builtin(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("built-in regex {pattern:?} must compile: {e}"))
}

/// First capture group of `re` in `line`, parsed as a number.
fn capture_number<T: std::str::FromStr>(re: &Regex, line: &str, group: usize) -> Option<T> {
    re.captures(line)?
        .get(group)?
        .as_str()
        .trim()
        .parse()
        .ok()
}
