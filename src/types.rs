use std::time::Duration;

use serde::Deserialize;

/// Where a job's telemetry comes from.
///
/// - `Console`: the process's own stdout/stderr stream (default).
/// - `File`: a log file the tool writes asynchronously, named by
///   `telemetry_file` in the job config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TelemetryMode {
    Console,
    File,
}

impl Default for TelemetryMode {
    fn default() -> Self {
        TelemetryMode::Console
    }
}

/// Which log grammar to apply to a job's telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    DeconTools,
    MsAlign,
    #[serde(alias = "mzrefiner")]
    MsConvert,
    #[serde(alias = "msgf+")]
    MsgfPlus,
    /// Regexes supplied in the job's `[markers]` table.
    Pattern,
    /// No telemetry parsing; exit code alone decides.
    None,
}

impl Default for ToolKind {
    fn default() -> Self {
        ToolKind::None
    }
}

/// Parse a simple duration string like `"30s"`, `"250ms"`, `"5m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };
    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration out of range: '{s}'"))
}
