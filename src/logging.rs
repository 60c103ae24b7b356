// src/logging.rs

//! Logging for `toolwatch`, on `tracing` + `tracing-subscriber`.
//!
//! The filter comes from the first of:
//! 1. `--log-level` (applies to every target)
//! 2. `TOOLWATCH_LOG`, in `EnvFilter` directive syntax, e.g. `debug` or
//!    `info,toolwatch::supervise=trace`
//! 3. `info`
//!
//! Output goes to stderr; stdout carries only the per-job summary.

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "TOOLWATCH_LOG";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let filter = build_filter(cli_level, env.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("initialising tracing subscriber: {e}"))?;

    Ok(())
}

fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::new(directive(level));
    }

    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|e| {
            eprintln!("ignoring invalid {LOG_ENV}={directives:?}: {e}");
            EnvFilter::new("info")
        }),
        None => EnvFilter::new("info"),
    }
}

fn directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    fn max(filter: EnvFilter) -> Option<LevelFilter> {
        filter.max_level_hint()
    }

    #[test]
    fn cli_level_wins_over_env() {
        assert_eq!(
            max(build_filter(Some(LogLevel::Warn), Some("trace"))),
            Some(LevelFilter::WARN)
        );
    }

    #[test]
    fn env_accepts_directives() {
        assert_eq!(max(build_filter(None, Some(" debug "))), Some(LevelFilter::DEBUG));
        assert_eq!(
            max(build_filter(None, Some("info,toolwatch::supervise=trace"))),
            Some(LevelFilter::TRACE)
        );
    }

    #[test]
    fn falls_back_to_info() {
        assert_eq!(max(build_filter(None, None)), Some(LevelFilter::INFO));
        assert_eq!(max(build_filter(None, Some(""))), Some(LevelFilter::INFO));
        assert_eq!(
            max(build_filter(None, Some("toolwatch=loud"))),
            Some(LevelFilter::INFO)
        );
    }
}
