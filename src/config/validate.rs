// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use regex::Regex;

use crate::config::model::{ConfigFile, JobConfig, RawConfigFile};
use crate::errors::{Result, ToolwatchError};
use crate::types::{parse_duration, TelemetryMode, ToolKind};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::ToolwatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.job))
    }
}

/// Run every semantic check on a raw config.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_jobs(cfg)?;
    validate_global_config(cfg)?;
    for (name, job) in cfg.job.iter() {
        validate_job(cfg, name, job)?;
    }
    validate_job_dependencies(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_jobs(cfg: &RawConfigFile) -> Result<()> {
    if cfg.job.is_empty() {
        return Err(ToolwatchError::ConfigError(
            "config must contain at least one [job.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    let c = &cfg.config;
    positive_duration("[config].poll_interval", &c.poll_interval)?;
    positive_duration("[config].max_runtime", &c.max_runtime)?;
    if let Some(idle) = &c.max_idle {
        positive_duration("[config].max_idle", idle)?;
    }
    duration("[config].termination_grace", &c.termination_grace)?;
    Ok(())
}

fn validate_job(cfg: &RawConfigFile, name: &str, job: &JobConfig) -> Result<()> {
    let defaults = &cfg.config;

    if job.exe.trim().is_empty() {
        return Err(ToolwatchError::ConfigError(format!(
            "job '{name}' has an empty `exe`"
        )));
    }

    positive_duration(
        &format!("job '{name}' poll_interval"),
        job.effective_poll_interval(defaults),
    )?;
    positive_duration(
        &format!("job '{name}' max_runtime"),
        job.effective_max_runtime(defaults),
    )?;
    if let Some(idle) = job.effective_max_idle(defaults) {
        positive_duration(&format!("job '{name}' max_idle"), idle)?;
    }
    duration(
        &format!("job '{name}' termination_grace"),
        job.effective_termination_grace(defaults),
    )?;

    if job.telemetry == TelemetryMode::File && job.telemetry_file.is_none() {
        return Err(ToolwatchError::ConfigError(format!(
            "job '{name}' uses telemetry = \"file\" but sets no `telemetry_file`"
        )));
    }

    if job.java_heap_mb.is_some() && job.jar.is_none() {
        return Err(ToolwatchError::ConfigError(format!(
            "job '{name}' sets `java_heap_mb` without a `jar`"
        )));
    }

    validate_markers(name, job)
}

fn validate_markers(name: &str, job: &JobConfig) -> Result<()> {
    if job.tool == ToolKind::Pattern && job.markers.is_empty() {
        return Err(ToolwatchError::ConfigError(format!(
            "job '{name}' uses tool = \"pattern\" but defines no [markers]"
        )));
    }

    let m = &job.markers;
    let patterns = [
        ("completion", &m.completion),
        ("error", &m.error),
        ("progress", &m.progress),
        ("version", &m.version),
    ];
    for (key, pattern) in patterns {
        if let Some(p) = pattern {
            Regex::new(p).map_err(|e| {
                ToolwatchError::ConfigError(format!(
                    "job '{name}' has an invalid markers.{key} regex: {e}"
                ))
            })?;
        }
    }
    Ok(())
}

fn validate_job_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, job) in cfg.job.iter() {
        for dep in job.after.iter() {
            if !cfg.job.contains_key(dep) {
                return Err(ToolwatchError::ConfigError(format!(
                    "job '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
            if dep == name {
                return Err(ToolwatchError::ConfigError(format!(
                    "job '{}' cannot depend on itself in `after`",
                    name
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: dep -> job
    // For:
    //   [job.refine]
    //   after = ["search"]
    // we add edge search -> refine.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.job.keys() {
        graph.add_node(name.as_str());
    }

    for (name, job) in cfg.job.iter() {
        for dep in job.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(ToolwatchError::DagCycle(format!(
                "cycle detected in job graph involving job '{}'",
                node
            )))
        }
    }
}

fn duration(what: &str, value: &str) -> Result<std::time::Duration> {
    parse_duration(value)
        .map_err(|e| ToolwatchError::ConfigError(format!("{what}: {e}")))
}

fn positive_duration(what: &str, value: &str) -> Result<std::time::Duration> {
    let d = duration(what, value)?;
    if d.is_zero() {
        return Err(ToolwatchError::ConfigError(format!(
            "{what} must be greater than zero"
        )));
    }
    Ok(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_with(job: JobConfig) -> RawConfigFile {
        let mut raw = RawConfigFile::default();
        raw.job.insert("a".to_string(), job);
        raw
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let mut raw = raw_with(JobConfig::new("sh"));
        raw.config.poll_interval = "0s".to_string();
        let err = ConfigFile::try_from(raw).unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn file_telemetry_needs_a_file() {
        let mut job = JobConfig::new("sh");
        job.telemetry = TelemetryMode::File;
        assert!(ConfigFile::try_from(raw_with(job)).is_err());
    }

    #[test]
    fn pattern_tool_needs_markers() {
        let mut job = JobConfig::new("sh");
        job.tool = ToolKind::Pattern;
        assert!(ConfigFile::try_from(raw_with(job.clone())).is_err());

        job.markers.completion = Some("done".to_string());
        assert!(ConfigFile::try_from(raw_with(job)).is_ok());
    }

    #[test]
    fn heap_without_jar_is_rejected() {
        let mut job = JobConfig::new("java");
        job.java_heap_mb = Some(2000);
        assert!(ConfigFile::try_from(raw_with(job)).is_err());
    }

    #[test]
    fn job_override_is_validated() {
        let mut job = JobConfig::new("sh");
        job.max_runtime = Some("forever".to_string());
        let err = ConfigFile::try_from(raw_with(job)).unwrap_err();
        assert!(err.to_string().contains("job 'a' max_runtime"));
    }
}
