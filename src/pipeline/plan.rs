// src/pipeline/plan.rs

//! Turn a validated config into an ordered list of runnable jobs.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::{ConfigFile, ConfigSection, JobConfig, MarkerPatterns};
use crate::errors::{Result, ToolwatchError};
use crate::exec::ProcessSpec;
use crate::supervise::{SupervisionPolicy, TelemetrySource};
use crate::types::{parse_duration, TelemetryMode, ToolKind};

/// Everything needed to run one job.
#[derive(Debug, Clone)]
pub struct JobPlan {
    pub name: String,
    pub tool: ToolKind,
    pub markers: MarkerPatterns,
    pub spec: ProcessSpec,
    pub policy: SupervisionPolicy,
    pub working_dir: PathBuf,
    pub record_version: bool,
    pub after: Vec<String>,
}

/// Jobs in dependency order.
///
/// With `target`, only that job and its transitive `after` dependencies are
/// included.
pub fn plan_jobs(cfg: &ConfigFile, root: &Path, target: Option<&str>) -> Result<Vec<JobPlan>> {
    let selected = match target {
        Some(name) => dependency_closure(cfg, name)?,
        None => cfg.jobs().map(|(name, _)| name.clone()).collect(),
    };

    execution_order(cfg)?
        .into_iter()
        .filter(|name| selected.contains(name))
        .map(|name| {
            let job = cfg
                .job(&name)
                .ok_or_else(|| ToolwatchError::JobNotFound(name.clone()))?;
            resolve_job(&name, job, cfg.config(), root)
        })
        .collect()
}

/// Topological order of all jobs (dependencies first).
pub fn execution_order(cfg: &ConfigFile) -> Result<Vec<String>> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for (name, _) in cfg.jobs() {
        graph.add_node(name.as_str());
    }
    for (name, job) in cfg.jobs() {
        for dep in job.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    toposort(&graph, None)
        .map(|order| order.into_iter().map(str::to_string).collect())
        .map_err(|cycle| {
            ToolwatchError::DagCycle(format!(
                "cycle detected in job graph involving job '{}'",
                cycle.node_id()
            ))
        })
}

fn dependency_closure(cfg: &ConfigFile, target: &str) -> Result<BTreeSet<String>> {
    if cfg.job(target).is_none() {
        return Err(ToolwatchError::JobNotFound(target.to_string()));
    }

    let mut seen = BTreeSet::new();
    let mut stack = vec![target.to_string()];
    while let Some(name) = stack.pop() {
        if !seen.insert(name.clone()) {
            continue;
        }
        if let Some(job) = cfg.job(&name) {
            stack.extend(job.after.iter().cloned());
        }
    }
    Ok(seen)
}

fn resolve_job(name: &str, job: &JobConfig, defaults: &ConfigSection, root: &Path) -> Result<JobPlan> {
    let working_dir = match &job.working_dir {
        Some(dir) => root.join(dir),
        None => root.to_path_buf(),
    };

    let exe = resolve_against(root, &job.exe);
    let spec = match &job.jar {
        Some(jar) => ProcessSpec::java(
            exe,
            job.java_heap_mb,
            root.join(jar),
            job.args.iter().cloned(),
        ),
        None => ProcessSpec::new(exe).args(job.args.iter().cloned()),
    };
    let spec = job
        .env
        .iter()
        .fold(spec.working_dir(&working_dir), |spec, (k, v)| spec.env(k, v));

    let mut policy = SupervisionPolicy::new(
        duration(name, "poll_interval", job.effective_poll_interval(defaults))?,
        duration(name, "max_runtime", job.effective_max_runtime(defaults))?,
    );
    policy.max_idle = job
        .effective_max_idle(defaults)
        .map(|s| duration(name, "max_idle", s))
        .transpose()?;
    policy.termination_grace = duration(
        name,
        "termination_grace",
        job.effective_termination_grace(defaults),
    )?;
    policy.trust_completion_marker = job.effective_trust_completion_marker(defaults);
    policy.delete_console_output_on_success = job.delete_console_output_on_success;
    policy.console_output = job.console_output.as_ref().map(|p| working_dir.join(p));
    policy.telemetry = match (job.telemetry, &job.telemetry_file) {
        (TelemetryMode::File, Some(file)) => TelemetrySource::File(working_dir.join(file)),
        (TelemetryMode::File, None) => {
            return Err(ToolwatchError::ConfigError(format!(
                "job '{name}' uses telemetry = \"file\" but sets no `telemetry_file`"
            )));
        }
        (TelemetryMode::Console, _) => TelemetrySource::Console,
    };

    Ok(JobPlan {
        name: name.to_string(),
        tool: job.tool,
        markers: job.markers.clone(),
        spec,
        policy,
        working_dir,
        record_version: job.record_version,
        after: job.after.clone(),
    })
}

/// Bare names stay bare (looked up on `PATH` at launch); relative paths are
/// taken relative to the config directory.
fn resolve_against(root: &Path, exe: &str) -> PathBuf {
    let p = Path::new(exe);
    if p.is_absolute() || p.components().count() == 1 {
        p.to_path_buf()
    } else {
        root.join(p)
    }
}

fn duration(job: &str, key: &str, value: &str) -> Result<std::time::Duration> {
    parse_duration(value)
        .map_err(|e| ToolwatchError::ConfigError(format!("job '{job}' {key}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawConfigFile;
    use std::time::Duration;

    fn config() -> ConfigFile {
        let mut raw = RawConfigFile::default();

        let search = JobConfig::new("java");
        let mut refine = JobConfig::new("bin/msconvert");
        refine.after = vec!["search".to_string()];
        let mut charter = JobConfig::new("PPMErrorCharter");
        charter.after = vec!["refine".to_string()];
        let unrelated = JobConfig::new("true");

        raw.job.insert("charter".to_string(), charter);
        raw.job.insert("refine".to_string(), refine);
        raw.job.insert("search".to_string(), search);
        raw.job.insert("unrelated".to_string(), unrelated);
        ConfigFile::try_from(raw).unwrap()
    }

    #[test]
    fn orders_dependencies_first() {
        let plans = plan_jobs(&config(), Path::new("/jobs"), None).unwrap();
        let names: Vec<_> = plans.iter().map(|p| p.name.as_str()).collect();
        let pos = |n: &str| names.iter().position(|x| *x == n).unwrap();
        assert_eq!(names.len(), 4);
        assert!(pos("search") < pos("refine"));
        assert!(pos("refine") < pos("charter"));
    }

    #[test]
    fn target_pulls_in_only_its_dependencies() {
        let plans = plan_jobs(&config(), Path::new("/jobs"), Some("refine")).unwrap();
        let names: Vec<_> = plans.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["search", "refine"]);
    }

    #[test]
    fn unknown_target_is_an_error() {
        let err = plan_jobs(&config(), Path::new("/jobs"), Some("nope")).unwrap_err();
        assert!(matches!(err, ToolwatchError::JobNotFound(_)));
    }

    #[test]
    fn resolves_paths_and_policy() {
        let mut job = JobConfig::new("bin/DeconConsole");
        job.working_dir = Some("work".to_string());
        job.telemetry = TelemetryMode::File;
        job.telemetry_file = Some("Dataset_log.txt".to_string());
        job.console_output = Some("console.txt".to_string());
        job.max_idle = Some("10m".to_string());

        let plan = resolve_job("decon", &job, &ConfigSection::default(), Path::new("/jobs")).unwrap();

        assert_eq!(plan.spec.executable(), Path::new("/jobs/bin/DeconConsole"));
        assert_eq!(plan.spec.working_directory(), Some(Path::new("/jobs/work")));
        assert_eq!(
            plan.policy.telemetry,
            TelemetrySource::File(PathBuf::from("/jobs/work/Dataset_log.txt"))
        );
        assert_eq!(plan.policy.console_output, Some(PathBuf::from("/jobs/work/console.txt")));
        assert_eq!(plan.policy.poll_interval, Duration::from_secs(30));
        assert_eq!(plan.policy.max_idle, Some(Duration::from_secs(600)));
    }

    #[test]
    fn java_jobs_wrap_the_jar() {
        let mut job = JobConfig::new("java");
        job.jar = Some("MSAlign/MsAlignPipeline.jar".to_string());
        job.java_heap_mb = Some(4000);
        job.args = vec!["MSAlign_Params.txt".to_string()];

        let plan = resolve_job("msalign", &job, &ConfigSection::default(), Path::new("/jobs")).unwrap();
        assert_eq!(plan.spec.executable(), Path::new("java"));
        assert_eq!(
            plan.spec.arg_list(),
            [
                "-Xmx4000M",
                "-jar",
                "/jobs/MSAlign/MsAlignPipeline.jar",
                "MSAlign_Params.txt"
            ]
        );
    }
}
