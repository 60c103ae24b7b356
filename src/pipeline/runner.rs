// src/pipeline/runner.rs

use std::collections::HashSet;
use std::fmt;

use tracing::{info, warn};

use crate::fs::FileSystem;
use crate::parsers;
use crate::pipeline::JobPlan;
use crate::supervise::{AbortSignal, RunResult, Supervisor};
use crate::version::VersionRecorder;

/// What happened to one job of a pipeline.
#[derive(Debug)]
pub enum JobStatus {
    /// The supervisor ran the job to a terminal outcome.
    Finished(RunResult),
    /// Not started because a dependency did not complete or an abort was
    /// requested.
    Skipped { reason: String },
    /// The process could not be started.
    LaunchFailed { error: String },
}

#[derive(Debug)]
pub struct JobReport {
    pub name: String,
    pub status: JobStatus,
}

impl JobReport {
    pub fn succeeded(&self) -> bool {
        matches!(&self.status, JobStatus::Finished(r) if r.outcome.is_success())
    }
}

impl fmt::Display for JobReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            JobStatus::Finished(r) => {
                write!(f, "{}: {}", self.name, r.outcome)?;
                if let Some(code) = r.exit_code {
                    write!(f, ", exit code {code}")?;
                }
                if let Some(p) = r.telemetry.progress() {
                    write!(f, ", {:.1}%", p * 100.0)?;
                }
                if let Some(v) = r.telemetry.version() {
                    write!(f, ", version {v}")?;
                }
                for (name, value) in r.telemetry.counters() {
                    write!(f, ", {name}={value}")?;
                }
                if let Some(err) = r.telemetry.error_marker() {
                    write!(f, ", first error: {err}")?;
                }
                write!(f, " ({:.1}s)", r.elapsed.as_secs_f64())
            }
            JobStatus::Skipped { reason } => write!(f, "{}: skipped ({reason})", self.name),
            JobStatus::LaunchFailed { error } => {
                write!(f, "{}: not started ({error})", self.name)
            }
        }
    }
}

/// Runs planned jobs one after another, in the order given.
///
/// A job whose `after` dependencies did not all complete is skipped, so a
/// failure in an early stage never feeds half-written output to a later one.
pub struct PipelineRunner<F: FileSystem> {
    supervisor: Supervisor<F>,
    recorder: Box<dyn VersionRecorder>,
}

impl<F: FileSystem> PipelineRunner<F> {
    pub fn new(supervisor: Supervisor<F>, recorder: Box<dyn VersionRecorder>) -> Self {
        Self {
            supervisor,
            recorder,
        }
    }

    pub async fn run(&self, plans: Vec<JobPlan>, abort: AbortSignal) -> Vec<JobReport> {
        let mut completed: HashSet<String> = HashSet::new();
        let mut reports = Vec::with_capacity(plans.len());

        for plan in plans {
            let status = self.run_job(&plan, &completed, abort.clone()).await;
            let report = JobReport {
                name: plan.name.clone(),
                status,
            };
            if report.succeeded() {
                completed.insert(plan.name.clone());
            }
            info!(job = %plan.name, "{report}");
            reports.push(report);
        }

        reports
    }

    async fn run_job(
        &self,
        plan: &JobPlan,
        completed: &HashSet<String>,
        abort: AbortSignal,
    ) -> JobStatus {
        if abort.is_aborted() {
            return JobStatus::Skipped {
                reason: "abort requested".to_string(),
            };
        }
        if let Some(dep) = plan.after.iter().find(|d| !completed.contains(*d)) {
            return JobStatus::Skipped {
                reason: format!("dependency '{dep}' did not complete"),
            };
        }

        let parser = match parsers::for_tool(plan.tool, &plan.markers) {
            Ok(p) => p,
            Err(e) => {
                return JobStatus::LaunchFailed {
                    error: e.to_string(),
                };
            }
        };

        info!(job = %plan.name, tool = parser.name(), cmd = %plan.spec.command_line(), "starting job");

        let mut result = match self
            .supervisor
            .run(&plan.spec, &plan.policy, parser.as_ref(), abort)
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(job = %plan.name, error = %e, "job could not be launched");
                return JobStatus::LaunchFailed {
                    error: e.to_string(),
                };
            }
        };

        if plan.record_version {
            if let Some(version) = result.telemetry.version() {
                match self
                    .recorder
                    .record(&plan.name, parser.name(), version, &plan.working_dir)
                {
                    Ok(Some(path)) => result.touched_files.push(path),
                    Ok(None) => {}
                    Err(e) => warn!(job = %plan.name, error = %e, "failed to record tool version"),
                }
            }
        }

        JobStatus::Finished(result)
    }
}
