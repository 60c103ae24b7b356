// tests/pipeline_runner.rs
//
// Multi-job runs: dependency ordering, skipping after failures, version
// recording, and the top-level `run` entry point.

#![cfg(unix)]

mod common;

use std::fs;
use std::path::Path;

use common::{init_tracing, with_timeout, write_config};
use toolwatch::cli::CliArgs;
use toolwatch::config::MarkerPatterns;
use toolwatch::fs::RealFileSystem;
use toolwatch::pipeline::{plan_jobs, JobStatus, PipelineRunner};
use toolwatch::supervise::{abort_pair, AbortSignal, RunOutcome, Supervisor};
use toolwatch::version::{FileVersionRecorder, LogVersionRecorder};
use toolwatch_test_utils::builders::{ConfigFileBuilder, JobConfigBuilder};

fn runner() -> PipelineRunner<RealFileSystem> {
    PipelineRunner::new(Supervisor::new(), Box::new(LogVersionRecorder))
}

#[tokio::test]
async fn dependents_of_a_failed_job_are_skipped() {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_poll_interval("20ms")
        .with_job("search", JobConfigBuilder::shell("exit 1").build())
        .with_job(
            "refine",
            JobConfigBuilder::shell("exit 0").after("search").build(),
        )
        .with_job("unrelated", JobConfigBuilder::shell("exit 0").build())
        .build();

    let plans = plan_jobs(&cfg, Path::new("/tmp"), None).unwrap();
    let reports = with_timeout(runner().run(plans, AbortSignal::never())).await;

    let by_name = |name: &str| reports.iter().find(|r| r.name == name).unwrap();

    let search = by_name("search");
    assert!(!search.succeeded());
    assert!(matches!(
        &search.status,
        JobStatus::Finished(r) if r.outcome == RunOutcome::FailedExitCode
    ));

    let refine = by_name("refine");
    match &refine.status {
        JobStatus::Skipped { reason } => assert!(reason.contains("search")),
        other => panic!("expected refine to be skipped, got {other:?}"),
    }
    assert!(refine.to_string().contains("skipped"));

    assert!(by_name("unrelated").succeeded());
}

#[tokio::test]
async fn chain_runs_in_dependency_order() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let trace = dir.path().join("order.txt");
    let append = |name: &str| format!("echo {name} >> {}", trace.display());

    let cfg = ConfigFileBuilder::new()
        .with_poll_interval("20ms")
        .with_job(
            "charter",
            JobConfigBuilder::shell(&append("charter")).after("refine").build(),
        )
        .with_job(
            "refine",
            JobConfigBuilder::shell(&append("refine")).after("search").build(),
        )
        .with_job("search", JobConfigBuilder::shell(&append("search")).build())
        .build();

    let plans = plan_jobs(&cfg, dir.path(), None).unwrap();
    let reports = with_timeout(runner().run(plans, AbortSignal::never())).await;

    assert!(reports.iter().all(|r| r.succeeded()));
    let order = fs::read_to_string(&trace).unwrap();
    assert_eq!(order.lines().collect::<Vec<_>>(), ["search", "refine", "charter"]);
}

#[tokio::test]
async fn missing_executable_reports_launch_failure_and_skips_dependents() {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_poll_interval("20ms")
        .with_job(
            "decon",
            JobConfigBuilder::new("/definitely/not/here/DeconConsole").build(),
        )
        .with_job("plot", JobConfigBuilder::shell("exit 0").after("decon").build())
        .build();

    let plans = plan_jobs(&cfg, Path::new("/tmp"), None).unwrap();
    let reports = with_timeout(runner().run(plans, AbortSignal::never())).await;

    match &reports[0].status {
        JobStatus::LaunchFailed { error } => assert!(error.contains("not found")),
        other => panic!("expected launch failure, got {other:?}"),
    }
    assert!(matches!(reports[1].status, JobStatus::Skipped { .. }));
}

#[tokio::test]
async fn abort_skips_jobs_that_have_not_started() {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_poll_interval("20ms")
        .with_job("a", JobConfigBuilder::shell("exit 0").build())
        .with_job("b", JobConfigBuilder::shell("exit 0").build())
        .build();

    let (handle, signal) = abort_pair();
    handle.abort();

    let plans = plan_jobs(&cfg, Path::new("/tmp"), None).unwrap();
    let reports = with_timeout(runner().run(plans, signal)).await;

    assert_eq!(reports.len(), 2);
    for report in &reports {
        match &report.status {
            JobStatus::Skipped { reason } => assert!(reason.contains("abort")),
            other => panic!("expected skip, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn parsed_version_is_recorded_next_to_results() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let markers = MarkerPatterns {
        completion: Some("^Plots saved".to_string()),
        version: Some(r"PPMErrorCharter v(\S+)".to_string()),
        ..MarkerPatterns::default()
    };

    let cfg = ConfigFileBuilder::new()
        .with_poll_interval("20ms")
        .with_job(
            "charter",
            JobConfigBuilder::shell("echo 'PPMErrorCharter v1.2.6'; echo 'Plots saved'")
                .markers(markers)
                .build(),
        )
        .build();

    let plans = plan_jobs(&cfg, dir.path(), None).unwrap();
    let runner = PipelineRunner::new(
        Supervisor::new(),
        Box::new(FileVersionRecorder::new(RealFileSystem)),
    );
    let reports = with_timeout(runner.run(plans, AbortSignal::never())).await;

    let JobStatus::Finished(result) = &reports[0].status else {
        panic!("expected charter to run, got {:?}", reports[0].status);
    };
    assert_eq!(result.outcome, RunOutcome::Completed);
    assert_eq!(result.telemetry.version(), Some("1.2.6"));

    let info = dir.path().join("Tool_Version_Info_charter.txt");
    assert!(result.touched_files.contains(&info));
    assert!(fs::read_to_string(&info).unwrap().contains("version: 1.2.6"));
}

#[tokio::test]
async fn run_entry_point_fails_when_a_job_fails() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        r#"
[config]
poll_interval = "20ms"

[job.ok]
exe = "sh"
args = ["-c", "exit 0"]

[job.bad]
exe = "sh"
args = ["-c", "exit 4"]
"#,
    );

    let args = CliArgs {
        config: config.display().to_string(),
        job: None,
        log_level: None,
        dry_run: false,
    };
    let err = with_timeout(toolwatch::run(args)).await.unwrap_err();
    assert!(err.to_string().contains("1 of 2"));

    let args = CliArgs {
        config: config.display().to_string(),
        job: Some("ok".to_string()),
        log_level: None,
        dry_run: false,
    };
    with_timeout(toolwatch::run(args)).await.unwrap();
}

#[tokio::test]
async fn dry_run_launches_nothing() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("started");
    let config = write_config(
        dir.path(),
        &format!(
            r#"
[job.touch]
exe = "sh"
args = ["-c", "touch {}"]
"#,
            marker.display()
        ),
    );

    let args = CliArgs {
        config: config.display().to_string(),
        job: None,
        log_level: None,
        dry_run: true,
    };
    toolwatch::run(args).await.unwrap();
    assert!(!marker.exists());
}
