// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod parsers;
pub mod pipeline;
pub mod supervise;
pub mod telemetry;
pub mod types;
pub mod version;

use std::path::PathBuf;

use anyhow::{bail, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{config_root_dir, load_and_validate, ConfigFile};
use crate::fs::RealFileSystem;
use crate::pipeline::{plan_jobs, JobPlan, PipelineRunner};
use crate::supervise::{abort_pair, Supervisor, TelemetrySource};
use crate::version::FileVersionRecorder;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and job planning
/// - the supervisor and pipeline runner
/// - version recording
/// - Ctrl-C handling (aborts the running job)
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;
    let root = config_root_dir(&config_path);

    let plans = plan_jobs(&cfg, &root, args.job.as_deref())?;

    if args.dry_run {
        print_dry_run(&cfg, &plans);
        return Ok(());
    }

    let (abort_handle, abort_signal) = abort_pair();

    // Ctrl-C → abort the running job and skip the rest.
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        info!("Ctrl+C received; aborting");
        abort_handle.abort();
    });

    let runner = PipelineRunner::new(
        Supervisor::new(),
        Box::new(FileVersionRecorder::new(RealFileSystem)),
    );

    info!(jobs = plans.len(), "running jobs");
    let reports = runner.run(plans, abort_signal).await;

    for report in &reports {
        println!("{report}");
    }

    let failed = reports.iter().filter(|r| !r.succeeded()).count();
    if failed > 0 {
        bail!("{failed} of {} job(s) did not complete", reports.len());
    }
    Ok(())
}

/// Simple dry-run output: print the job plan without launching anything.
fn print_dry_run(cfg: &ConfigFile, plans: &[JobPlan]) {
    let c = cfg.config();
    println!("toolwatch dry-run");
    println!("  config.poll_interval = {}", c.poll_interval);
    println!("  config.max_runtime = {}", c.max_runtime);
    if let Some(ref idle) = c.max_idle {
        println!("  config.max_idle = {idle}");
    }
    println!("  config.trust_completion_marker = {}", c.trust_completion_marker);
    println!();

    println!("jobs ({}):", plans.len());
    for plan in plans {
        println!("  - {}", plan.name);
        println!("      tool: {:?}", plan.tool);
        println!("      cmd: {}", plan.spec.command_line());
        println!("      working_dir: {}", plan.working_dir.display());
        if !plan.after.is_empty() {
            println!("      after: {:?}", plan.after);
        }
        match &plan.policy.telemetry {
            TelemetrySource::Console => println!("      telemetry: console"),
            TelemetrySource::File(p) => println!("      telemetry: {}", p.display()),
        }
        if let Some(ref out) = plan.policy.console_output {
            println!("      console_output: {}", out.display());
        }
        println!(
            "      poll_interval: {:?}, max_runtime: {:?}",
            plan.policy.poll_interval, plan.policy.max_runtime
        );
        if let Some(idle) = plan.policy.max_idle {
            println!("      max_idle: {idle:?}");
        }
    }

    debug!("dry-run complete (no execution)");
}
