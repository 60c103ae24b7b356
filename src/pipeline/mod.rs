// src/pipeline/mod.rs

//! Multi-step jobs.
//!
//! A config can describe several tool invocations that depend on each other
//! (e.g. an MS-GF+ search, then an MSConvert mzRefiner pass over its
//! results, then a plotting step). [`plan`] orders them with `petgraph` and
//! resolves paths and bounds; [`runner`] executes them sequentially through
//! the supervisor.

pub mod plan;
pub mod runner;

pub use plan::{execution_order, plan_jobs, JobPlan};
pub use runner::{JobReport, JobStatus, PipelineRunner};
