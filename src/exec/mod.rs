// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually starting external tools with
//! `tokio::process::Command` and for the low-level plumbing around them:
//!
//! - [`process_spec`] holds the immutable [`ProcessSpec`].
//! - [`launch`] resolves the executable and spawns the child.
//! - [`console`] captures stdout/stderr to a file and buffers lines for
//!   telemetry parsing.
//! - [`terminate`] kills a child and its process group.

pub mod console;
pub mod launch;
pub mod process_spec;
pub mod terminate;

pub use console::ConsoleCapture;
pub use launch::{preflight, resolve_executable, spawn};
pub use process_spec::ProcessSpec;
pub use terminate::{terminate, Termination};
