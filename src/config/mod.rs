// src/config/mod.rs

//! Configuration loading and validation for toolwatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate durations, telemetry settings and the job graph (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{config_root_dir, load_and_validate, load_from_path};
pub use model::{ConfigFile, ConfigSection, JobConfig, MarkerPatterns, RawConfigFile};
pub use validate::validate_config;
