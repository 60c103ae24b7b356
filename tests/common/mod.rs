#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub use toolwatch_test_utils::scripted::{fast_policy, sh};
pub use toolwatch_test_utils::{init_tracing, with_timeout};

/// Write `Toolwatch.toml` into `dir` and return its path.
pub fn write_config(dir: &Path, toml: &str) -> PathBuf {
    let path = dir.join("Toolwatch.toml");
    fs::write(&path, toml).unwrap();
    path
}
