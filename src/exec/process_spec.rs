// src/exec/process_spec.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Immutable description of one external process to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    executable: PathBuf,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    env: BTreeMap<String, String>,
}

impl ProcessSpec {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            args: Vec::new(),
            working_dir: None,
            env: BTreeMap::new(),
        }
    }

    /// `<java> [-Xmx<heap>M] -jar <jar> <args...>`
    pub fn java(
        java: impl Into<PathBuf>,
        heap_mb: Option<u32>,
        jar: impl AsRef<Path>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let mut spec = Self::new(java);
        if let Some(mb) = heap_mb {
            spec = spec.arg(format!("-Xmx{mb}M"));
        }
        spec.arg("-jar")
            .arg(jar.as_ref().to_string_lossy())
            .args(args)
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn arg_list(&self) -> &[String] {
        &self.args
    }

    pub fn working_directory(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn env_overrides(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Human-readable command line, quoting arguments that contain spaces.
    pub fn command_line(&self) -> String {
        let mut parts = vec![quote(&self.executable.to_string_lossy())];
        parts.extend(self.args.iter().map(|a| quote(a)));
        parts.join(" ")
    }
}

fn quote(s: &str) -> String {
    if s.is_empty() || s.contains(char::is_whitespace) {
        format!("\"{s}\"")
    } else {
        s.to_string()
    }
}
