// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::{TelemetryMode, ToolKind};

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// poll_interval = "30s"
/// max_runtime = "12h"
///
/// [job.decon]
/// tool = "decontools"
/// exe = "C:/DMS_Programs/DeconTools/DeconConsole.exe"
/// args = ["Dataset.raw", "DeconTools_Params.xml"]
/// telemetry = "file"
/// telemetry_file = "Dataset_log.txt"
/// ```
///
/// Relative `exe`, `jar` and `working_dir` paths are resolved against the
/// directory containing the config file; relative `telemetry_file` and
/// `console_output` paths against the job's working directory.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    /// Global defaults from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All jobs from `[job.<name>]`.
    #[serde(default)]
    pub job: BTreeMap<String, JobConfig>,
}

/// Validated configuration. Obtain one through `ConfigFile::try_from`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    job: BTreeMap<String, JobConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(config: ConfigSection, job: BTreeMap<String, JobConfig>) -> Self {
        Self { config, job }
    }

    pub fn config(&self) -> &ConfigSection {
        &self.config
    }

    pub fn jobs(&self) -> impl Iterator<Item = (&String, &JobConfig)> {
        self.job.iter()
    }

    pub fn job(&self, name: &str) -> Option<&JobConfig> {
        self.job.get(name)
    }

    pub fn job_count(&self) -> usize {
        self.job.len()
    }
}

/// `[config]` section: defaults every job inherits unless it overrides them.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    /// Wall-clock bound measured from launch.
    #[serde(default = "default_max_runtime")]
    pub max_runtime: String,

    /// Bound on time since the last telemetry that changed state.
    #[serde(default)]
    pub max_idle: Option<String>,

    /// How long to wait for the child after a forced kill.
    #[serde(default = "default_termination_grace")]
    pub termination_grace: String,

    /// Trust a completion marker over a non-zero exit code.
    #[serde(default = "default_true")]
    pub trust_completion_marker: bool,
}

fn default_poll_interval() -> String {
    "30s".to_string()
}

fn default_max_runtime() -> String {
    "12h".to_string()
}

fn default_termination_grace() -> String {
    "5s".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            max_runtime: default_max_runtime(),
            max_idle: None,
            termination_grace: default_termination_grace(),
            trust_completion_marker: default_true(),
        }
    }
}

/// `[job.<name>]` section: one external tool invocation.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    /// Log grammar used to interpret telemetry.
    #[serde(default)]
    pub tool: ToolKind,

    /// Executable: a path, or a bare name looked up on `PATH`. For Java
    /// tools this is the `java` binary.
    pub exe: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Jar to run with `-jar`; `args` follow the jar path.
    #[serde(default)]
    pub jar: Option<String>,

    /// Java heap size passed as `-Xmx<N>M`. Requires `jar`.
    #[serde(default)]
    pub java_heap_mb: Option<u32>,

    #[serde(default)]
    pub working_dir: Option<String>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(default)]
    pub telemetry: TelemetryMode,

    /// Log file the tool writes; required when `telemetry = "file"`.
    #[serde(default)]
    pub telemetry_file: Option<String>,

    /// Where to capture stdout/stderr. Not captured when unset.
    #[serde(default)]
    pub console_output: Option<String>,

    #[serde(default)]
    pub poll_interval: Option<String>,

    #[serde(default)]
    pub max_runtime: Option<String>,

    #[serde(default)]
    pub max_idle: Option<String>,

    #[serde(default)]
    pub termination_grace: Option<String>,

    #[serde(default)]
    pub trust_completion_marker: Option<bool>,

    #[serde(default)]
    pub delete_console_output_on_success: bool,

    /// Write `Tool_Version_Info_<job>.txt` once a version is parsed.
    #[serde(default = "default_true")]
    pub record_version: bool,

    /// Jobs that must complete before this one starts.
    #[serde(default)]
    pub after: Vec<String>,

    /// Regexes for `tool = "pattern"`.
    #[serde(default)]
    pub markers: MarkerPatterns,
}

impl JobConfig {
    /// A job with defaults for everything but the executable.
    pub fn new(exe: impl Into<String>) -> Self {
        Self {
            tool: ToolKind::default(),
            exe: exe.into(),
            args: Vec::new(),
            jar: None,
            java_heap_mb: None,
            working_dir: None,
            env: BTreeMap::new(),
            telemetry: TelemetryMode::default(),
            telemetry_file: None,
            console_output: None,
            poll_interval: None,
            max_runtime: None,
            max_idle: None,
            termination_grace: None,
            trust_completion_marker: None,
            delete_console_output_on_success: false,
            record_version: true,
            after: Vec::new(),
            markers: MarkerPatterns::default(),
        }
    }

    pub fn effective_poll_interval<'a>(&'a self, defaults: &'a ConfigSection) -> &'a str {
        self.poll_interval.as_deref().unwrap_or(&defaults.poll_interval)
    }

    pub fn effective_max_runtime<'a>(&'a self, defaults: &'a ConfigSection) -> &'a str {
        self.max_runtime.as_deref().unwrap_or(&defaults.max_runtime)
    }

    pub fn effective_max_idle<'a>(&'a self, defaults: &'a ConfigSection) -> Option<&'a str> {
        self.max_idle.as_deref().or(defaults.max_idle.as_deref())
    }

    pub fn effective_termination_grace<'a>(&'a self, defaults: &'a ConfigSection) -> &'a str {
        self.termination_grace
            .as_deref()
            .unwrap_or(&defaults.termination_grace)
    }

    pub fn effective_trust_completion_marker(&self, defaults: &ConfigSection) -> bool {
        self.trust_completion_marker
            .unwrap_or(defaults.trust_completion_marker)
    }
}

/// `[job.<name>.markers]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarkerPatterns {
    #[serde(default)]
    pub completion: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub progress: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl MarkerPatterns {
    pub fn is_empty(&self) -> bool {
        self.completion.is_none()
            && self.error.is_none()
            && self.progress.is_none()
            && self.version.is_none()
    }
}
