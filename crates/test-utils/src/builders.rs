#![allow(dead_code)]

use toolwatch::config::{ConfigFile, ConfigSection, JobConfig, MarkerPatterns, RawConfigFile};
use toolwatch::types::{TelemetryMode, ToolKind};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_job(mut self, name: &str, job: JobConfig) -> Self {
        self.config.job.insert(name.to_string(), job);
        self
    }

    pub fn with_section(mut self, section: ConfigSection) -> Self {
        self.config.config = section;
        self
    }

    pub fn with_poll_interval(mut self, value: &str) -> Self {
        self.config.config.poll_interval = value.to_string();
        self
    }

    pub fn with_max_runtime(mut self, value: &str) -> Self {
        self.config.config.max_runtime = value.to_string();
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobConfig`.
pub struct JobConfigBuilder {
    job: JobConfig,
}

impl JobConfigBuilder {
    pub fn new(exe: &str) -> Self {
        Self {
            job: JobConfig::new(exe),
        }
    }

    /// `sh -c <script>`.
    pub fn shell(script: &str) -> Self {
        Self::new("sh").args(["-c", script])
    }

    pub fn args<'a>(mut self, args: impl IntoIterator<Item = &'a str>) -> Self {
        self.job.args.extend(args.into_iter().map(str::to_string));
        self
    }

    pub fn tool(mut self, tool: ToolKind) -> Self {
        self.job.tool = tool;
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.job.after.push(dep.to_string());
        self
    }

    pub fn telemetry_file(mut self, file: &str) -> Self {
        self.job.telemetry = TelemetryMode::File;
        self.job.telemetry_file = Some(file.to_string());
        self
    }

    pub fn console_output(mut self, file: &str) -> Self {
        self.job.console_output = Some(file.to_string());
        self
    }

    pub fn poll_interval(mut self, value: &str) -> Self {
        self.job.poll_interval = Some(value.to_string());
        self
    }

    pub fn max_runtime(mut self, value: &str) -> Self {
        self.job.max_runtime = Some(value.to_string());
        self
    }

    pub fn max_idle(mut self, value: &str) -> Self {
        self.job.max_idle = Some(value.to_string());
        self
    }

    pub fn trust_completion_marker(mut self, trust: bool) -> Self {
        self.job.trust_completion_marker = Some(trust);
        self
    }

    pub fn markers(mut self, markers: MarkerPatterns) -> Self {
        if !markers.is_empty() {
            self.job.tool = ToolKind::Pattern;
        }
        self.job.markers = markers;
        self
    }

    pub fn record_version(mut self, record: bool) -> Self {
        self.job.record_version = record;
        self
    }

    pub fn build(self) -> JobConfig {
        self.job
    }
}
