//! Build machine settings.
//!
//! Settings are read-only for the steps. They are usually loaded from a JSON
//! file produced by the machine's provisioning.

use crate::errors::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings shared by all steps of a build machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildMachineSettings {
    /// Absolute path of the working copy that is synchronized.
    pub abs_code_path: PathBuf,
    /// Absolute path of the build workspace the toolchain runs in.
    pub abs_workspace_path: PathBuf,
    /// Build profile identifier, selects the build strategy.
    pub configuration: String,
    /// Configuration name passed to the toolchain (e.g. `Debug`, `Release`).
    #[serde(default = "default_build_type")]
    pub build_type: String,
    /// Target platform passed to toolchains that need one.
    #[serde(default = "default_platform")]
    pub platform: String,
    /// Parallelism passed to the toolchain when building a single target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
    /// Version-control client settings.
    #[serde(default)]
    pub vcs: VcsSettings,
    /// Kill external processes that run longer than this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_timeout_seconds: Option<f64>,
}

fn default_build_type() -> String {
    "Release".to_string()
}

fn default_platform() -> String {
    "x64".to_string()
}

impl BuildMachineSettings {
    /// Creates settings with defaults for everything but the required fields.
    #[must_use]
    pub fn new(
        abs_code_path: impl Into<PathBuf>,
        abs_workspace_path: impl Into<PathBuf>,
        configuration: impl Into<String>,
    ) -> Self {
        Self {
            abs_code_path: abs_code_path.into(),
            abs_workspace_path: abs_workspace_path.into(),
            configuration: configuration.into(),
            build_type: default_build_type(),
            platform: default_platform(),
            jobs: None,
            vcs: VcsSettings::default(),
            process_timeout_seconds: None,
        }
    }

    /// Parses settings from a JSON string and validates them.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from a JSON file and validates them.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let settings: Self = serde_json::from_str(&raw).map_err(|e| ConfigError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks that required fields are present.
    ///
    /// Path existence is checked by the steps that need the paths.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.abs_code_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField { field: "abs_code_path" });
        }
        if self.abs_workspace_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField {
                field: "abs_workspace_path",
            });
        }
        if self.configuration.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "configuration" });
        }
        if self.vcs.program.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "vcs.program" });
        }
        Ok(())
    }

    /// Sets the toolchain configuration name.
    #[must_use]
    pub fn with_build_type(mut self, build_type: impl Into<String>) -> Self {
        self.build_type = build_type.into();
        self
    }

    /// Sets the target platform.
    #[must_use]
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Sets the per-target parallelism.
    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }

    /// Sets the version-control settings.
    #[must_use]
    pub fn with_vcs(mut self, vcs: VcsSettings) -> Self {
        self.vcs = vcs;
        self
    }

    /// Sets the process timeout.
    #[must_use]
    pub fn with_process_timeout(mut self, seconds: f64) -> Self {
        self.process_timeout_seconds = Some(seconds);
        self
    }

    /// Gets the process timeout as a Duration.
    ///
    /// Non-positive or non-finite values disable the timeout.
    #[must_use]
    pub fn process_timeout(&self) -> Option<Duration> {
        self.process_timeout_seconds
            .filter(|s| s.is_finite() && *s > 0.0)
            .map(Duration::from_secs_f64)
    }
}

/// Version-control client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcsSettings {
    /// Client executable.
    #[serde(default = "default_vcs_program")]
    pub program: String,
    /// Substring of the client's stdout that identifies a locked working copy.
    #[serde(default = "default_lock_marker")]
    pub lock_marker: String,
}

fn default_vcs_program() -> String {
    "svn".to_string()
}

fn default_lock_marker() -> String {
    "lock".to_string()
}

impl Default for VcsSettings {
    fn default() -> Self {
        Self {
            program: default_vcs_program(),
            lock_marker: default_lock_marker(),
        }
    }
}
