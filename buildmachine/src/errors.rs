//! Error types for the build machine.
//!
//! Steps never surface these from `run`: they are caught at the step boundary
//! and recorded as error messages on the step result. They do surface from
//! constructors, configuration loading and the process collaborator.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The main error type for build machine operations.
#[derive(Debug, Error)]
pub enum BuildMachineError {
    /// Configuration is invalid.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// An external process could not be run.
    #[error("{0}")]
    Process(#[from] ProcessError),

    /// No build strategy is registered for the requested profile.
    #[error("No build template available for the desired configuration ({profile})")]
    UnknownProfile {
        /// The profile identifier that was looked up.
        profile: String,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BuildMachineError {
    /// Creates an unknown profile error.
    #[must_use]
    pub fn unknown_profile(profile: impl Into<String>) -> Self {
        Self::UnknownProfile {
            profile: profile.into(),
        }
    }
}

/// Errors raised while validating settings.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// A path that must be absolute is relative.
    #[error("The path '{}' is not absolute!", .path.display())]
    NotAbsolute {
        /// The offending path.
        path: PathBuf,
    },

    /// A path that must exist does not.
    #[error("The path '{}' does not exist!", .path.display())]
    Missing {
        /// The offending path.
        path: PathBuf,
    },

    /// A required field is empty.
    #[error("Missing required setting '{field}'")]
    MissingField {
        /// The field name.
        field: &'static str,
    },

    /// The settings file could not be read or parsed.
    #[error("Failed to load settings from '{}': {}", .path.display(), .reason)]
    Load {
        /// The settings file.
        path: PathBuf,
        /// Underlying failure description.
        reason: String,
    },
}

/// Errors raised by the process-execution collaborator.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The program could not be started.
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Waiting on or reading from the process failed.
    #[error("I/O error while running '{program}': {source}")]
    Io {
        /// Program being run.
        program: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The process exceeded the configured timeout and was killed.
    #[error("'{program}' timed out after {timeout:?}")]
    TimedOut {
        /// Program that timed out.
        program: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },
}

impl ProcessError {
    /// Returns the program this error concerns.
    #[must_use]
    pub fn program(&self) -> &str {
        match self {
            Self::Spawn { program, .. } | Self::Io { program, .. } | Self::TimedOut { program, .. } => {
                program
            }
        }
    }

    /// Returns true if the process was killed by the timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

/// Convenience result alias.
pub type Result<T, E = BuildMachineError> = std::result::Result<T, E>;
