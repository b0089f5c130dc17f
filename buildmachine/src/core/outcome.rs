//! Captured result of an external process.

use serde::{Deserialize, Serialize};

/// Exit code reported when a process was terminated without one (by a signal).
pub(crate) const NO_EXIT_CODE: i32 = -1;

/// What an external command produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessOutcome {
    /// Process exit code.
    pub exit_code: i32,
    /// Captured standard output.
    #[serde(default)]
    pub stdout: String,
    /// Captured standard error.
    #[serde(default)]
    pub stderr: String,
    /// Wall-clock duration in seconds.
    pub duration_seconds: f64,
}

impl ProcessOutcome {
    /// Creates an outcome with the given exit code and no output.
    #[must_use]
    pub fn new(exit_code: i32) -> Self {
        Self {
            exit_code,
            ..Default::default()
        }
    }

    /// Creates a zero-exit outcome.
    #[must_use]
    pub fn success() -> Self {
        Self::new(0)
    }

    /// Sets the captured stdout.
    #[must_use]
    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    /// Sets the captured stderr.
    #[must_use]
    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }

    /// Sets the duration.
    #[must_use]
    pub fn with_duration_seconds(mut self, seconds: f64) -> Self {
        self.duration_seconds = seconds;
        self
    }

    /// Returns true if the process exited with code zero.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}
