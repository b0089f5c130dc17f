//! Result fields common to every step.

use serde::{Deserialize, Serialize};

/// Outcome of one step run.
///
/// `success` is only set by the step itself once every error condition has
/// been ruled out. Recording an error does not clear it, so a step may report
/// success together with diagnostics (a recovered lock, for instance).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// Whether the step succeeded.
    pub success: bool,
    /// Diagnostics recorded during the run, in order.
    #[serde(default)]
    pub error_messages: Vec<String>,
    /// Duration in seconds.
    pub duration_seconds: f64,
}

impl StepResult {
    /// Creates an empty, unsuccessful result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error message and logs it.
    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(error = %message, "step error");
        self.error_messages.push(message);
    }

    /// Returns true if any error has been recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.error_messages.is_empty()
    }

    /// Returns the most recent error message.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.error_messages.last().map(String::as_str)
    }

    /// Returns a copy with the duration zeroed, for comparing runs.
    #[must_use]
    pub fn without_duration(&self) -> Self {
        Self {
            duration_seconds: 0.0,
            ..self.clone()
        }
    }
}
