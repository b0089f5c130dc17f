//! Build targets and their per-target results.

use super::{ProcessOutcome, StepResult, TargetStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A target to build, as produced by the upstream configuration step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildTarget {
    /// Target name, unique within a run.
    pub name: String,
    /// Names of targets that must have built successfully first.
    #[serde(default)]
    pub dependencies: BTreeSet<String>,
    /// Failures of experimental targets do not fail the build.
    #[serde(default)]
    pub experimental: bool,
}

impl BuildTarget {
    /// Creates a target without dependencies.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependencies: BTreeSet::new(),
            experimental: false,
        }
    }

    /// Adds a dependency.
    #[must_use]
    pub fn with_dependency(mut self, dependency: impl Into<String>) -> Self {
        self.dependencies.insert(dependency.into());
        self
    }

    /// Adds several dependencies.
    #[must_use]
    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies
            .extend(dependencies.into_iter().map(Into::into));
        self
    }

    /// Marks the target as experimental.
    #[must_use]
    pub fn experimental(mut self) -> Self {
        self.experimental = true;
        self
    }
}

/// Result of one target within a build pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetResult {
    /// Common step fields.
    #[serde(flatten)]
    pub step: StepResult,
    /// Target name.
    pub name: String,
    /// Whether the target is experimental.
    pub experimental: bool,
    /// Terminal state of the target.
    pub status: TargetStatus,
    /// Toolchain outcome; absent when the target was skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_outcome: Option<ProcessOutcome>,
}

impl TargetResult {
    /// Creates the marker for a target whose dependencies were not met.
    #[must_use]
    pub fn skipped(target: &BuildTarget) -> Self {
        Self {
            step: StepResult::new(),
            name: target.name.clone(),
            experimental: target.experimental,
            status: TargetStatus::Skipped,
            process_outcome: None,
        }
    }

    /// Creates the result of a toolchain run for a target.
    ///
    /// Duration is taken from the process; a non-zero exit records an error.
    #[must_use]
    pub fn from_outcome(target: &BuildTarget, outcome: ProcessOutcome) -> Self {
        let mut step = StepResult::new();
        step.duration_seconds = outcome.duration_seconds;
        let status = if outcome.is_success() {
            step.success = true;
            TargetStatus::Succeeded
        } else {
            step.error(format!(
                "Target '{}' failed with exit code {}",
                target.name, outcome.exit_code
            ));
            TargetStatus::Failed
        };

        Self {
            step,
            name: target.name.clone(),
            experimental: target.experimental,
            status,
            process_outcome: Some(outcome),
        }
    }

    /// Creates the result of a target whose toolchain could not be run.
    #[must_use]
    pub fn errored(target: &BuildTarget, error: impl Into<String>) -> Self {
        let mut step = StepResult::new();
        step.error(error);
        Self {
            step,
            name: target.name.clone(),
            experimental: target.experimental,
            status: TargetStatus::Failed,
            process_outcome: None,
        }
    }

    /// Returns true if the target built successfully.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns true if the target was skipped for unmet dependencies.
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self.status, TargetStatus::Skipped)
    }

    /// Returns true if this failure counts against the build.
    #[must_use]
    pub fn counts_as_failure(&self) -> bool {
        matches!(self.status, TargetStatus::Failed) && !self.experimental
    }

    /// Returns a copy with all durations zeroed, for comparing runs.
    #[must_use]
    pub fn without_durations(&self) -> Self {
        let mut copy = self.clone();
        copy.step = copy.step.without_duration();
        if let Some(outcome) = copy.process_outcome.as_mut() {
            outcome.duration_seconds = 0.0;
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_builder() {
        let target = BuildTarget::new("Foundation")
            .with_dependency("ThirdParty")
            .with_dependencies(["Core", "ThirdParty"])
            .experimental();

        assert_eq!(target.name, "Foundation");
        assert_eq!(target.dependencies.len(), 2);
        assert!(target.experimental);
    }

    #[test]
    fn test_target_deserialize_defaults() {
        let target: BuildTarget = serde_json::from_str(r#"{ "name": "Core" }"#).unwrap();
        assert!(target.dependencies.is_empty());
        assert!(!target.experimental);
    }

    #[test]
    fn test_skipped_marker_has_no_outcome() {
        let target = BuildTarget::new("Editor").with_dependency("Core").experimental();
        let result = TargetResult::skipped(&target);

        assert!(result.is_skipped());
        assert!(!result.step.success);
        assert!(result.experimental);
        assert!(result.process_outcome.is_none());
        assert!(!result.counts_as_failure());
    }

    #[test]
    fn test_from_failed_outcome() {
        let target = BuildTarget::new("Core");
        let outcome = ProcessOutcome::new(2).with_duration_seconds(3.0);
        let result = TargetResult::from_outcome(&target, outcome);

        assert_eq!(result.status, TargetStatus::Failed);
        assert!(!result.step.success);
        assert_eq!(result.step.duration_seconds, 3.0);
        assert_eq!(
            result.step.last_error(),
            Some("Target 'Core' failed with exit code 2")
        );
        assert!(result.counts_as_failure());
    }

    #[test]
    fn test_experimental_failure_not_counted() {
        let target = BuildTarget::new("Sandbox").experimental();
        let result = TargetResult::from_outcome(&target, ProcessOutcome::new(1));
        assert_eq!(result.status, TargetStatus::Failed);
        assert!(!result.counts_as_failure());
    }

    #[test]
    fn test_errored_counts_as_failure() {
        let target = BuildTarget::new("Core");
        let result = TargetResult::errored(&target, "Failed to start 'make'");
        assert_eq!(result.status, TargetStatus::Failed);
        assert!(result.process_outcome.is_none());
        assert!(result.counts_as_failure());
    }

    #[test]
    fn test_serialized_shape_is_flat() {
        let target = BuildTarget::new("Core");
        let result = TargetResult::from_outcome(&target, ProcessOutcome::success());
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["name"], "Core");
        assert_eq!(value["success"], true);
        assert_eq!(value["status"], "succeeded");
        assert_eq!(value["process_outcome"]["exit_code"], 0);
    }
}
