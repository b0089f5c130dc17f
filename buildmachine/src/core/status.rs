//! Terminal state of a build target.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The terminal state of a target after a build pass.
///
/// Every target starts pending and ends in exactly one of these states.
/// There are no target-level retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    /// Not attempted because a dependency had not succeeded.
    Skipped,
    /// Built, toolchain exited with code zero.
    Succeeded,
    /// Built (or attempted), toolchain failed.
    Failed,
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped => write!(f, "skipped"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl TargetStatus {
    /// Returns true if the target was handed to the toolchain.
    #[must_use]
    pub fn was_attempted(&self) -> bool {
        !matches!(self, Self::Skipped)
    }

    /// Returns true if the target built successfully.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_status_display() {
        assert_eq!(TargetStatus::Skipped.to_string(), "skipped");
        assert_eq!(TargetStatus::Succeeded.to_string(), "succeeded");
        assert_eq!(TargetStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_target_status_predicates() {
        assert!(!TargetStatus::Skipped.was_attempted());
        assert!(TargetStatus::Failed.was_attempted());
        assert!(TargetStatus::Succeeded.is_success());
        assert!(!TargetStatus::Failed.is_success());
    }

    #[test]
    fn test_target_status_serialize() {
        let json = serde_json::to_string(&TargetStatus::Skipped).unwrap();
        assert_eq!(json, r#""skipped""#);

        let back: TargetStatus = serde_json::from_str(r#""failed""#).unwrap();
        assert_eq!(back, TargetStatus::Failed);
    }
}
