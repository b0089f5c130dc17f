//! Test assertions for build results.

use crate::core::{BuildTarget, TargetStatus};
use crate::steps::BuildResult;

/// Asserts that the build succeeded.
pub fn assert_build_succeeded(result: &BuildResult) {
    assert!(
        result.is_success(),
        "Expected build to succeed, got errors: {:?}",
        result.step.error_messages
    );
}

/// Asserts that the build failed.
pub fn assert_build_failed(result: &BuildResult) {
    assert!(
        !result.is_success(),
        "Expected build to fail, but it succeeded with {} targets",
        result.target_results.len()
    );
}

/// Asserts that the named target ended in the expected state.
pub fn assert_target_status(result: &BuildResult, name: &str, expected: TargetStatus) {
    let actual = result.target(name).map(|r| r.status);
    assert_eq!(
        actual,
        Some(expected),
        "Expected target '{}' to be {}, got {:?}",
        name,
        expected,
        actual
    );
}

/// Asserts one result per input target, in input order, with matching names
/// and experimental flags.
pub fn assert_matches_input(targets: &[BuildTarget], result: &BuildResult) {
    let expected: Vec<(&str, bool)> = targets
        .iter()
        .map(|t| (t.name.as_str(), t.experimental))
        .collect();
    let actual: Vec<(&str, bool)> = result
        .target_results
        .iter()
        .map(|r| (r.name.as_str(), r.experimental))
        .collect();
    assert_eq!(actual, expected, "Target results do not mirror the input list");
}
