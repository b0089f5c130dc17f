//! Testing utilities for steps and pipelines.
//!
//! This module provides:
//! - A scripted process runner that never spawns anything
//! - A recording build strategy with per-target exit codes
//! - Target and settings fixtures
//! - Assertions over build results

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{
    assert_build_failed, assert_build_succeeded, assert_matches_input, assert_target_status,
};
pub use fixtures::{experimental_target, target, SettingsFixture};
pub use mocks::{RecordingStrategy, ScriptedProcessRunner};
