//! Test fixtures for steps and pipelines.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use crate::config::BuildMachineSettings;
use crate::core::BuildTarget;

/// Creates a regular target with the given dependencies.
#[must_use]
pub fn target(name: &str, dependencies: &[&str]) -> BuildTarget {
    BuildTarget::new(name).with_dependencies(dependencies.iter().copied())
}

/// Creates an experimental target with the given dependencies.
#[must_use]
pub fn experimental_target(name: &str, dependencies: &[&str]) -> BuildTarget {
    target(name, dependencies).experimental()
}

/// Settings backed by real, empty code and workspace directories.
///
/// The directories live in a temporary directory that is removed when the
/// fixture is dropped.
#[derive(Debug)]
pub struct SettingsFixture {
    root: TempDir,
    /// Settings pointing at the fixture directories, profile `make`.
    pub settings: BuildMachineSettings,
}

impl SettingsFixture {
    /// Creates the directories and the settings.
    ///
    /// # Panics
    ///
    /// Panics if the directories cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self::with_profile("make")
    }

    /// Creates the directories and settings for the given profile.
    ///
    /// # Panics
    ///
    /// Panics if the directories cannot be created.
    #[must_use]
    pub fn with_profile(profile: &str) -> Self {
        let root = tempfile::Builder::new()
            .prefix("buildmachine-")
            .tempdir()
            .unwrap_or_else(|e| panic!("failed to create temp dir: {e}"));
        let code = root.path().join("code");
        let workspace = root.path().join("workspace");
        for dir in [&code, &workspace] {
            fs::create_dir(dir)
                .unwrap_or_else(|e| panic!("failed to create {}: {e}", dir.display()));
        }

        Self {
            root,
            settings: BuildMachineSettings::new(code, workspace, profile),
        }
    }

    /// Returns the directory holding both fixture directories.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.root.path()
    }
}

impl Default for SettingsFixture {
    fn default() -> Self {
        Self::new()
    }
}
