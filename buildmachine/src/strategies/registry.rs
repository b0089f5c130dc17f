//! Profile identifier to build strategy mapping.

use super::{BuildStrategy, CommandStrategy, Toolchain};
use crate::config::BuildMachineSettings;
use crate::errors::{BuildMachineError, Result};
use crate::process::ProcessRunner;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Registry of build strategies keyed by profile identifier.
#[derive(Debug, Clone, Default)]
pub struct StrategyRegistry {
    strategies: BTreeMap<String, Arc<dyn BuildStrategy>>,
}

impl StrategyRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with one [`CommandStrategy`] per [`Toolchain`].
    #[must_use]
    pub fn standard(settings: &BuildMachineSettings, runner: Arc<dyn ProcessRunner>) -> Self {
        let mut registry = Self::new();
        for toolchain in Toolchain::ALL {
            registry.register(
                toolchain.profile(),
                Arc::new(CommandStrategy::from_settings(toolchain, settings, runner.clone())),
            );
        }
        registry
    }

    /// Registers a strategy, replacing any previous one for the profile.
    pub fn register(&mut self, profile: impl Into<String>, strategy: Arc<dyn BuildStrategy>) {
        let profile = profile.into();
        debug!(profile = %profile, strategy = strategy.name(), "registering build strategy");
        self.strategies.insert(profile, strategy);
    }

    /// Adds a strategy, builder style.
    #[must_use]
    pub fn with(mut self, profile: impl Into<String>, strategy: Arc<dyn BuildStrategy>) -> Self {
        self.register(profile, strategy);
        self
    }

    /// Looks up the strategy for a profile.
    pub fn resolve(&self, profile: &str) -> Result<Arc<dyn BuildStrategy>> {
        self.strategies
            .get(profile)
            .cloned()
            .ok_or_else(|| BuildMachineError::unknown_profile(profile))
    }

    /// Returns true if a strategy is registered for the profile.
    #[must_use]
    pub fn contains(&self, profile: &str) -> bool {
        self.strategies.contains_key(profile)
    }

    /// Returns the registered profile identifiers, sorted.
    #[must_use]
    pub fn profiles(&self) -> Vec<&str> {
        self.strategies.keys().map(String::as_str).collect()
    }

    /// Returns the number of registered strategies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingStrategy, ScriptedProcessRunner};

    fn settings() -> BuildMachineSettings {
        BuildMachineSettings::new("/code", "/build", "make")
    }

    #[test]
    fn test_standard_registry_profiles() {
        let registry =
            StrategyRegistry::standard(&settings(), Arc::new(ScriptedProcessRunner::new()));

        assert_eq!(registry.profiles(), vec!["cmake", "make", "msbuild", "ninja"]);
        assert_eq!(registry.resolve("ninja").unwrap().name(), "ninja");
    }

    #[test]
    fn test_unknown_profile() {
        let registry = StrategyRegistry::new();
        assert!(registry.is_empty());

        let err = registry.resolve("WinVs2012Debug32").unwrap_err();
        assert!(matches!(err, BuildMachineError::UnknownProfile { .. }));
    }

    #[test]
    fn test_register_custom_profile() {
        let registry = StrategyRegistry::new()
            .with("LinuxMakeRelease64", Arc::new(RecordingStrategy::succeeding()));

        assert!(registry.contains("LinuxMakeRelease64"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.resolve("LinuxMakeRelease64").unwrap().name(), "recording");
    }
}
