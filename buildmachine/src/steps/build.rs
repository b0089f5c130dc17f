//! Dependency-gated target build step.

use crate::config::BuildMachineSettings;
use crate::core::{BuildTarget, StepResult, TargetResult, TargetStatus};
use crate::errors::Result;
use crate::events::EventSink;
use crate::observability::StepTimer;
use crate::strategies::StrategyRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a build run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildResult {
    /// Common step fields.
    #[serde(flatten)]
    pub step: StepResult,
    /// One entry per input target, in input order.
    pub target_results: Vec<TargetResult>,
    /// Number of non-experimental targets that failed.
    #[serde(default)]
    pub failed_targets: usize,
}

impl BuildResult {
    /// Returns true if no non-experimental target failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.step.success
    }

    /// Looks up the result of a target by name.
    #[must_use]
    pub fn target(&self, name: &str) -> Option<&TargetResult> {
        self.target_results.iter().find(|r| r.name == name)
    }

    /// Returns the names of skipped targets, in order.
    #[must_use]
    pub fn skipped(&self) -> Vec<&str> {
        self.target_results
            .iter()
            .filter(|r| r.is_skipped())
            .map(|r| r.name.as_str())
            .collect()
    }

    /// Returns the names of targets that built successfully, in order.
    #[must_use]
    pub fn succeeded(&self) -> Vec<&str> {
        self.target_results
            .iter()
            .filter(|r| r.is_success())
            .map(|r| r.name.as_str())
            .collect()
    }

    /// Returns a copy with all durations zeroed, for comparing runs.
    #[must_use]
    pub fn without_durations(&self) -> Self {
        Self {
            step: self.step.without_duration(),
            target_results: self
                .target_results
                .iter()
                .map(TargetResult::without_durations)
                .collect(),
            failed_targets: self.failed_targets,
        }
    }
}

/// Builds an ordered list of targets with the strategy for the configured
/// profile.
///
/// A target is attempted only when all of its dependencies already built
/// successfully earlier in the same run. Experimental failures are recorded
/// but do not fail the build.
#[derive(Debug, Clone)]
pub struct BuildStep {
    workspace: PathBuf,
    profile: String,
    registry: StrategyRegistry,
    events: Arc<dyn EventSink>,
}

impl BuildStep {
    /// Creates the step. Strategy lookup is deferred to [`run`](Self::run).
    pub fn init(
        settings: &BuildMachineSettings,
        registry: StrategyRegistry,
        events: Arc<dyn EventSink>,
    ) -> Result<Self> {
        info!(
            "Build Init: Workspace: '{}', configuration '{}'.",
            settings.abs_workspace_path.display(),
            settings.configuration
        );
        Ok(Self {
            workspace: settings.abs_workspace_path.clone(),
            profile: settings.configuration.clone(),
            registry,
            events,
        })
    }

    /// Returns the workspace path targets are built in.
    #[must_use]
    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Returns the build profile identifier.
    #[must_use]
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Builds `targets` in order.
    ///
    /// Nothing is attempted when `preceding_step_succeeded` is false or no
    /// strategy is registered for the profile.
    pub async fn run(&self, preceding_step_succeeded: bool, targets: &[BuildTarget]) -> BuildResult {
        let mut result = BuildResult::default();

        info!("*** Starting build ***");
        self.events
            .emit(
                "build.started",
                Some(serde_json::json!({
                    "profile": self.profile,
                    "targets": targets.len(),
                })),
            )
            .await;

        if !preceding_step_succeeded {
            result
                .step
                .error("Build failed: preceding step failed, aborting!");
            self.emit_completed(&result).await;
            return result;
        }

        let strategy = match self.registry.resolve(&self.profile) {
            Ok(strategy) => strategy,
            Err(err) => {
                result.step.error(format!("Build failed: {err}!"));
                self.emit_completed(&result).await;
                return result;
            }
        };

        let timer = StepTimer::start("build");
        let mut succeeded: BTreeSet<&str> = BTreeSet::new();

        for target in targets {
            let dependencies_met = target
                .dependencies
                .iter()
                .all(|dependency| succeeded.contains(dependency.as_str()));

            if !dependencies_met {
                warn!(target = %target.name, "Skipping target, dependencies not met");
                self.events
                    .emit(
                        "build.target_skipped",
                        Some(serde_json::json!({ "target": target.name })),
                    )
                    .await;
                result.target_results.push(TargetResult::skipped(target));
                continue;
            }

            info!("** Starting build of target '{}' **", target.name);
            let target_result = match strategy.build_target(target, &self.workspace).await {
                Ok(target_result) => settle(target, target_result),
                Err(err) => TargetResult::errored(target, err.to_string()),
            };

            if target_result.is_success() {
                succeeded.insert(target.name.as_str());
            } else if target.experimental {
                warn!(target = %target.name, "Experimental target failed");
            } else {
                result.failed_targets += 1;
            }

            self.events
                .emit(
                    "build.target_completed",
                    Some(serde_json::json!({
                        "target": target.name,
                        "status": target_result.status,
                        "experimental": target.experimental,
                        "duration_seconds": target_result.step.duration_seconds,
                    })),
                )
                .await;
            result.target_results.push(target_result);
        }

        if result.failed_targets == 0 {
            result.step.success = true;
        } else {
            result.step.error(format!(
                "Build failed: {} targets failed to build!",
                result.failed_targets
            ));
        }
        result.step.duration_seconds = timer.finish();

        self.emit_completed(&result).await;
        result
    }

    async fn emit_completed(&self, result: &BuildResult) {
        self.events
            .emit(
                "build.completed",
                Some(serde_json::json!({
                    "success": result.step.success,
                    "failed_targets": result.failed_targets,
                    "duration_seconds": result.step.duration_seconds,
                })),
            )
            .await;
    }
}

/// Aligns a strategy's result with the target it was built for.
///
/// The exit code decides the status: zero succeeds, anything else (or no
/// process outcome at all) fails. Name, experimental flag and duration come
/// from the input target and the process.
fn settle(target: &BuildTarget, mut target_result: TargetResult) -> TargetResult {
    let exit_code = target_result.process_outcome.as_ref().map(|o| o.exit_code);
    if let Some(outcome) = &target_result.process_outcome {
        target_result.step.duration_seconds = outcome.duration_seconds;
    }
    target_result.name.clone_from(&target.name);
    target_result.experimental = target.experimental;

    if exit_code == Some(0) {
        target_result.status = TargetStatus::Succeeded;
        target_result.step.success = true;
        return target_result;
    }

    target_result.status = TargetStatus::Failed;
    target_result.step.success = false;
    if !target_result.step.has_errors() {
        match exit_code {
            Some(code) => target_result.step.error(format!(
                "Target '{}' failed with exit code {code}",
                target.name
            )),
            None => target_result.step.error(format!(
                "Target '{}' produced no process outcome",
                target.name
            )),
        }
    }
    target_result
}
