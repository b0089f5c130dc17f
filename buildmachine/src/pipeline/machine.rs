//! Sequential sync-then-build pipeline.

use super::PipelineReport;
use crate::config::BuildMachineSettings;
use crate::core::BuildTarget;
use crate::errors::Result;
use crate::events::EventSink;
use crate::process::ProcessRunner;
use crate::steps::{BuildStep, SyncStep};
use crate::strategies::StrategyRegistry;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// Runs a sync step followed by a build step.
///
/// The build only starts when the sync succeeded. Without a sync step the
/// build always starts.
#[derive(Debug, Clone)]
pub struct BuildMachine {
    sync: Option<SyncStep>,
    build: BuildStep,
}

impl BuildMachine {
    /// Creates a pipeline from already initialized steps.
    #[must_use]
    pub fn new(sync: Option<SyncStep>, build: BuildStep) -> Self {
        Self { sync, build }
    }

    /// Validates `settings` and initializes both steps with the standard
    /// toolchain registry.
    pub fn from_settings(
        settings: &BuildMachineSettings,
        runner: Arc<dyn ProcessRunner>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self> {
        settings.validate()?;
        let sync = SyncStep::init(settings, runner.clone(), events.clone())?;
        let registry = StrategyRegistry::standard(settings, runner);
        let build = BuildStep::init(settings, registry, events)?;
        Ok(Self::new(Some(sync), build))
    }

    /// Like [`from_settings`](Self::from_settings) but without a sync step.
    ///
    /// The code path is not checked.
    pub fn build_only(
        settings: &BuildMachineSettings,
        runner: Arc<dyn ProcessRunner>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self> {
        settings.validate()?;
        let registry = StrategyRegistry::standard(settings, runner);
        let build = BuildStep::init(settings, registry, events)?;
        Ok(Self::new(None, build))
    }

    /// Returns the sync step, if any.
    #[must_use]
    pub fn sync_step(&self) -> Option<&SyncStep> {
        self.sync.as_ref()
    }

    /// Returns the build step.
    #[must_use]
    pub fn build_step(&self) -> &BuildStep {
        &self.build
    }

    /// Synchronizes to `revision` and builds `targets`.
    pub async fn run(&self, revision: u64, targets: &[BuildTarget]) -> PipelineReport {
        let run_id = Uuid::now_v7();
        let started_at = Utc::now();
        let span = info_span!("pipeline", %run_id, revision, profile = self.build.profile());

        async {
            info!(targets = targets.len(), "Starting pipeline run");

            let sync = match &self.sync {
                Some(step) => Some(step.run(revision).await),
                None => None,
            };
            let sync_succeeded = sync.as_ref().map_or(true, |s| s.is_success());
            let build = self.build.run(sync_succeeded, targets).await;

            PipelineReport {
                run_id,
                started_at,
                revision,
                profile: self.build.profile().to_string(),
                sync,
                build,
            }
        }
        .instrument(span)
        .await
    }
}
