//! Serializable record of one pipeline run.

use crate::core::TargetStatus;
use crate::errors::Result;
use crate::steps::{BuildResult, SyncResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Outcome of a [`BuildMachine`](super::BuildMachine) run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Unique identifier of the run.
    pub run_id: Uuid,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Requested revision.
    pub revision: u64,
    /// Build profile identifier.
    pub profile: String,
    /// Sync result; absent when the run had no sync step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncResult>,
    /// Build result.
    pub build: BuildResult,
}

impl PipelineReport {
    /// Returns true if the sync (when run) and the build both succeeded.
    #[must_use]
    pub fn success(&self) -> bool {
        self.sync.as_ref().map_or(true, SyncResult::is_success) && self.build.is_success()
    }

    /// Serializes the report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a report produced by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Logs a console summary: one line per step and per target.
    pub fn log_summary(&self) {
        if let Some(sync) = &self.sync {
            let state = if sync.is_success() { "OK" } else { "FAILED" };
            info!(
                "SVN update to rev {}: {} ({:.2}s)",
                self.revision, state, sync.step.duration_seconds
            );
            for message in &sync.step.error_messages {
                warn!("  {message}");
            }
        }

        for target in &self.build.target_results {
            let duration = target.step.duration_seconds;
            match (target.status, target.experimental) {
                (TargetStatus::Succeeded, _) => {
                    info!("  {:<32} succeeded ({:.2}s)", target.name, duration);
                }
                (TargetStatus::Skipped, _) => {
                    warn!("  {:<32} skipped, dependencies not met", target.name);
                }
                (TargetStatus::Failed, true) => {
                    warn!("  {:<32} failed (experimental) ({:.2}s)", target.name, duration);
                }
                (TargetStatus::Failed, false) => {
                    error!("  {:<32} failed ({:.2}s)", target.name, duration);
                }
            }
        }

        if self.success() {
            info!(
                "Build with profile '{}' succeeded in {:.2}s",
                self.profile, self.build.step.duration_seconds
            );
        } else {
            for message in &self.build.step.error_messages {
                error!("{message}");
            }
        }
    }
}
