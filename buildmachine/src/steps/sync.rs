//! Working-copy synchronization step.

use crate::config::{BuildMachineSettings, VcsSettings};
use crate::core::{ProcessOutcome, StepResult};
use crate::errors::{ConfigError, ProcessError, Result};
use crate::events::EventSink;
use crate::process::{ProcessCommand, ProcessRunner};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Diagnostic recorded when a locked working copy triggers a cleanup.
pub const LOCK_DIAGNOSTIC: &str = "SVN repository locked: trying cleanup...";

/// Update attempts: the first one plus one retry after a lock cleanup.
const MAX_ATTEMPTS: usize = 2;

/// Result of a synchronization run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncResult {
    /// Common step fields.
    #[serde(flatten)]
    pub step: StepResult,
    /// Outcome of the last update command that ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_outcome: Option<ProcessOutcome>,
}

impl SyncResult {
    /// Returns true if the working copy is at the requested revision.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.step.success
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

/// Brings the working copy to a requested revision.
#[derive(Debug, Clone)]
pub struct SyncStep {
    code_path: PathBuf,
    vcs: VcsSettings,
    runner: Arc<dyn ProcessRunner>,
    events: Arc<dyn EventSink>,
}

impl SyncStep {
    /// Validates the settings and creates the step.
    ///
    /// The code path must be absolute and an existing directory.
    pub fn init(
        settings: &BuildMachineSettings,
        runner: Arc<dyn ProcessRunner>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self> {
        if let Err(err) = validate_code_path(&settings.abs_code_path) {
            error!("SVN Init failed: {err}");
            return Err(err.into());
        }
        info!("SVN Init: Code path: '{}'.", settings.abs_code_path.display());

        Ok(Self {
            code_path: settings.abs_code_path.clone(),
            vcs: settings.vcs.clone(),
            runner,
            events,
        })
    }

    /// Returns the working copy path.
    #[must_use]
    pub fn code_path(&self) -> &Path {
        &self.code_path
    }

    /// Updates the working copy to `revision`.
    ///
    /// A locked working copy is cleaned up and the update retried once. Any
    /// failure to run the client is recorded in the result.
    pub async fn run(&self, revision: u64) -> SyncResult {
        let mut result = SyncResult::default();

        info!("*** Starting SVN update to rev {revision} ***");
        self.events
            .emit("sync.started", Some(serde_json::json!({ "revision": revision })))
            .await;

        if let Err(err) = self.update(revision, &mut result).await {
            result.step.error(err.to_string());
        }

        self.events
            .emit(
                "sync.completed",
                Some(serde_json::json!({
                    "revision": revision,
                    "success": result.step.success,
                    "duration_seconds": result.step.duration_seconds,
                })),
            )
            .await;
        result
    }

    async fn update(&self, revision: u64, result: &mut SyncResult) -> Result<(), ProcessError> {
        let command = self.update_command(revision);

        for attempt in 0..MAX_ATTEMPTS {
            let outcome = self.runner.run(&command).await?;
            let exit_code = outcome.exit_code;
            let locked = outcome.stdout.contains(&self.vcs.lock_marker);
            result.step.duration_seconds = outcome.duration_seconds;
            result.process_outcome = Some(outcome);

            if exit_code == 0 {
                result.step.success = true;
                return Ok(());
            }

            if attempt == 0 && locked {
                result.step.error(LOCK_DIAGNOSTIC);
                self.events
                    .emit("sync.lock_detected", Some(serde_json::json!({ "exit_code": exit_code })))
                    .await;
                self.cleanup().await;
                continue;
            }

            result
                .step
                .error(format!("SVN failed: SVN returned ErrorCode: {exit_code}!"));
            return Ok(());
        }

        Ok(())
    }

    // The cleanup outcome does not affect control flow; the retry decides.
    async fn cleanup(&self) {
        let command = ProcessCommand::new(&self.vcs.program, &self.code_path).arg("cleanup");
        match self.runner.run(&command).await {
            Ok(outcome) if !outcome.is_success() => {
                warn!(exit_code = outcome.exit_code, "SVN cleanup returned a non-zero exit code");
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "SVN cleanup could not be run"),
        }
    }

    fn update_command(&self, revision: u64) -> ProcessCommand {
        ProcessCommand::new(&self.vcs.program, &self.code_path)
            .arg("update")
            .args(["-r".to_string(), revision.to_string()])
            .args(["--accept", "postpone"])
    }
}

fn validate_code_path(path: &Path) -> Result<(), ConfigError> {
    if !path.is_absolute() {
        return Err(ConfigError::NotAbsolute {
            path: path.to_path_buf(),
        });
    }
    if !path.is_dir() {
        return Err(ConfigError::Missing {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BuildMachineError;
    use crate::events::{default_sink, CollectingEventSink};
    use crate::testing::{ScriptedProcessRunner, SettingsFixture};
    use pretty_assertions::assert_eq;

    fn step(fixture: &SettingsFixture, runner: &Arc<ScriptedProcessRunner>) -> SyncStep {
        SyncStep::init(&fixture.settings, runner.clone(), default_sink()).unwrap()
    }

    #[test]
    fn test_init_rejects_relative_path() {
        let settings = BuildMachineSettings::new("relative/code", "/build", "make");
        let err = SyncStep::init(&settings, Arc::new(ScriptedProcessRunner::new()), default_sink())
            .unwrap_err();
        assert!(matches!(err, BuildMachineError::Config(ConfigError::NotAbsolute { .. })));
    }

    #[test]
    fn test_init_rejects_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let settings = BuildMachineSettings::new(missing, "/build", "make");
        let err = SyncStep::init(&settings, Arc::new(ScriptedProcessRunner::new()), default_sink())
            .unwrap_err();
        assert!(matches!(err, BuildMachineError::Config(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_init_accepts_existing_absolute_path() {
        let fixture = SettingsFixture::new();
        let runner = Arc::new(ScriptedProcessRunner::new());
        let step = step(&fixture, &runner);
        assert_eq!(step.code_path(), fixture.settings.abs_code_path.as_path());
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn test_successful_update() {
        let fixture = SettingsFixture::new();
        let runner = Arc::new(ScriptedProcessRunner::new());
        runner.push_outcome(ProcessOutcome::success().with_duration_seconds(4.0));

        let result = step(&fixture, &runner).run(1234).await;

        assert!(result.is_success());
        assert!(result.step.error_messages.is_empty());
        assert_eq!(result.step.duration_seconds, 4.0);
        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "svn");
        assert_eq!(calls[0].args, vec!["update", "-r", "1234", "--accept", "postpone"]);
        assert_eq!(calls[0].working_dir, fixture.settings.abs_code_path);
    }

    #[tokio::test]
    async fn test_lock_then_success_retries_once_after_cleanup() {
        let fixture = SettingsFixture::new();
        let runner = Arc::new(ScriptedProcessRunner::new());
        runner.push_exit(1, "svn: E155004: Working copy '/code' locked");
        runner.push_outcome(ProcessOutcome::success());
        runner.push_outcome(ProcessOutcome::success().with_duration_seconds(2.0));

        let result = step(&fixture, &runner).run(7).await;

        assert!(result.is_success());
        assert_eq!(result.step.error_messages, vec![LOCK_DIAGNOSTIC.to_string()]);
        assert_eq!(result.step.duration_seconds, 2.0);

        let subcommands: Vec<_> = runner.calls().iter().map(|c| c.args[0].clone()).collect();
        assert_eq!(subcommands, vec!["update", "cleanup", "update"]);
        assert_eq!(runner.calls_with_subcommand("cleanup").len(), 1);
    }

    #[tokio::test]
    async fn test_non_lock_failure_does_not_retry() {
        let fixture = SettingsFixture::new();
        let runner = Arc::new(ScriptedProcessRunner::new());
        runner.push_exit(1, "svn: E170013: Unable to connect to a repository");

        let result = step(&fixture, &runner).run(7).await;

        assert!(!result.is_success());
        assert_eq!(runner.call_count(), 1);
        assert_eq!(
            result.step.error_messages,
            vec!["SVN failed: SVN returned ErrorCode: 1!".to_string()]
        );
        assert_eq!(result.process_outcome.unwrap().exit_code, 1);
    }

    #[tokio::test]
    async fn test_lock_twice_fails_after_second_attempt() {
        let fixture = SettingsFixture::new();
        let runner = Arc::new(ScriptedProcessRunner::new());
        runner.push_exit(1, "locked");
        runner.push_outcome(ProcessOutcome::success());
        runner.push_exit(3, "still locked");

        let result = step(&fixture, &runner).run(7).await;

        assert!(!result.is_success());
        assert_eq!(runner.calls_with_subcommand("update").len(), 2);
        assert_eq!(runner.calls_with_subcommand("cleanup").len(), 1);
        assert_eq!(
            result.step.error_messages,
            vec![
                LOCK_DIAGNOSTIC.to_string(),
                "SVN failed: SVN returned ErrorCode: 3!".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_cleanup_still_retries() {
        let fixture = SettingsFixture::new();
        let runner = Arc::new(ScriptedProcessRunner::new());
        runner.push_exit(1, "locked");
        runner.push_spawn_error("cleanup crashed");
        runner.push_outcome(ProcessOutcome::success());

        let result = step(&fixture, &runner).run(7).await;

        assert!(result.is_success());
        assert_eq!(result.step.error_messages.len(), 1);
        assert_eq!(runner.call_count(), 3);
    }

    #[tokio::test]
    async fn test_spawn_failure_is_recorded_not_propagated() {
        let fixture = SettingsFixture::new();
        let runner = Arc::new(ScriptedProcessRunner::new());
        runner.push_spawn_error("svn: command not found");

        let result = step(&fixture, &runner).run(7).await;

        assert!(!result.is_success());
        assert!(result.process_outcome.is_none());
        assert_eq!(result.step.error_messages.len(), 1);
        assert!(result.step.error_messages[0].contains("svn: command not found"));
    }

    #[tokio::test]
    async fn test_custom_lock_marker_and_program() {
        let fixture = SettingsFixture::new();
        let mut settings = fixture.settings.clone();
        settings.vcs = VcsSettings {
            program: "/opt/svn/bin/svn".to_string(),
            lock_marker: "E155004".to_string(),
        };
        let runner = Arc::new(ScriptedProcessRunner::new());
        runner.push_exit(1, "svn: E155004: Working copy locked");

        let result = SyncStep::init(&settings, runner.clone(), default_sink())
            .unwrap()
            .run(1)
            .await;

        assert!(result.is_success());
        assert!(runner.calls().iter().all(|c| c.program == "/opt/svn/bin/svn"));
    }

    #[tokio::test]
    async fn test_lock_retry_emits_events() {
        let fixture = SettingsFixture::new();
        let runner = Arc::new(ScriptedProcessRunner::new());
        runner.push_exit(1, "locked");
        let events = Arc::new(CollectingEventSink::new());

        let step = SyncStep::init(&fixture.settings, runner.clone(), events.clone()).unwrap();
        step.run(5).await;

        assert_eq!(
            events.event_types(),
            vec!["sync.started", "sync.lock_detected", "sync.completed"]
        );
    }

    #[tokio::test]
    async fn test_repeated_runs_do_not_leak_state() {
        let fixture = SettingsFixture::new();
        let runner = Arc::new(ScriptedProcessRunner::from_fn(|cmd| {
            if cmd.args[0] == "update" {
                Ok(ProcessOutcome::new(1).with_stdout("conflict"))
            } else {
                Ok(ProcessOutcome::success())
            }
        }));
        let step = step(&fixture, &runner);

        let first = step.run(9).await;
        let second = step.run(9).await;

        assert_eq!(first.without_durations(), second.without_durations());
        assert_eq!(second.step.error_messages.len(), 1);
    }
}
