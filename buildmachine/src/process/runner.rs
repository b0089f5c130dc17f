//! Process runner trait and the tokio-backed implementation.

use super::ProcessCommand;
use crate::core::{ProcessOutcome, NO_EXIT_CODE};
use crate::errors::ProcessError;
use crate::observability::StepTimer;
use async_trait::async_trait;
use std::fmt::Debug;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Runs external commands to completion and captures their output.
///
/// A non-zero exit is a normal [`ProcessOutcome`], not an error. Errors are
/// reserved for commands that could not be run at all.
#[async_trait]
pub trait ProcessRunner: Send + Sync + Debug {
    /// Runs the command and waits for it to exit.
    async fn run(&self, command: &ProcessCommand) -> Result<ProcessOutcome, ProcessError>;
}

/// Spawns real processes with `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct TokioProcessRunner {
    timeout: Option<Duration>,
}

impl TokioProcessRunner {
    /// Creates a runner without a timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Kills processes that run longer than `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets or clears the timeout.
    #[must_use]
    pub fn with_optional_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the configured timeout.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, command: &ProcessCommand) -> Result<ProcessOutcome, ProcessError> {
        debug!(
            program = %command.program,
            args = %command.args_line(),
            working_dir = ?command.working_dir,
            "spawning process"
        );

        let timer = StepTimer::start(command.program.clone());
        let child = Command::new(&command.program)
            .args(&command.args)
            .current_dir(&command.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        // Dropping the pending future on timeout drops the child, which kills it.
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| ProcessError::TimedOut {
                    program: command.program.clone(),
                    timeout: limit,
                })?,
            None => child.wait_with_output().await,
        }
        .map_err(|source| ProcessError::Io {
            program: command.program.clone(),
            source,
        })?;

        let outcome = ProcessOutcome {
            exit_code: output.status.code().unwrap_or(NO_EXIT_CODE),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration_seconds: timer.finish(),
        };

        debug!(
            program = %command.program,
            exit_code = outcome.exit_code,
            duration_seconds = outcome.duration_seconds,
            "process exited"
        );
        if !outcome.is_success() && !outcome.stderr.is_empty() {
            debug!(stderr = %outcome.stderr, "process stderr");
        }

        Ok(outcome)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::Path;

    fn sh(script: &str) -> ProcessCommand {
        ProcessCommand::new("/bin/sh", std::env::temp_dir()).args(["-c", script])
    }

    #[tokio::test]
    async fn test_captures_stdout_and_exit_code() {
        let runner = TokioProcessRunner::new();
        let outcome = runner.run(&sh("echo hello; echo oops >&2; exit 3")).await.unwrap();

        assert_eq!(outcome.exit_code, 3);
        assert_eq!(outcome.stdout.trim(), "hello");
        assert_eq!(outcome.stderr.trim(), "oops");
        assert!(outcome.duration_seconds >= 0.0);
    }

    #[tokio::test]
    async fn test_runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let runner = TokioProcessRunner::new();
        let cmd = ProcessCommand::new("/bin/sh", dir.path()).args(["-c", "pwd"]);
        let outcome = runner.run(&cmd).await.unwrap();

        let reported = Path::new(outcome.stdout.trim()).canonicalize().unwrap();
        assert_eq!(reported, dir.path().canonicalize().unwrap());
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let runner = TokioProcessRunner::new();
        let cmd = ProcessCommand::new("definitely-not-a-real-program-xyz", std::env::temp_dir());
        let err = runner.run(&cmd).await.unwrap_err();

        assert!(matches!(err, ProcessError::Spawn { .. }));
        assert_eq!(err.program(), "definitely-not-a-real-program-xyz");
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let runner = TokioProcessRunner::new().with_timeout(Duration::from_millis(100));
        let err = runner.run(&sh("sleep 5")).await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_fast_process_within_timeout() {
        let runner = TokioProcessRunner::new().with_timeout(Duration::from_secs(10));
        let outcome = runner.run(&sh("exit 0")).await.unwrap();
        assert!(outcome.is_success());
    }
}
