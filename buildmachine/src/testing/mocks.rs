//! Mock collaborators for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::core::{BuildTarget, ProcessOutcome, TargetResult};
use crate::errors::{ProcessError, Result};
use crate::process::{ProcessCommand, ProcessRunner};
use crate::strategies::BuildStrategy;

type Responder = dyn Fn(&ProcessCommand) -> Result<ProcessOutcome, String> + Send + Sync;

/// A process runner that replays scripted responses and records every call.
///
/// Queued responses are consumed in call order. Once the queue is empty the
/// responder (if any) answers, otherwise a zero-exit outcome is returned.
/// `Err` responses surface as spawn errors.
#[derive(Default)]
pub struct ScriptedProcessRunner {
    queue: Mutex<VecDeque<Result<ProcessOutcome, String>>>,
    responder: Option<Arc<Responder>>,
    calls: Mutex<Vec<ProcessCommand>>,
}

impl ScriptedProcessRunner {
    /// Creates a runner whose calls all succeed unless scripted otherwise.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a runner answering every call with `responder`.
    #[must_use]
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&ProcessCommand) -> Result<ProcessOutcome, String> + Send + Sync + 'static,
    {
        Self {
            responder: Some(Arc::new(responder)),
            ..Self::default()
        }
    }

    /// Queues an outcome for the next unanswered call.
    pub fn push_outcome(&self, outcome: ProcessOutcome) {
        self.queue.lock().push_back(Ok(outcome));
    }

    /// Queues an exit code with the given stdout.
    pub fn push_exit(&self, exit_code: i32, stdout: impl Into<String>) {
        self.push_outcome(ProcessOutcome::new(exit_code).with_stdout(stdout));
    }

    /// Queues a failure to start the process.
    pub fn push_spawn_error(&self, message: impl Into<String>) {
        self.queue.lock().push_back(Err(message.into()));
    }

    /// Returns every command run so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ProcessCommand> {
        self.calls.lock().clone()
    }

    /// Returns the number of commands run so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns the commands whose first argument is `subcommand`.
    #[must_use]
    pub fn calls_with_subcommand(&self, subcommand: &str) -> Vec<ProcessCommand> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.args.first().map(String::as_str) == Some(subcommand))
            .cloned()
            .collect()
    }

    /// Clears recorded calls and queued responses.
    pub fn reset(&self) {
        self.calls.lock().clear();
        self.queue.lock().clear();
    }
}

impl fmt::Debug for ScriptedProcessRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedProcessRunner")
            .field("queued", &self.queue.lock().len())
            .field("has_responder", &self.responder.is_some())
            .field("calls", &self.calls.lock().len())
            .finish()
    }
}

#[async_trait]
impl ProcessRunner for ScriptedProcessRunner {
    async fn run(&self, command: &ProcessCommand) -> Result<ProcessOutcome, ProcessError> {
        self.calls.lock().push(command.clone());

        let scripted = self.queue.lock().pop_front();
        let response = match scripted {
            Some(response) => response,
            None => match &self.responder {
                Some(responder) => responder(command),
                None => Ok(ProcessOutcome::success()),
            },
        };

        response.map_err(|message| ProcessError::Spawn {
            program: command.program.clone(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, message),
        })
    }
}

/// A build strategy that answers from a table of exit codes.
///
/// Targets without an entry exit with the default code. Targets listed with
/// [`errors_on`](Self::errors_on) fail to start.
#[derive(Debug, Default)]
pub struct RecordingStrategy {
    exit_codes: HashMap<String, i32>,
    spawn_errors: HashMap<String, String>,
    default_exit_code: i32,
    built: Mutex<Vec<String>>,
}

impl RecordingStrategy {
    /// Creates a strategy where every target succeeds.
    #[must_use]
    pub fn succeeding() -> Self {
        Self::default()
    }

    /// Creates a strategy where every target fails with `exit_code`.
    #[must_use]
    pub fn failing(exit_code: i32) -> Self {
        Self {
            default_exit_code: exit_code,
            ..Self::default()
        }
    }

    /// Makes `name` exit with `exit_code`.
    #[must_use]
    pub fn with_exit_code(mut self, name: impl Into<String>, exit_code: i32) -> Self {
        self.exit_codes.insert(name.into(), exit_code);
        self
    }

    /// Makes `name` fail to start with `message`.
    #[must_use]
    pub fn errors_on(mut self, name: impl Into<String>, message: impl Into<String>) -> Self {
        self.spawn_errors.insert(name.into(), message.into());
        self
    }

    /// Returns the names of targets handed to the strategy, in order.
    #[must_use]
    pub fn built(&self) -> Vec<String> {
        self.built.lock().clone()
    }
}

#[async_trait]
impl BuildStrategy for RecordingStrategy {
    fn name(&self) -> &str {
        "recording"
    }

    async fn build_target(&self, target: &BuildTarget, workspace: &Path) -> Result<TargetResult> {
        self.built.lock().push(target.name.clone());

        if let Some(message) = self.spawn_errors.get(&target.name) {
            return Err(ProcessError::Spawn {
                program: format!("build {}", workspace.display()),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, message.clone()),
            }
            .into());
        }

        let exit_code = self
            .exit_codes
            .get(&target.name)
            .copied()
            .unwrap_or(self.default_exit_code);
        let outcome = ProcessOutcome::new(exit_code)
            .with_stdout(format!("building {}", target.name))
            .with_duration_seconds(0.01);
        Ok(TargetResult::from_outcome(target, outcome))
    }
}
