//! # Buildmachine
//!
//! Stage runner for a build machine: bring a Subversion working copy to a
//! requested revision, then build an ordered list of targets.
//!
//! - **Sync step**: `svn update` with a single cleanup-and-retry when the
//!   working copy is locked
//! - **Build step**: targets built in input order, each gated on its
//!   dependencies having already succeeded; experimental failures tolerated
//! - **Pluggable toolchains**: build profiles resolve to strategies through a
//!   registry
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use buildmachine::prelude::*;
//!
//! let settings = BuildMachineSettings::from_json_file("buildmachine.json")?;
//! let runner = Arc::new(TokioProcessRunner::new());
//! let machine = BuildMachine::from_settings(&settings, runner, default_sink())?;
//!
//! let report = machine.run(1234, &targets).await;
//! report.log_summary();
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod process;
pub mod steps;
pub mod strategies;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{BuildMachineSettings, VcsSettings};
    pub use crate::core::{BuildTarget, ProcessOutcome, StepResult, TargetResult, TargetStatus};
    pub use crate::errors::{BuildMachineError, ConfigError, ProcessError};
    pub use crate::events::{default_sink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::observability::{init_tracing, LogFormat};
    pub use crate::pipeline::{BuildMachine, PipelineReport};
    pub use crate::process::{ProcessCommand, ProcessRunner, TokioProcessRunner};
    pub use crate::steps::{BuildResult, BuildStep, SyncResult, SyncStep};
    pub use crate::strategies::{BuildStrategy, CommandStrategy, StrategyRegistry, Toolchain};
}
