//! Process-execution collaborator.
//!
//! Steps and build strategies never spawn processes themselves; they describe
//! a [`ProcessCommand`] and hand it to a [`ProcessRunner`]. Runs are awaited
//! one at a time.

mod command;
mod runner;

pub use command::ProcessCommand;
pub use runner::{ProcessRunner, TokioProcessRunner};
