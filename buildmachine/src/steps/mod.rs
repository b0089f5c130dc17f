//! The pipeline steps.
//!
//! Each step is constructed once from settings and can be run any number of
//! times. A run builds a fresh result value and returns it; nothing from a
//! previous run is retained. `run` never fails: every error ends up in the
//! returned result.

mod build;
mod sync;

pub use build::{BuildResult, BuildStep};
pub use sync::{SyncResult, SyncStep, LOCK_DIAGNOSTIC};
