//! Build strategies: how a single target is built for a build profile.
//!
//! A [`StrategyRegistry`] maps profile identifiers to [`BuildStrategy`]
//! implementations. The build step resolves its profile once per run.

mod registry;
mod toolchain;

pub use registry::StrategyRegistry;
pub use toolchain::{CommandStrategy, Toolchain};

use crate::core::{BuildTarget, TargetResult};
use crate::errors::Result;
use async_trait::async_trait;
use std::fmt::Debug;
use std::path::Path;

/// Builds one target with a particular toolchain convention.
#[async_trait]
pub trait BuildStrategy: Send + Sync + Debug {
    /// Returns the strategy name, used in logs.
    fn name(&self) -> &str;

    /// Builds `target` inside `workspace`.
    ///
    /// A toolchain that runs and fails yields `Ok` with a failed result;
    /// `Err` means the toolchain could not be run at all.
    async fn build_target(&self, target: &BuildTarget, workspace: &Path) -> Result<TargetResult>;
}
