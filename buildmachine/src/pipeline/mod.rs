//! Pipeline composition and reporting.
//!
//! This module provides:
//! - [`BuildMachine`], which runs the sync step and then the build step
//! - [`PipelineReport`], the serializable record of one run

mod machine;
mod report;

pub use machine::BuildMachine;
pub use report::PipelineReport;
