//! Core result and target types shared by all steps.

mod outcome;
mod result;
mod status;
mod target;

pub use outcome::ProcessOutcome;
pub(crate) use outcome::NO_EXIT_CODE;
pub use result::StepResult;
pub use status::TargetStatus;
pub use target::{BuildTarget, TargetResult};
