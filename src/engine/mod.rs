//! Topic Assignment Engine and its ingestion queue.

pub mod assignment;
pub mod queue;

pub use assignment::{AssignmentEngine, AssignmentOutcome};
pub use queue::{AssignmentJob, AssignmentQueue};
