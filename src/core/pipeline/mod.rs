//! Pipeline orchestration
//!
//! This module provides the run coordinator and the run/job summaries.

pub mod coordinator;
pub mod summary;

pub use coordinator::{PipelineCoordinator, CART_DELTA_PREFIX, MOST_VIEWED_DELTA_PREFIX};
pub use summary::{JobKind, JobSummary, RunSummary};
