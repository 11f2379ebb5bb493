//! Batch dispatch to the event-ingestion API
//!
//! This module provides:
//! - Batch partitioning and aggregate accounting
//! - The wave-based dispatcher with per-batch retry

pub mod batch;
pub mod dispatcher;

pub use batch::{partition_batches, DispatchConfig, DispatchError, DispatchResult};
pub use dispatcher::BatchDispatcher;
