//! Core business logic for Courier.
//!
//! This module contains the pipeline stages and their orchestration.
//!
//! # Modules
//!
//! - [`normalize`] - Canonical record resolution over open row schemas
//! - [`views`] - Product-view aggregation with a minimum-count threshold
//! - [`delta`] - Delta computation with exclusion and dedup
//! - [`consolidate`] - Per-identity profile consolidation
//! - [`dispatch`] - Wave-based batch dispatch with retry
//! - [`pipeline`] - Run orchestration and summaries
//!
//! # Pipeline Workflow
//!
//! A full run:
//!
//! 1. **Fetch**: Read the day's event exports from object storage
//! 2. **Aggregate** (most-viewed only): Collapse repeated views per combination
//! 3. **Delta**: Drop combinations already confirmed by charged events,
//!    dedup the remainder
//! 4. **Artifact**: Upload the delta as a timestamped CSV
//! 5. **Consolidate**: Group the latest artifact per identity, order and
//!    truncate
//! 6. **Dispatch**: Send profiles to the ingestion API in bounded,
//!    retried batches
//! 7. **Report**: Log the run summary
//!
//! # Example
//!
//! ```rust,no_run
//! use courier::config::load_config;
//! use courier::core::pipeline::{JobKind, PipelineCoordinator};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("courier.toml")?;
//! let coordinator = PipelineCoordinator::new(config).await?;
//!
//! let summary = coordinator.execute_run(&JobKind::ALL).await?;
//! println!("Failed profiles: {}", summary.total_failed());
//! # Ok(())
//! # }
//! ```

pub mod consolidate;
pub mod delta;
pub mod dispatch;
pub mod normalize;
pub mod pipeline;
pub mod views;
