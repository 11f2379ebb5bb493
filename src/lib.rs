// Courier - user-event delta ETL tool
// Copyright (c) 2025 Courier Contributors
// Licensed under the MIT License

//! # Courier - user-event delta ETL
//!
//! Courier is an ETL tool built in Rust that ingests periodic user-event
//! exports (cart-abandon, purchase, product-view) from object storage,
//! computes incremental delta record sets, consolidates them per user
//! identity, and dispatches the results to an event-ingestion API in
//! reliable, rate-limited batches.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Fetching** gzipped CSV exports from S3 by date window
//! - **Normalizing** schema-inconsistent rows into canonical records
//! - **Computing** deltas by excluding already-confirmed combinations
//! - **Consolidating** deltas into bounded, ordered per-identity profiles
//! - **Dispatching** profiles in concurrent, retried batches
//!
//! ## Architecture
//!
//! Courier follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (normalize, delta, consolidate, dispatch, pipeline)
//! - [`adapters`] - External integrations (S3, ingestion API, CSV codec)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use courier::config::load_config;
//! use courier::core::pipeline::{JobKind, PipelineCoordinator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Load configuration
//!     let config = load_config("courier.toml")?;
//!
//!     // Create the pipeline coordinator
//!     let coordinator = PipelineCoordinator::new(config).await?;
//!
//!     // Execute all jobs
//!     let summary = coordinator.execute_run(&JobKind::ALL).await?;
//!
//!     println!("Jobs executed: {}", summary.jobs.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Delta Semantics
//!
//! A delta record is a primary record (e.g. a cart-abandon event) whose
//! identity+product combination is absent from the exclusion source (e.g.
//! charged events). Deltas preserve source order, deduplicate by first
//! occurrence, and apply nested item expansion symmetrically to both sides:
//!
//! ```
//! use courier::core::delta::DeltaComputer;
//! use courier::domain::RawRow;
//!
//! let primary = vec![RawRow::from_pairs([
//!     ("profile.identity", "user-1"),
//!     ("eventProps.Product ID", "sku-1"),
//! ])];
//!
//! let delta = DeltaComputer::new().compute_delta(&primary, &[]);
//! assert_eq!(delta.len(), 1);
//! ```
//!
//! ## Error Handling
//!
//! Courier uses the [`domain::CourierError`] type for all errors:
//!
//! ```rust,no_run
//! use courier::domain::CourierError;
//!
//! fn example() -> Result<(), CourierError> {
//!     // Errors are automatically converted using the ? operator
//!     let config = courier::config::load_config("courier.toml")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Logging
//!
//! Courier uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn, error};
//!
//! info!("Starting run");
//! warn!(bucket = "cart-exports", "No export objects found for window");
//! error!(error = "timeout", "Batch failed after exhausting retries");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
