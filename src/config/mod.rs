//! Configuration management for Courier.
//!
//! This module provides TOML-based configuration loading, parsing, and
//! validation.
//!
//! # Overview
//!
//! Courier uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - Environment variable overrides (`COURIER_*` prefix)
//! - Default values for optional settings
//! - Comprehensive validation
//! - Type-safe configuration structs
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use courier::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Load configuration from file
//! let config = load_config("courier.toml")?;
//!
//! // Access configuration sections
//! println!("Delta bucket: {}", config.storage.delta_bucket);
//! println!("Batch size: {}", config.dispatch.batch_size);
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [storage]
//! region = "ap-south-1"
//! cart_abandon_bucket = "cart-abandon-exports"
//! charged_events_bucket = "charged-exports"
//! product_view_bucket = "product-view-exports"
//! delta_bucket = "delta-artifacts"
//!
//! [ingestion]
//! endpoint = "https://ingest.example.com/v1/upload"
//! account_id = "ACC-12345"
//! passcode = "${COURIER_INGESTION_PASSCODE}"
//!
//! [dispatch]
//! batch_size = 500
//! concurrency_limit = 5
//!
//! [pipeline.cart_abandon]
//! max_items_per_profile = 5
//! order_mode = "reverse_insertion"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, CartAbandonConfig, CourierConfig, DispatchSettings, IngestionConfig,
    LoggingConfig, MostViewedConfig, PipelineConfig, StorageConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
