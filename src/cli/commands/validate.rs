//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Courier configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("Validating configuration file: {config_path}");
        println!();

        // load_config validates after parsing, so a loaded config is a valid one
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        println!("Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Region: {}", config.storage.region);
        println!("  Cart Abandon Bucket: {}", config.storage.cart_abandon_bucket);
        println!(
            "  Charged Events Bucket: {}",
            config.storage.charged_events_bucket
        );
        println!("  Product View Bucket: {}", config.storage.product_view_bucket);
        println!("  Delta Bucket: {}", config.storage.delta_bucket);
        println!("  Ingestion Endpoint: {}", config.ingestion.endpoint);
        println!("  Batch Size: {}", config.dispatch.batch_size);
        println!("  Concurrency Limit: {}", config.dispatch.concurrency_limit);
        println!("  Max Retries: {}", config.dispatch.max_retries);
        println!(
            "  Cart Abandon: {} items, {} order, event '{}'",
            config.pipeline.cart_abandon.max_items_per_profile,
            config.pipeline.cart_abandon.order_mode,
            config.pipeline.cart_abandon.event_name
        );
        println!(
            "  Most Viewed: {} items, {} order, event '{}', min {} views",
            config.pipeline.most_viewed.max_items_per_profile,
            config.pipeline.most_viewed.order_mode,
            config.pipeline.most_viewed.event_name,
            config.pipeline.most_viewed.min_view_count
        );

        Ok(0)
    }
}
