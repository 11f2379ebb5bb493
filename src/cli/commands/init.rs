//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "courier.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("Initializing Courier configuration");
        println!();

        // Check if file already exists
        if Path::new(&self.output).exists() && !self.force {
            println!("Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2); // Configuration error exit code
        }

        match fs::write(&self.output, Self::generate_config()) {
            Ok(_) => {
                println!("Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your bucket names and region", self.output);
                println!("  2. Set the ingestion endpoint and account id");
                println!("  3. Export COURIER_INGESTION_PASSCODE with your credential");
                println!("  4. Run: courier validate-config");
                Ok(0)
            }
            Err(e) => {
                println!("Failed to create configuration file: {e}");
                Ok(5)
            }
        }
    }

    /// Generate the sample configuration content
    fn generate_config() -> &'static str {
        r#"# Courier configuration

[application]
log_level = "info"
dry_run = false

[storage]
region = "ap-south-1"
cart_abandon_bucket = "cart-abandon-exports"
charged_events_bucket = "charged-exports"
product_view_bucket = "product-view-exports"
delta_bucket = "delta-artifacts"

[ingestion]
endpoint = "https://ingest.example.com/v1/upload"
account_id = "ACC-CHANGE-ME"
# Substituted from the environment at load time
passcode = "${COURIER_INGESTION_PASSCODE}"
timeout_seconds = 10

[dispatch]
batch_size = 500
concurrency_limit = 5
max_retries = 3
base_delay_ms = 1000

[pipeline.cart_abandon]
max_items_per_profile = 5
order_mode = "reverse_insertion"
event_name = "TotalItemsInCart"
lookback_days = 1

[pipeline.most_viewed]
max_items_per_profile = 5
order_mode = "view_count_descending"
event_name = "MostProductViewed"
lookback_days = 1
min_view_count = 5

[logging]
local_enabled = false
local_path = "logs"
local_rotation = "daily"
"#
    }
}
