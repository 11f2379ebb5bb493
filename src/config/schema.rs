//! Configuration schema types
//!
//! This module defines the configuration structure for Courier.

use crate::config::SecretString;
use crate::core::consolidate::OrderMode;
use crate::core::dispatch::DispatchConfig;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Main Courier configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourierConfig {
    /// Application-level settings
    pub application: ApplicationConfig,

    /// Object storage buckets and region
    pub storage: StorageConfig,

    /// Event-ingestion API settings
    pub ingestion: IngestionConfig,

    /// Batch dispatch settings
    #[serde(default)]
    pub dispatch: DispatchSettings,

    /// Pipeline job settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CourierConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.storage.validate()?;
        self.ingestion.validate()?;
        self.dispatch.validate()?;
        self.pipeline.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dry run mode (compute everything, upload and dispatch nothing)
    #[serde(default)]
    pub dry_run: bool,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Object storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// AWS region of the buckets
    pub region: String,

    /// Bucket holding cart-abandon exports
    pub cart_abandon_bucket: String,

    /// Bucket holding charged/purchase exports
    pub charged_events_bucket: String,

    /// Bucket holding product-view exports
    pub product_view_bucket: String,

    /// Bucket delta artifacts are written to and read back from
    pub delta_bucket: String,
}

impl StorageConfig {
    fn validate(&self) -> Result<(), String> {
        if self.region.trim().is_empty() {
            return Err("storage.region must not be empty".to_string());
        }
        for (name, bucket) in [
            ("storage.cart_abandon_bucket", &self.cart_abandon_bucket),
            ("storage.charged_events_bucket", &self.charged_events_bucket),
            ("storage.product_view_bucket", &self.product_view_bucket),
            ("storage.delta_bucket", &self.delta_bucket),
        ] {
            if bucket.trim().is_empty() {
                return Err(format!("{name} must not be empty"));
            }
        }
        Ok(())
    }
}

/// Event-ingestion API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Upload endpoint URL
    pub endpoint: String,

    /// Account id sent as a credential header
    pub account_id: String,

    /// Passcode sent as a credential header
    pub passcode: SecretString,

    /// Per-request timeout in seconds
    #[serde(default = "default_ingestion_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl IngestionConfig {
    fn validate(&self) -> Result<(), String> {
        url::Url::parse(&self.endpoint)
            .map_err(|e| format!("ingestion.endpoint is not a valid URL: {e}"))?;
        if self.account_id.trim().is_empty() {
            return Err("ingestion.account_id must not be empty".to_string());
        }
        use secrecy::ExposeSecret;
        if self.passcode.expose_secret().is_empty() {
            return Err("ingestion.passcode must not be empty".to_string());
        }
        if self.timeout_seconds == 0 {
            return Err("ingestion.timeout_seconds must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Batch dispatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchSettings {
    /// Maximum profiles per request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Batches sent concurrently per wave
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,

    /// Attempts per batch before recording a failure
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Base backoff delay in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl DispatchSettings {
    fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("dispatch.batch_size must be at least 1".to_string());
        }
        if self.concurrency_limit == 0 {
            return Err("dispatch.concurrency_limit must be at least 1".to_string());
        }
        if self.max_retries == 0 {
            return Err("dispatch.max_retries must be at least 1".to_string());
        }
        Ok(())
    }

    /// Convert into the dispatcher's runtime configuration
    pub fn to_dispatch_config(&self) -> DispatchConfig {
        DispatchConfig::new(
            self.batch_size,
            self.concurrency_limit,
            self.max_retries,
            Duration::from_millis(self.base_delay_ms),
        )
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            concurrency_limit: default_concurrency_limit(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

/// Pipeline job configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipelineConfig {
    /// Cart-abandon delta and dispatch settings
    #[serde(default)]
    pub cart_abandon: CartAbandonConfig,

    /// Most-viewed delta and dispatch settings
    #[serde(default)]
    pub most_viewed: MostViewedConfig,
}

impl PipelineConfig {
    fn validate(&self) -> Result<(), String> {
        self.cart_abandon.validate()?;
        self.most_viewed.validate()?;
        Ok(())
    }
}

/// Cart-abandon job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartAbandonConfig {
    /// Maximum items per consolidated profile
    #[serde(default = "default_max_items_per_profile")]
    pub max_items_per_profile: usize,

    /// Ordering policy applied before truncation
    #[serde(default = "default_cart_order_mode")]
    pub order_mode: String,

    /// Event name dispatched to the ingestion API
    #[serde(default = "default_cart_event_name")]
    pub event_name: String,

    /// Days of exports to include in the delta input
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
}

impl CartAbandonConfig {
    fn validate(&self) -> Result<(), String> {
        validate_job(
            "pipeline.cart_abandon",
            self.max_items_per_profile,
            &self.order_mode,
            &self.event_name,
            self.lookback_days,
        )
    }

    /// Parsed order mode
    pub fn order_mode(&self) -> Result<OrderMode, String> {
        OrderMode::from_str(&self.order_mode)
    }
}

impl Default for CartAbandonConfig {
    fn default() -> Self {
        Self {
            max_items_per_profile: default_max_items_per_profile(),
            order_mode: default_cart_order_mode(),
            event_name: default_cart_event_name(),
            lookback_days: default_lookback_days(),
        }
    }
}

/// Most-viewed job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MostViewedConfig {
    /// Maximum items per consolidated profile
    #[serde(default = "default_max_items_per_profile")]
    pub max_items_per_profile: usize,

    /// Ordering policy applied before truncation
    #[serde(default = "default_most_viewed_order_mode")]
    pub order_mode: String,

    /// Event name dispatched to the ingestion API
    #[serde(default = "default_most_viewed_event_name")]
    pub event_name: String,

    /// Days of exports to include in the delta input
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Minimum views for a combination to survive aggregation
    #[serde(default = "default_min_view_count")]
    pub min_view_count: u64,
}

impl MostViewedConfig {
    fn validate(&self) -> Result<(), String> {
        validate_job(
            "pipeline.most_viewed",
            self.max_items_per_profile,
            &self.order_mode,
            &self.event_name,
            self.lookback_days,
        )?;
        if self.min_view_count == 0 {
            return Err("pipeline.most_viewed.min_view_count must be at least 1".to_string());
        }
        Ok(())
    }

    /// Parsed order mode
    pub fn order_mode(&self) -> Result<OrderMode, String> {
        OrderMode::from_str(&self.order_mode)
    }
}

impl Default for MostViewedConfig {
    fn default() -> Self {
        Self {
            max_items_per_profile: default_max_items_per_profile(),
            order_mode: default_most_viewed_order_mode(),
            event_name: default_most_viewed_event_name(),
            lookback_days: default_lookback_days(),
            min_view_count: default_min_view_count(),
        }
    }
}

fn validate_job(
    section: &str,
    max_items: usize,
    order_mode: &str,
    event_name: &str,
    lookback_days: u32,
) -> Result<(), String> {
    if max_items == 0 {
        return Err(format!("{section}.max_items_per_profile must be at least 1"));
    }
    OrderMode::from_str(order_mode).map_err(|e| format!("{section}.order_mode: {e}"))?;
    if event_name.trim().is_empty() {
        return Err(format!("{section}.event_name must not be empty"));
    }
    if lookback_days == 0 {
        return Err(format!("{section}.lookback_days must be at least 1"));
    }
    Ok(())
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write JSON logs to a local file
    #[serde(default)]
    pub local_enabled: bool,

    /// Directory for local log files
    #[serde(default = "default_log_path")]
    pub local_path: String,

    /// Log file rotation (daily or hourly)
    #[serde(default = "default_log_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path must not be empty when local logging is enabled"
                .to_string());
        }
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_log_path(),
            local_rotation: default_log_rotation(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_ingestion_timeout_seconds() -> u64 {
    10
}

fn default_batch_size() -> usize {
    500
}

fn default_concurrency_limit() -> usize {
    5
}

fn default_max_retries() -> usize {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_items_per_profile() -> usize {
    5
}

fn default_cart_order_mode() -> String {
    "reverse_insertion".to_string()
}

fn default_cart_event_name() -> String {
    "TotalItemsInCart".to_string()
}

fn default_most_viewed_order_mode() -> String {
    "view_count_descending".to_string()
}

fn default_most_viewed_event_name() -> String {
    "MostProductViewed".to_string()
}

fn default_lookback_days() -> u32 {
    1
}

fn default_min_view_count() -> u64 {
    5
}

fn default_log_path() -> String {
    "logs".to_string()
}

fn default_log_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret::secret_string;

    fn valid_config() -> CourierConfig {
        CourierConfig {
            application: ApplicationConfig {
                log_level: "info".to_string(),
                dry_run: false,
            },
            storage: StorageConfig {
                region: "us-east-1".to_string(),
                cart_abandon_bucket: "cart".to_string(),
                charged_events_bucket: "charged".to_string(),
                product_view_bucket: "views".to_string(),
                delta_bucket: "delta".to_string(),
            },
            ingestion: IngestionConfig {
                endpoint: "https://ingest.example.com/v1/upload".to_string(),
                account_id: "ACC-1".to_string(),
                passcode: secret_string("secret".to_string()),
                timeout_seconds: 10,
            },
            dispatch: DispatchSettings::default(),
            pipeline: PipelineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = valid_config();
        config.application.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_bucket_rejected() {
        let mut config = valid_config();
        config.storage.delta_bucket = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.contains("delta_bucket"));
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let mut config = valid_config();
        config.ingestion.endpoint = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_passcode_rejected() {
        let mut config = valid_config();
        config.ingestion.passcode = secret_string(String::new());
        let err = config.validate().unwrap_err();
        assert!(err.contains("passcode"));
    }

    #[test]
    fn test_invalid_order_mode_rejected() {
        let mut config = valid_config();
        config.pipeline.cart_abandon.order_mode = "shuffled".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.contains("order_mode"));
    }

    #[test]
    fn test_zero_dispatch_settings_rejected() {
        let mut config = valid_config();
        config.dispatch.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_defaults_match_pipeline_contract() {
        let dispatch = DispatchSettings::default();
        assert_eq!(dispatch.batch_size, 500);
        assert_eq!(dispatch.concurrency_limit, 5);
        assert_eq!(dispatch.max_retries, 3);
        assert_eq!(dispatch.base_delay_ms, 1000);

        let cart = CartAbandonConfig::default();
        assert_eq!(cart.max_items_per_profile, 5);
        assert_eq!(cart.order_mode().unwrap(), OrderMode::ReverseInsertion);
        assert_eq!(cart.event_name, "TotalItemsInCart");

        let most_viewed = MostViewedConfig::default();
        assert_eq!(
            most_viewed.order_mode().unwrap(),
            OrderMode::ViewCountDescending
        );
        assert_eq!(most_viewed.min_view_count, 5);
    }

    #[test]
    fn test_to_dispatch_config() {
        let settings = DispatchSettings {
            batch_size: 100,
            concurrency_limit: 2,
            max_retries: 4,
            base_delay_ms: 250,
        };
        let config = settings.to_dispatch_config();
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.concurrency_limit, 2);
        assert_eq!(config.max_retries, 4);
        assert_eq!(config.base_delay, Duration::from_millis(250));
    }
}
