//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::CourierConfig;
use crate::config::secret::secret_string;
use crate::domain::errors::CourierError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into CourierConfig
/// 4. Applies environment variable overrides (COURIER_* prefix)
/// 5. Validates the configuration
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - Environment variable substitution fails
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use courier::config::loader::load_config;
///
/// let config = load_config("courier.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<CourierConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(CourierError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        CourierError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    // Perform environment variable substitution
    let contents = substitute_env_vars(&contents)?;

    // Parse TOML
    let mut config: CourierConfig = toml::from_str(&contents)
        .map_err(|e| CourierError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    // Apply environment variable overrides
    apply_env_overrides(&mut config);

    // Validate configuration
    config.validate().map_err(|e| {
        CourierError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    // Process line by line to skip comments
    for line in input.lines() {
        let trimmed = line.trim_start();

        // Skip comment lines - don't process env vars in comments
        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(CourierError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using COURIER_* prefix
///
/// Environment variables follow the pattern: COURIER_<SECTION>_<KEY>
/// For example: COURIER_INGESTION_ENDPOINT, COURIER_DISPATCH_BATCH_SIZE
fn apply_env_overrides(config: &mut CourierConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("COURIER_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("COURIER_APPLICATION_DRY_RUN") {
        config.application.dry_run = val.parse().unwrap_or(false);
    }

    // Storage overrides
    if let Ok(val) = std::env::var("COURIER_STORAGE_REGION") {
        config.storage.region = val;
    }
    if let Ok(val) = std::env::var("COURIER_STORAGE_CART_ABANDON_BUCKET") {
        config.storage.cart_abandon_bucket = val;
    }
    if let Ok(val) = std::env::var("COURIER_STORAGE_CHARGED_EVENTS_BUCKET") {
        config.storage.charged_events_bucket = val;
    }
    if let Ok(val) = std::env::var("COURIER_STORAGE_PRODUCT_VIEW_BUCKET") {
        config.storage.product_view_bucket = val;
    }
    if let Ok(val) = std::env::var("COURIER_STORAGE_DELTA_BUCKET") {
        config.storage.delta_bucket = val;
    }

    // Ingestion overrides
    if let Ok(val) = std::env::var("COURIER_INGESTION_ENDPOINT") {
        config.ingestion.endpoint = val;
    }
    if let Ok(val) = std::env::var("COURIER_INGESTION_ACCOUNT_ID") {
        config.ingestion.account_id = val;
    }
    if let Ok(val) = std::env::var("COURIER_INGESTION_PASSCODE") {
        config.ingestion.passcode = secret_string(val);
    }
    if let Ok(val) = std::env::var("COURIER_INGESTION_TIMEOUT_SECONDS") {
        if let Ok(timeout) = val.parse() {
            config.ingestion.timeout_seconds = timeout;
        }
    }

    // Dispatch overrides
    if let Ok(val) = std::env::var("COURIER_DISPATCH_BATCH_SIZE") {
        if let Ok(size) = val.parse() {
            config.dispatch.batch_size = size;
        }
    }
    if let Ok(val) = std::env::var("COURIER_DISPATCH_CONCURRENCY_LIMIT") {
        if let Ok(limit) = val.parse() {
            config.dispatch.concurrency_limit = limit;
        }
    }
    if let Ok(val) = std::env::var("COURIER_DISPATCH_MAX_RETRIES") {
        if let Ok(retries) = val.parse() {
            config.dispatch.max_retries = retries;
        }
    }
    if let Ok(val) = std::env::var("COURIER_DISPATCH_BASE_DELAY_MS") {
        if let Ok(delay) = val.parse() {
            config.dispatch.base_delay_ms = delay;
        }
    }

    // Pipeline overrides
    if let Ok(val) = std::env::var("COURIER_PIPELINE_CART_ABANDON_LOOKBACK_DAYS") {
        if let Ok(days) = val.parse() {
            config.pipeline.cart_abandon.lookback_days = days;
        }
    }
    if let Ok(val) = std::env::var("COURIER_PIPELINE_MOST_VIEWED_LOOKBACK_DAYS") {
        if let Ok(days) = val.parse() {
            config.pipeline.most_viewed.lookback_days = days;
        }
    }
    if let Ok(val) = std::env::var("COURIER_PIPELINE_MOST_VIEWED_MIN_VIEW_COUNT") {
        if let Ok(count) = val.parse() {
            config.pipeline.most_viewed.min_view_count = count;
        }
    }

    // Logging overrides
    if let Ok(val) = std::env::var("COURIER_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("COURIER_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}
