//! Configuration loading integration tests

use courier::config::load_config;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const VALID_CONFIG: &str = r#"
[application]
log_level = "info"

[storage]
region = "ap-south-1"
cart_abandon_bucket = "cart-exports"
charged_events_bucket = "charged-exports"
product_view_bucket = "view-exports"
delta_bucket = "delta-artifacts"

[ingestion]
endpoint = "https://ingest.example.com/v1/upload"
account_id = "ACC-1"
passcode = "topsecret"

[dispatch]
batch_size = 200
concurrency_limit = 3

[pipeline.cart_abandon]
max_items_per_profile = 3
order_mode = "reverse_insertion"

[pipeline.most_viewed]
min_view_count = 2
"#;

#[test]
fn test_load_full_config() {
    let file = write_config(VALID_CONFIG);
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.storage.cart_abandon_bucket, "cart-exports");
    assert_eq!(config.dispatch.batch_size, 200);
    assert_eq!(config.dispatch.concurrency_limit, 3);
    // Unset dispatch keys fall back to defaults
    assert_eq!(config.dispatch.max_retries, 3);
    assert_eq!(config.dispatch.base_delay_ms, 1000);

    assert_eq!(config.pipeline.cart_abandon.max_items_per_profile, 3);
    assert_eq!(config.pipeline.cart_abandon.event_name, "TotalItemsInCart");
    assert_eq!(config.pipeline.most_viewed.min_view_count, 2);
    assert_eq!(
        config.pipeline.most_viewed.event_name,
        "MostProductViewed"
    );
}

#[test]
fn test_env_var_substitution() {
    std::env::set_var("COURIER_IT_PASSCODE", "from-env");
    let file = write_config(&VALID_CONFIG.replace("topsecret", "${COURIER_IT_PASSCODE}"));

    let config = load_config(file.path()).unwrap();

    use secrecy::ExposeSecret;
    assert_eq!(config.ingestion.passcode.expose_secret(), "from-env");
    std::env::remove_var("COURIER_IT_PASSCODE");
}

#[test]
fn test_missing_env_var_fails() {
    std::env::remove_var("COURIER_IT_MISSING");
    let file = write_config(&VALID_CONFIG.replace("topsecret", "${COURIER_IT_MISSING}"));

    let result = load_config(file.path());
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("COURIER_IT_MISSING"));
}

#[test]
fn test_invalid_order_mode_fails_validation() {
    let file = write_config(&VALID_CONFIG.replace("reverse_insertion", "alphabetical"));

    let result = load_config(file.path());
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("order_mode"));
}

#[test]
fn test_missing_section_fails() {
    let file = write_config(
        r#"
[application]
log_level = "info"
"#,
    );

    assert!(load_config(file.path()).is_err());
}

#[test]
fn test_env_override_applies() {
    // A logging key nothing else in this file asserts on, so concurrent
    // tests don't observe the temporary override
    std::env::set_var("COURIER_LOGGING_LOCAL_PATH", "custom-logs");
    let file = write_config(VALID_CONFIG);

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.logging.local_path, "custom-logs");

    std::env::remove_var("COURIER_LOGGING_LOCAL_PATH");
}
