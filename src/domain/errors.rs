//! Domain error types
//!
//! This module defines the error hierarchy for Courier. All errors are
//! domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main Courier error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum CourierError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Object storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Ingestion API errors
    #[error("Ingestion error: {0}")]
    Ingestion(#[from] IngestError),

    /// Pipeline orchestration errors
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Object storage errors
///
/// Errors raised while listing, reading, or writing objects. Any of these
/// is fatal to the current run: a delta computed from a partially read
/// source would silently under-report, so the run aborts instead.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to list objects in a bucket
    #[error("Failed to list objects in bucket '{bucket}': {message}")]
    ListFailed { bucket: String, message: String },

    /// Failed to read an object
    #[error("Failed to read object '{key}' from bucket '{bucket}': {message}")]
    ReadFailed {
        bucket: String,
        key: String,
        message: String,
    },

    /// Failed to write an object
    #[error("Failed to write object '{key}' to bucket '{bucket}': {message}")]
    WriteFailed {
        bucket: String,
        key: String,
        message: String,
    },

    /// Failed to decompress a gzipped object
    #[error("Failed to decompress object '{key}': {message}")]
    Decompression { key: String, message: String },

    /// Failed to tokenize CSV content
    #[error("Failed to parse CSV content: {0}")]
    CsvParse(String),
}

/// Ingestion sink errors
///
/// Errors raised by a single send to the event-ingestion API. All variants
/// are retryable: the dispatcher retries the whole batch up to its
/// configured attempt limit before recording a batch-level failure.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Transport-level failure (connection refused, DNS, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// The per-request timeout fired
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// The API answered with a non-2xx status
    #[error("Ingestion API returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Per-row normalization failures
///
/// These are absorbed locally: the row is dropped, counted, and the run
/// continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// The identity field was missing or empty after trimming
    #[error("row has no usable identity")]
    MissingIdentity,

    /// No product-id candidate field resolved to a non-empty value
    #[error("row has no usable product id")]
    MissingProductId,
}

// Conversion from std::io::Error
impl From<std::io::Error> for CourierError {
    fn from(err: std::io::Error) -> Self {
        CourierError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for CourierError {
    fn from(err: serde_json::Error) -> Self {
        CourierError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for CourierError {
    fn from(err: toml::de::Error) -> Self {
        CourierError::Configuration(format!("TOML parse error: {err}"))
    }
}
