//! Object storage traits
//!
//! The pipeline only needs three narrow operations: list a bucket, fetch
//! an object, and write an artifact. Production code uses the S3
//! implementation; tests provide an in-memory store.

use crate::domain::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Descriptor of one stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Object key within its bucket
    pub key: String,
    /// Last-modified timestamp, when the store reports one
    pub last_modified: Option<DateTime<Utc>>,
}

impl ObjectInfo {
    /// Create a new object descriptor
    pub fn new(key: impl Into<String>, last_modified: Option<DateTime<Utc>>) -> Self {
        Self {
            key: key.into(),
            last_modified,
        }
    }
}

/// Narrow interface over an object store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List every object in a bucket
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ListFailed`] when the listing cannot be
    /// completed; fatal to the current run.
    async fn list(&self, bucket: &str) -> Result<Vec<ObjectInfo>, StorageError>;

    /// Fetch an object's raw bytes
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadFailed`] when the object cannot be
    /// read; fatal to the current run.
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Write an object
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::WriteFailed`] when the object cannot be
    /// written; fatal to the current run.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;
}
