//! S3 implementation of the object store
//!
//! Credentials come from the standard AWS provider chain (environment,
//! profile, instance metadata); only the region is taken from Courier's
//! configuration.

use crate::adapters::storage::traits::{ObjectInfo, ObjectStore};
use crate::domain::StorageError;
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};

/// S3-backed [`ObjectStore`]
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Create a new store, resolving credentials from the provider chain
    pub async fn new(region: &str) -> Self {
        let region_provider =
            RegionProviderChain::default_provider().or_else(Region::new(region.to_string()));

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;

        Self {
            client: Client::new(&aws_config),
        }
    }

    /// Wrap an existing SDK client (used by local-stack test setups)
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list(&self, bucket: &str) -> Result<Vec<ObjectInfo>, StorageError> {
        let mut objects = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| StorageError::ListFailed {
                bucket: bucket.to_string(),
                message: e.to_string(),
            })?;
            for object in page.contents() {
                let Some(key) = object.key() else { continue };
                let last_modified = object
                    .last_modified()
                    .and_then(|t| DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos()));
                objects.push(ObjectInfo::new(key, last_modified));
            }
        }

        tracing::debug!(bucket, count = objects.len(), "Listed bucket objects");
        Ok(objects)
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::ReadFailed {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: e.to_string(),
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::ReadFailed {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: e.to_string(),
            })?;

        Ok(body.to_vec())
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::WriteFailed {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: e.to_string(),
            })?;

        tracing::info!(bucket, key, "Uploaded object");
        Ok(())
    }
}
