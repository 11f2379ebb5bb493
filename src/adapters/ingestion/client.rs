//! HTTP client for the event-ingestion API
//!
//! One `send` call posts one upload payload. Authentication is two static
//! credential headers; the request carries a fixed per-call timeout. The
//! client performs no retries itself: transient failures are the
//! dispatcher's concern.

use crate::adapters::ingestion::models::UploadPayload;
use crate::config::IngestionConfig;
use crate::domain::IngestError;
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use secrecy::ExposeSecret;
use std::time::Duration;

/// Account-id credential header
pub const ACCOUNT_ID_HEADER: &str = "X-Account-Id";

/// Passcode credential header
pub const PASSCODE_HEADER: &str = "X-Account-Passcode";

/// A sink accepting batches of event records
///
/// The dispatcher only depends on this trait; production code uses
/// [`HttpIngestClient`], tests script their own implementations.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Send one upload payload
    ///
    /// # Errors
    ///
    /// Returns an [`IngestError`] on transport failure, timeout, or a
    /// non-2xx response. Every variant is retryable by the caller.
    async fn send(&self, payload: &UploadPayload) -> Result<(), IngestError>;
}

/// Reqwest-backed implementation of [`EventSink`]
pub struct HttpIngestClient {
    client: Client,
    endpoint: String,
    config: IngestionConfig,
}

impl HttpIngestClient {
    /// Create a new client from the ingestion configuration
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn new(config: IngestionConfig) -> Result<Self, IngestError> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| IngestError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            client,
            config,
        })
    }

    /// The configured upload endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EventSink for HttpIngestClient {
    async fn send(&self, payload: &UploadPayload) -> Result<(), IngestError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(ACCOUNT_ID_HEADER, &self.config.account_id)
            .header(
                PASSCODE_HEADER,
                self.config.passcode.expose_secret().as_ref(),
            )
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IngestError::Timeout(e.to_string())
                } else {
                    IngestError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IngestError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(
            records = payload.len(),
            status = status.as_u16(),
            "Upload accepted by ingestion API"
        );
        Ok(())
    }
}
