//! External integrations for Courier.
//!
//! This module contains the adapters that connect the pipeline to the
//! outside world:
//!
//! - [`storage`] - Object storage (S3) and the CSV codec
//! - [`ingestion`] - Event-ingestion API client
//!
//! Adapters expose narrow traits ([`storage::ObjectStore`],
//! [`ingestion::EventSink`]) so the core pipeline never touches SDK types
//! directly and tests can substitute in-memory implementations.

pub mod ingestion;
pub mod storage;
