//! Event-ingestion API adapter
//!
//! This module provides the wire types and the HTTP client for the
//! external event-ingestion API, behind the narrow [`EventSink`] trait the
//! dispatcher consumes.

pub mod client;
pub mod models;

pub use client::{EventSink, HttpIngestClient, ACCOUNT_ID_HEADER, PASSCODE_HEADER};
pub use models::{EventRecord, UploadPayload};
