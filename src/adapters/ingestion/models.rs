//! Wire types for the event-ingestion API
//!
//! The upload endpoint accepts a JSON body of the shape
//! `{"records": [{identity, type, evtName, evtData, ts?}, ...]}`.

use crate::domain::ConsolidatedProfile;
use serde::Serialize;
use serde_json::{Map, Value};

/// One event record inside an upload payload
#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    /// Identity the event is keyed on
    pub identity: String,

    /// Record type; always `"event"` for this pipeline
    #[serde(rename = "type")]
    pub record_type: String,

    /// Event name
    #[serde(rename = "evtName")]
    pub evt_name: String,

    /// Indexed event attributes
    #[serde(rename = "evtData")]
    pub evt_data: Map<String, Value>,

    /// Epoch-seconds timestamp, when the pipeline stamped one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
}

impl EventRecord {
    /// Build an event record from a consolidated profile
    pub fn from_profile(profile: &ConsolidatedProfile) -> Self {
        Self {
            identity: profile.identity.as_str().to_string(),
            record_type: "event".to_string(),
            evt_name: profile.event_name.clone(),
            evt_data: profile.attributes.clone(),
            ts: profile.timestamp,
        }
    }
}

/// One upload request body: every profile of a batch as individual records
#[derive(Debug, Clone, Serialize)]
pub struct UploadPayload {
    /// Event records in batch order
    pub records: Vec<EventRecord>,
}

impl UploadPayload {
    /// Build a payload from a batch of consolidated profiles
    pub fn from_profiles(profiles: &[ConsolidatedProfile]) -> Self {
        Self {
            records: profiles.iter().map(EventRecord::from_profile).collect(),
        }
    }

    /// Number of records in the payload
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the payload carries no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
