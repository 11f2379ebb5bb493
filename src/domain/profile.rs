//! Consolidated profile types
//!
//! Per-identity payloads summarizing up to N selected items for downstream
//! ingestion.

use super::record::{Identity, ProductId};
use serde_json::{Map, Value};

/// One selected item inside a consolidated profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSlot {
    /// Product id of the item
    pub product_id: ProductId,
    /// Price, when the source carried one
    pub price: Option<String>,
    /// Title, when the source carried one
    pub title: Option<String>,
    /// View count, when the source carried one
    pub view_count: Option<u64>,
}

/// A per-identity payload of up to `max_items_per_profile` items
///
/// A profile with zero items is never constructed; the consolidator skips
/// such groups entirely.
#[derive(Debug, Clone)]
pub struct ConsolidatedProfile {
    /// Identity the profile is keyed on
    pub identity: Identity,
    /// Event name carried to the ingestion API
    pub event_name: String,
    /// Epoch-seconds timestamp, when the pipeline stamps one
    pub timestamp: Option<i64>,
    /// Ordered, truncated item selection
    pub items: Vec<ItemSlot>,
    /// Indexed attribute payload (`product_id_0`, `price_0`, ...)
    pub attributes: Map<String, Value>,
}

impl ConsolidatedProfile {
    /// Number of items the profile carries
    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}
