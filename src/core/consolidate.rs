//! Profile consolidation
//!
//! Groups delta records by identity, orders each group under a configured
//! policy, truncates to a bounded item count, and builds the indexed
//! attribute payload the ingestion API expects.

use crate::core::delta::DeltaSet;
use crate::domain::{CanonicalRecord, ConsolidatedProfile, Identity, ItemSlot};
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::str::FromStr;

/// Ordering applied to a group's item list before truncation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderMode {
    /// Keep the group's insertion order
    #[default]
    InsertionOrder,
    /// Reverse the group, so the latest-appended item comes first
    ReverseInsertion,
    /// Sort by view count descending; ties keep original relative order
    ViewCountDescending,
}

impl FromStr for OrderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "insertion" | "insertion_order" => Ok(OrderMode::InsertionOrder),
            "reverse" | "reverse_insertion" => Ok(OrderMode::ReverseInsertion),
            "view_count" | "view_count_descending" => Ok(OrderMode::ViewCountDescending),
            _ => Err(format!(
                "Invalid order mode '{s}'. Must be one of: insertion_order, reverse_insertion, view_count_descending"
            )),
        }
    }
}

/// Configuration for one consolidation pass
#[derive(Debug, Clone)]
pub struct ConsolidateConfig {
    /// Maximum items kept per profile (>= 1)
    pub max_items_per_profile: usize,
    /// Ordering policy applied before truncation
    pub order_mode: OrderMode,
    /// Event name carried on every profile
    pub event_name: String,
    /// Stamp profiles with the consolidation time (epoch seconds)
    pub stamp_timestamp: bool,
}

impl ConsolidateConfig {
    /// Create a new consolidation configuration
    pub fn new(
        max_items_per_profile: usize,
        order_mode: OrderMode,
        event_name: impl Into<String>,
        stamp_timestamp: bool,
    ) -> Self {
        Self {
            max_items_per_profile: max_items_per_profile.max(1),
            order_mode,
            event_name: event_name.into(),
            stamp_timestamp,
        }
    }
}

/// Groups delta records into bounded per-identity profiles
#[derive(Debug, Clone, Default)]
pub struct ProfileConsolidator;

impl ProfileConsolidator {
    /// Create a new consolidator
    pub fn new() -> Self {
        Self
    }

    /// Consolidate a delta into per-identity profiles
    ///
    /// Groups preserve first-seen identity order. Each group is ordered per
    /// `config.order_mode`, truncated to `config.max_items_per_profile`,
    /// and rendered into indexed attributes. Groups that end up with zero
    /// items never produce a profile.
    pub fn consolidate(
        &self,
        delta: &DeltaSet,
        config: &ConsolidateConfig,
    ) -> Vec<ConsolidatedProfile> {
        let mut order: Vec<Identity> = Vec::new();
        let mut groups: HashMap<Identity, Vec<ItemSlot>> = HashMap::new();

        for record in delta.iter() {
            let slot = item_slot(record);
            match groups.get_mut(&record.identity) {
                Some(items) => items.push(slot),
                None => {
                    order.push(record.identity.clone());
                    groups.insert(record.identity.clone(), vec![slot]);
                }
            }
        }

        let timestamp = config.stamp_timestamp.then(|| Utc::now().timestamp());

        let profiles: Vec<ConsolidatedProfile> = order
            .into_iter()
            .filter_map(|identity| {
                let mut items = groups.remove(&identity)?;
                if items.is_empty() {
                    return None;
                }

                match config.order_mode {
                    OrderMode::InsertionOrder => {}
                    OrderMode::ReverseInsertion => items.reverse(),
                    OrderMode::ViewCountDescending => {
                        // sort_by is stable, so ties keep their relative order
                        items.sort_by(|a, b| {
                            b.view_count.unwrap_or(0).cmp(&a.view_count.unwrap_or(0))
                        });
                    }
                }

                if items.len() > config.max_items_per_profile {
                    tracing::debug!(
                        identity = %identity,
                        items = items.len(),
                        limit = config.max_items_per_profile,
                        "Truncating profile items"
                    );
                    items.truncate(config.max_items_per_profile);
                }

                let attributes = indexed_attributes(&items, config.order_mode);

                Some(ConsolidatedProfile {
                    identity,
                    event_name: config.event_name.clone(),
                    timestamp,
                    items,
                    attributes,
                })
            })
            .collect();

        tracing::info!(
            delta_records = delta.len(),
            profiles = profiles.len(),
            order_mode = ?config.order_mode,
            "Consolidated delta into profiles"
        );

        profiles
    }
}

/// Project a canonical record into an item slot
fn item_slot(record: &CanonicalRecord) -> ItemSlot {
    ItemSlot {
        product_id: record.product_id.clone(),
        price: record.price.clone(),
        title: record.title.clone(),
        view_count: record.view_count,
    }
}

/// Indexed attribute payload for an ordered item list
///
/// Unset optionals stay absent; nothing is empty-string padded. View counts
/// are emitted only under the view-count ordering.
fn indexed_attributes(items: &[ItemSlot], order_mode: OrderMode) -> Map<String, Value> {
    let mut attributes = Map::new();
    for (i, item) in items.iter().enumerate() {
        attributes.insert(
            format!("product_id_{i}"),
            Value::String(item.product_id.as_str().to_string()),
        );
        if let Some(price) = &item.price {
            attributes.insert(format!("price_{i}"), Value::String(price.clone()));
        }
        if let Some(title) = &item.title {
            attributes.insert(format!("title_{i}"), Value::String(title.clone()));
        }
        if order_mode == OrderMode::ViewCountDescending {
            if let Some(count) = item.view_count {
                attributes.insert(format!("view_count_{i}"), Value::Number(count.into()));
            }
        }
    }
    attributes
}
