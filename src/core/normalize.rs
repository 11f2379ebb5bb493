//! Row normalization
//!
//! Raw export rows arrive with inconsistent schemas: the same logical
//! attribute shows up under different field names depending on which event
//! type produced the export. This module resolves a canonical record from a
//! raw row using fixed, ordered candidate-field tables, evaluated
//! first-match-wins. The tables are data, not code, so the fallback policy
//! is testable in isolation and applied identically on the primary and
//! exclusion sides of the delta computation.

use crate::domain::{CanonicalRecord, Identity, NormalizeError, ProductId, RawRow};

/// The single field identities are read from
pub const IDENTITY_FIELD: &str = "profile.identity";

/// Product-id candidates, evaluated in order
pub const PRODUCT_ID_FIELDS: &[&str] = &[
    "eventProps.Product ID",
    "eventProps.product_id",
    "eventProps.Items|product_id",
    "eventProps.Items|product id",
];

/// Price candidates, evaluated in order
pub const PRICE_FIELDS: &[&str] = &[
    "eventProps.price",
    "eventProps.Price",
    "eventProps.Items|price",
    "eventProps.Items|unit_price",
];

/// Title candidates, evaluated in order
pub const TITLE_FIELDS: &[&str] = &[
    "eventProps.item_name",
    "eventProps.Items|item_name",
    "eventProps.Items|title",
    "eventProps.Items|item_title",
    "eventProps.Title",
    "eventProps.title",
];

/// Image URL candidates, evaluated in order
pub const IMAGE_URL_FIELDS: &[&str] = &[
    "eventProps.image_url",
    "eventProps.Image_url",
    "eventProps.Image Url",
    "eventProps.Items|image_url",
    "eventProps.Items|img_url",
];

/// View-count field, written by the view aggregator
pub const VIEW_COUNT_FIELD: &str = "eventProps.view_count";

/// Field that may hold a serialized list of sub-items
pub const NESTED_ITEMS_FIELD: &str = "eventProps.Items";

/// Sub-item keys that may carry a product identifier, evaluated in order
const NESTED_PRODUCT_ID_KEYS: &[&str] = &["product_id", "product id", "id"];

/// Resolves canonical records from raw rows
///
/// Stateless by design: the candidate tables are fixed so the same row
/// shape resolves to the same canonical form no matter which side of the
/// delta it appears on.
#[derive(Debug, Clone, Default)]
pub struct RecordNormalizer;

impl RecordNormalizer {
    /// Create a new normalizer
    pub fn new() -> Self {
        Self
    }

    /// Normalize a raw row into a canonical record
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::MissingIdentity`] when the identity field
    /// is absent or empty after trimming, and
    /// [`NormalizeError::MissingProductId`] when no product-id candidate
    /// resolves and the nested item list contributes nothing.
    pub fn normalize(&self, row: &RawRow) -> Result<CanonicalRecord, NormalizeError> {
        let identity = row
            .get_non_empty(IDENTITY_FIELD)
            .and_then(|v| Identity::new(v).ok())
            .ok_or(NormalizeError::MissingIdentity)?;

        let nested_ids = self.expand_nested_items(row);

        // First non-empty simple candidate wins; when none resolves, the
        // first nested item id stands in as the primary.
        let product_id = first_non_empty(row, PRODUCT_ID_FIELDS)
            .and_then(|v| ProductId::new(v).ok())
            .or_else(|| nested_ids.first().cloned())
            .ok_or(NormalizeError::MissingProductId)?;

        let view_count = row
            .get_non_empty(VIEW_COUNT_FIELD)
            .and_then(|v| v.parse::<u64>().ok());

        Ok(CanonicalRecord {
            identity,
            product_id,
            price: first_non_empty(row, PRICE_FIELDS).map(str::to_string),
            title: first_non_empty(row, TITLE_FIELDS).map(str::to_string),
            image_url: first_non_empty(row, IMAGE_URL_FIELDS).map(str::to_string),
            view_count,
            nested_ids,
            raw: row.clone(),
        })
    }

    /// Expand the serialized sub-item list into product ids
    ///
    /// Malformed JSON is a non-fatal per-row condition: the field's
    /// contribution is dropped and the row is otherwise processed.
    fn expand_nested_items(&self, row: &RawRow) -> Vec<ProductId> {
        let Some(serialized) = row.get_non_empty(NESTED_ITEMS_FIELD) else {
            return Vec::new();
        };

        let items: Vec<serde_json::Value> = match serde_json::from_str(serialized) {
            Ok(serde_json::Value::Array(items)) => items,
            Ok(_) => {
                tracing::warn!(
                    field = NESTED_ITEMS_FIELD,
                    "Nested item field is valid JSON but not an array, skipping"
                );
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(
                    field = NESTED_ITEMS_FIELD,
                    error = %e,
                    "Failed to parse nested item field, skipping"
                );
                return Vec::new();
            }
        };

        items
            .iter()
            .filter_map(|item| {
                let obj = item.as_object()?;
                NESTED_PRODUCT_ID_KEYS
                    .iter()
                    .filter_map(|key| obj.get(*key))
                    .filter_map(value_as_trimmed_string)
                    .find_map(|v| ProductId::new(v).ok())
            })
            .collect()
    }
}

/// First candidate field that holds a non-empty trimmed value
fn first_non_empty<'a>(row: &'a RawRow, candidates: &[&str]) -> Option<&'a str> {
    candidates
        .iter()
        .find_map(|field| row.get_non_empty(field))
}

/// String form of a JSON scalar, trimmed; None for empty or non-scalar
fn value_as_trimmed_string(value: &serde_json::Value) -> Option<String> {
    let s = match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
