//! Event record types
//!
//! This module provides the row and record types flowing through the
//! pipeline, plus the newtype identifiers used for set-membership tests.
//! The newtype pattern keeps identities and product ids from being mixed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User identity newtype wrapper
///
/// Represents the identity a profile is keyed on downstream. Always
/// non-empty and trimmed.
///
/// # Examples
///
/// ```
/// use courier::domain::record::Identity;
/// use std::str::FromStr;
///
/// let identity = Identity::from_str("  user-1001 ").unwrap();
/// assert_eq!(identity.as_str(), "user-1001");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity(String);

impl Identity {
    /// Creates a new Identity, trimming surrounding whitespace
    ///
    /// # Errors
    ///
    /// Returns an error if the value is empty after trimming.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err("identity cannot be empty".to_string());
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the identity as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Identity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Product identifier newtype wrapper
///
/// Always non-empty and trimmed, regardless of which source field
/// populated it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a new ProductId, trimming surrounding whitespace
    ///
    /// # Errors
    ///
    /// Returns an error if the value is empty after trimming.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err("product id cannot be empty".to_string());
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the product id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProductId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Composite membership key: identity plus product id
///
/// Equal identity+product pairs always compare and hash equal, no matter
/// which raw field name populated either half.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeKey {
    /// The user identity half of the key
    pub identity: Identity,
    /// The product half of the key
    pub product_id: ProductId,
}

impl CompositeKey {
    /// Creates a new composite key
    pub fn new(identity: Identity, product_id: ProductId) -> Self {
        Self {
            identity,
            product_id,
        }
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.identity, self.product_id)
    }
}

/// A raw CSV row: field name to string value, field order preserved
///
/// The schema is open and inconsistent across sources; lookups fall back
/// across candidate field names in the normalizer. Field order is kept so
/// delta artifacts reproduce the source header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    fields: Vec<(String, String)>,
}

impl RawRow {
    /// Creates an empty row
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Builds a row from (name, value) pairs, preserving order
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns the value of a field, if present
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the trimmed value of a field if it is non-empty after trimming
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Sets a field value, replacing an existing field of the same name or
    /// appending a new one at the end
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Returns a copy of this row with an extra field appended
    pub fn with_field(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut row = self.clone();
        row.set(name, value);
        row
    }

    /// Iterates field names in their original order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// Iterates (name, value) pairs in their original order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of fields in the row
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the row has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A normalized event record
///
/// Constructible only when both identity and product id resolved to
/// non-empty values; rows that can't produce one are dropped upstream.
/// `nested_ids` carries product ids expanded from a serialized item list,
/// used for exclusion-key contributions.
#[derive(Debug, Clone)]
pub struct CanonicalRecord {
    /// Resolved user identity
    pub identity: Identity,
    /// Resolved primary product id
    pub product_id: ProductId,
    /// Price, when any candidate field carried one
    pub price: Option<String>,
    /// Product title, when any candidate field carried one
    pub title: Option<String>,
    /// Image URL, when any candidate field carried one
    pub image_url: Option<String>,
    /// View count, when present and parseable
    pub view_count: Option<u64>,
    /// Additional product ids expanded from the nested item list
    pub nested_ids: Vec<ProductId>,
    /// The originating raw row
    pub raw: RawRow,
}

impl CanonicalRecord {
    /// The record's primary composite key
    pub fn key(&self) -> CompositeKey {
        CompositeKey::new(self.identity.clone(), self.product_id.clone())
    }

    /// Every composite key this record contributes: the primary key first,
    /// then one per nested product id, deduplicated in order
    pub fn composite_keys(&self) -> Vec<CompositeKey> {
        let mut keys = vec![self.key()];
        for nested in &self.nested_ids {
            let key = CompositeKey::new(self.identity.clone(), nested.clone());
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}
