//! Product-view aggregation
//!
//! Product-view exports carry one row per view. Before the delta is
//! computed, repeated views collapse into one row per identity+product
//! combination with an occurrence count, and combinations below the
//! configured minimum are dropped. The first-seen row is retained so the
//! output keeps the source schema and first-seen order.

use crate::core::normalize::{RecordNormalizer, VIEW_COUNT_FIELD};
use crate::domain::{CompositeKey, RawRow};
use std::collections::HashMap;

/// Collapses repeated product-view rows into counted combinations
#[derive(Debug, Clone, Default)]
pub struct ViewAggregator {
    normalizer: RecordNormalizer,
}

impl ViewAggregator {
    /// Create a new view aggregator
    pub fn new() -> Self {
        Self {
            normalizer: RecordNormalizer::new(),
        }
    }

    /// Aggregate view rows into one row per combination with a
    /// `eventProps.view_count` field appended
    ///
    /// Combinations with fewer than `min_view_count` occurrences are
    /// dropped. Rows failing normalization are skipped. Output order is the
    /// first-seen order of each combination.
    pub fn aggregate(&self, rows: &[RawRow], min_view_count: u64) -> Vec<RawRow> {
        let mut order: Vec<CompositeKey> = Vec::new();
        let mut groups: HashMap<CompositeKey, (RawRow, u64)> = HashMap::new();
        let mut skipped = 0usize;

        for row in rows {
            let record = match self.normalizer.normalize(row) {
                Ok(record) => record,
                Err(_) => {
                    skipped += 1;
                    continue;
                }
            };

            let key = record.key();
            match groups.get_mut(&key) {
                Some((_, count)) => *count += 1,
                None => {
                    order.push(key.clone());
                    groups.insert(key, (row.clone(), 1));
                }
            }
        }

        let combinations = order.len();
        let aggregated: Vec<RawRow> = order
            .into_iter()
            .filter_map(|key| {
                let (row, count) = groups.remove(&key)?;
                if count < min_view_count {
                    return None;
                }
                Some(row.with_field(VIEW_COUNT_FIELD, count.to_string()))
            })
            .collect();

        tracing::info!(
            rows = rows.len(),
            combinations,
            skipped,
            min_view_count,
            kept = aggregated.len(),
            "Aggregated product views"
        );

        aggregated
    }
}
