//! Delta computation
//!
//! The delta is the ordered, deduplicated set of primary records whose
//! composite key does not appear in the exclusion key set. Exclusion keys
//! are the union of every key an exclusion row contributes, nested
//! expansion included, so a purchase recorded under a flattened item field
//! still suppresses the matching cart-abandon record.

use crate::core::normalize::RecordNormalizer;
use crate::domain::{CanonicalRecord, CompositeKey, NormalizeError, RawRow};
use std::collections::HashSet;

/// Ordered, deduplicated delta records plus computation counters
#[derive(Debug, Clone, Default)]
pub struct DeltaSet {
    /// Records in original primary-row order, first occurrence per key
    pub records: Vec<CanonicalRecord>,
    /// Counters describing what the computation kept and dropped
    pub stats: DeltaStats,
}

impl DeltaSet {
    /// Number of delta records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no record survived
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate the delta records in order
    pub fn iter(&self) -> impl Iterator<Item = &CanonicalRecord> {
        self.records.iter()
    }

    /// The raw rows backing the delta records, in order
    ///
    /// Used to serialize the delta artifact with the source schema intact.
    pub fn raw_rows(&self) -> Vec<RawRow> {
        self.records.iter().map(|r| r.raw.clone()).collect()
    }
}

/// Counters for one delta computation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeltaStats {
    /// Primary rows received
    pub primary_rows: usize,
    /// Exclusion rows received
    pub exclusion_rows: usize,
    /// Distinct exclusion keys collected
    pub exclusion_keys: usize,
    /// Primary rows dropped for a missing identity
    pub missing_identity: usize,
    /// Primary rows dropped for a missing product id
    pub missing_product_id: usize,
    /// Primary records suppressed by the exclusion set
    pub excluded: usize,
    /// Primary records dropped as later duplicates
    pub duplicates: usize,
}

/// Computes deltas between a primary and an exclusion row collection
#[derive(Debug, Clone, Default)]
pub struct DeltaComputer {
    normalizer: RecordNormalizer,
}

impl DeltaComputer {
    /// Create a new delta computer
    pub fn new() -> Self {
        Self {
            normalizer: RecordNormalizer::new(),
        }
    }

    /// Compute the delta of `primary` against `exclusion`
    ///
    /// Rows that fail normalization on either side are dropped and counted;
    /// they never abort the computation. Order is preserved and duplicates
    /// resolve to the first occurrence. Runs in O(P + X) using hash-set
    /// membership.
    pub fn compute_delta(&self, primary: &[RawRow], exclusion: &[RawRow]) -> DeltaSet {
        let mut stats = DeltaStats {
            primary_rows: primary.len(),
            exclusion_rows: exclusion.len(),
            ..DeltaStats::default()
        };

        let exclusion_keys = self.collect_exclusion_keys(exclusion);
        stats.exclusion_keys = exclusion_keys.len();

        let mut seen: HashSet<CompositeKey> = HashSet::new();
        let mut records = Vec::new();

        for row in primary {
            let record = match self.normalizer.normalize(row) {
                Ok(record) => record,
                Err(NormalizeError::MissingIdentity) => {
                    stats.missing_identity += 1;
                    tracing::debug!("Dropping primary row: missing identity");
                    continue;
                }
                Err(NormalizeError::MissingProductId) => {
                    stats.missing_product_id += 1;
                    tracing::debug!("Dropping primary row: missing product id");
                    continue;
                }
            };

            let key = record.key();
            if exclusion_keys.contains(&key) {
                stats.excluded += 1;
                tracing::debug!(key = %key, "Excluding confirmed combination");
                continue;
            }
            if !seen.insert(key) {
                stats.duplicates += 1;
                continue;
            }
            records.push(record);
        }

        tracing::info!(
            primary_rows = stats.primary_rows,
            exclusion_rows = stats.exclusion_rows,
            exclusion_keys = stats.exclusion_keys,
            excluded = stats.excluded,
            duplicates = stats.duplicates,
            dropped = stats.missing_identity + stats.missing_product_id,
            delta_records = records.len(),
            "Computed delta"
        );

        DeltaSet { records, stats }
    }

    /// Union of every composite key the exclusion rows contribute
    ///
    /// Normalization failures contribute no keys and are otherwise ignored.
    fn collect_exclusion_keys(&self, exclusion: &[RawRow]) -> HashSet<CompositeKey> {
        let mut keys = HashSet::new();
        for row in exclusion {
            if let Ok(record) = self.normalizer.normalize(row) {
                keys.extend(record.composite_keys());
            }
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(identity: &str, product: &str) -> RawRow {
        RawRow::from_pairs([
            ("profile.identity", identity),
            ("eventProps.Product ID", product),
        ])
    }

    #[test]
    fn test_delta_excludes_confirmed_keys() {
        // Scenario: primary [{u1,p1},{u1,p2}], exclusion [{u1,p1}] -> [{u1,p2}]
        let computer = DeltaComputer::new();
        let delta = computer.compute_delta(
            &[row("u1", "p1"), row("u1", "p2")],
            &[row("u1", "p1")],
        );

        assert_eq!(delta.len(), 1);
        assert_eq!(delta.records[0].product_id.as_str(), "p2");
        assert_eq!(delta.stats.excluded, 1);
    }

    #[test]
    fn test_delta_dedups_first_occurrence() {
        // Scenario: duplicate primary rows collapse to exactly one record
        let computer = DeltaComputer::new();
        let first = RawRow::from_pairs([
            ("profile.identity", "u1"),
            ("eventProps.Product ID", "p1"),
            ("eventProps.price", "1.00"),
        ]);
        let second = RawRow::from_pairs([
            ("profile.identity", "u1"),
            ("eventProps.Product ID", "p1"),
            ("eventProps.price", "2.00"),
        ]);

        let delta = computer.compute_delta(&[first, second], &[]);

        assert_eq!(delta.len(), 1);
        assert_eq!(delta.records[0].price.as_deref(), Some("1.00"));
        assert_eq!(delta.stats.duplicates, 1);
    }

    #[test]
    fn test_delta_preserves_primary_order() {
        let computer = DeltaComputer::new();
        let delta = computer.compute_delta(
            &[row("u2", "p9"), row("u1", "p1"), row("u3", "p5")],
            &[],
        );

        let ids: Vec<&str> = delta
            .iter()
            .map(|r| r.identity.as_str())
            .collect();
        assert_eq!(ids, vec!["u2", "u1", "u3"]);
    }

    #[test]
    fn test_exclusion_key_from_alternate_field_name() {
        // The purchase export records the product under a flattened item
        // field; the delta must still suppress it.
        let computer = DeltaComputer::new();
        let exclusion = RawRow::from_pairs([
            ("profile.identity", "u1"),
            ("eventProps.Items|product_id", "p1"),
        ]);

        let delta = computer.compute_delta(&[row("u1", "p1")], &[exclusion]);
        assert!(delta.is_empty());
    }

    #[test]
    fn test_exclusion_nested_expansion_applies() {
        let computer = DeltaComputer::new();
        let exclusion = RawRow::from_pairs([
            ("profile.identity", "u1"),
            ("eventProps.Product ID", "p0"),
            ("eventProps.Items", r#"[{"product_id": "p1"}, {"product_id": "p2"}]"#),
        ]);

        let delta = computer.compute_delta(
            &[row("u1", "p1"), row("u1", "p2"), row("u1", "p3")],
            &[exclusion],
        );

        let kept: Vec<&str> = delta.iter().map(|r| r.product_id.as_str()).collect();
        assert_eq!(kept, vec!["p3"]);
        assert_eq!(delta.stats.excluded, 2);
    }

    #[test]
    fn test_invalid_rows_dropped_not_fatal() {
        let computer = DeltaComputer::new();
        let no_identity = RawRow::from_pairs([("eventProps.Product ID", "p1")]);
        let no_product = RawRow::from_pairs([("profile.identity", "u1")]);

        let delta = computer.compute_delta(&[no_identity, no_product, row("u2", "p2")], &[]);

        assert_eq!(delta.len(), 1);
        assert_eq!(delta.stats.missing_identity, 1);
        assert_eq!(delta.stats.missing_product_id, 1);
    }

    #[test]
    fn test_invalid_exclusion_rows_contribute_no_keys() {
        let computer = DeltaComputer::new();
        let invalid = RawRow::from_pairs([("eventProps.Product ID", "p1")]);

        let delta = computer.compute_delta(&[row("u1", "p1")], &[invalid]);
        assert_eq!(delta.len(), 1);
        assert_eq!(delta.stats.exclusion_keys, 0);
    }

    #[test]
    fn test_empty_inputs_yield_empty_delta() {
        let computer = DeltaComputer::new();
        let delta = computer.compute_delta(&[], &[]);
        assert!(delta.is_empty());
        assert_eq!(delta.stats, DeltaStats::default());
    }

    #[test]
    fn test_delta_soundness_and_completeness() {
        // Soundness: no delta key is in the exclusion set. Completeness:
        // every non-excluded, non-duplicate primary key appears exactly once.
        let computer = DeltaComputer::new();
        let primary: Vec<RawRow> = (0..20)
            .map(|i| row(&format!("u{}", i % 5), &format!("p{}", i % 7)))
            .collect();
        let exclusion: Vec<RawRow> = (0..3).map(|i| row(&format!("u{i}"), &format!("p{i}"))).collect();

        let delta = computer.compute_delta(&primary, &exclusion);

        let exclusion_keys = computer.collect_exclusion_keys(&exclusion);
        let mut seen = std::collections::HashSet::new();
        for record in delta.iter() {
            assert!(!exclusion_keys.contains(&record.key()), "soundness violated");
            assert!(seen.insert(record.key()), "duplicate key in delta");
        }

        let normalizer = RecordNormalizer::new();
        let expected: std::collections::HashSet<_> = primary
            .iter()
            .filter_map(|r| normalizer.normalize(r).ok())
            .map(|r| r.key())
            .filter(|k| !exclusion_keys.contains(k))
            .collect();
        assert_eq!(seen, expected, "completeness violated");
    }
}
