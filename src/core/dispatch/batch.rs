//! Batch partitioning and dispatch accounting
//!
//! Profiles are partitioned into contiguous, size-bounded batches before
//! dispatch, and every batch settles into the aggregate [`DispatchResult`].

use crate::domain::ConsolidatedProfile;
use std::time::Duration;

/// Configuration for a dispatch run
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Maximum profiles per request (default 500)
    pub batch_size: usize,
    /// Batches sent concurrently per wave (default 5)
    pub concurrency_limit: usize,
    /// Attempts per batch before recording a failure (default 3)
    pub max_retries: usize,
    /// Base backoff delay; attempt n waits `base_delay * n` (default 1s)
    pub base_delay: Duration,
}

impl DispatchConfig {
    /// Create a new dispatch configuration
    ///
    /// Zero values are clamped to 1 so a misconfigured run still makes
    /// progress.
    pub fn new(
        batch_size: usize,
        concurrency_limit: usize,
        max_retries: usize,
        base_delay: Duration,
    ) -> Self {
        Self {
            batch_size: batch_size.max(1),
            concurrency_limit: concurrency_limit.max(1),
            max_retries: max_retries.max(1),
            base_delay,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 500,
            concurrency_limit: 5,
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

/// Partition profiles into contiguous batches of at most `batch_size`
///
/// Order is preserved: batch k holds profiles `[k*size, (k+1)*size)`.
pub fn partition_batches(
    profiles: Vec<ConsolidatedProfile>,
    batch_size: usize,
) -> Vec<Vec<ConsolidatedProfile>> {
    let batch_size = batch_size.max(1);
    let mut batches = Vec::with_capacity(profiles.len().div_ceil(batch_size));
    let mut current = Vec::with_capacity(batch_size.min(profiles.len()));

    for profile in profiles {
        current.push(profile);
        if current.len() == batch_size {
            batches.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

/// A batch-level failure descriptor
#[derive(Debug, Clone)]
pub struct DispatchError {
    /// Zero-based index of the batch within the run
    pub batch_index: usize,
    /// Number of profiles the batch carried
    pub profile_count: usize,
    /// Final error message after retries were exhausted
    pub message: String,
}

/// Aggregate accounting for one dispatch run
///
/// `success_count + failed_count` always equals the number of profiles
/// submitted; a batch is never partially counted.
#[derive(Debug, Clone, Default)]
pub struct DispatchResult {
    /// Profiles delivered in batches that settled successfully
    pub success_count: usize,
    /// Profiles in batches that exhausted their retries
    pub failed_count: usize,
    /// One descriptor per failed batch
    pub errors: Vec<DispatchError>,
}

impl DispatchResult {
    /// Create a new empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a settled batch of `profile_count` profiles
    pub fn record_success(&mut self, profile_count: usize) {
        self.success_count += profile_count;
    }

    /// Record a failed batch of `profile_count` profiles
    pub fn record_failure(&mut self, batch_index: usize, profile_count: usize, message: String) {
        self.failed_count += profile_count;
        self.errors.push(DispatchError {
            batch_index,
            profile_count,
            message,
        });
    }

    /// Total profiles accounted for
    pub fn total(&self) -> usize {
        self.success_count + self.failed_count
    }

    /// True when every batch settled successfully
    pub fn is_complete_success(&self) -> bool {
        self.failed_count == 0 && self.errors.is_empty()
    }

    /// Merge another result into this one
    pub fn merge(&mut self, other: DispatchResult) {
        self.success_count += other.success_count;
        self.failed_count += other.failed_count;
        self.errors.extend(other.errors);
    }
}
