//! Wave-based batch dispatcher
//!
//! Batches are sent in waves of `concurrency_limit`; a wave must fully
//! settle before the next one starts. Within a batch, failures retry the
//! whole request with linear backoff until the attempt limit is reached.
//! Accounting is reduced at each wave barrier, so no accumulator is shared
//! across concurrent tasks.

use crate::adapters::ingestion::{EventSink, UploadPayload};
use crate::core::dispatch::batch::{partition_batches, DispatchConfig, DispatchResult};
use crate::domain::{ConsolidatedProfile, IngestError};
use std::sync::Arc;
use tokio::time::sleep;

/// Outcome of one batch after retries settled
struct BatchOutcome {
    batch_index: usize,
    profile_count: usize,
    result: Result<(), IngestError>,
}

/// Dispatches consolidated profiles to an event sink in bounded batches
pub struct BatchDispatcher {
    sink: Arc<dyn EventSink>,
    config: DispatchConfig,
}

impl BatchDispatcher {
    /// Create a new dispatcher over an event sink
    pub fn new(sink: Arc<dyn EventSink>, config: DispatchConfig) -> Self {
        Self { sink, config }
    }

    /// Dispatch every profile, returning the aggregate accounting
    ///
    /// Empty input returns `{0, 0, []}` without touching the network.
    /// Delivery is at-least-once: a batch that failed mid-flight may have
    /// reached the sink before its retry, and downstream must treat
    /// identity-keyed payloads as an upsert.
    pub async fn dispatch(&self, profiles: Vec<ConsolidatedProfile>) -> DispatchResult {
        let total = profiles.len();
        let mut result = DispatchResult::new();

        if total == 0 {
            tracing::info!("No profiles to dispatch");
            return result;
        }

        let batches = partition_batches(profiles, self.config.batch_size);
        tracing::info!(
            profiles = total,
            batches = batches.len(),
            batch_size = self.config.batch_size,
            concurrency_limit = self.config.concurrency_limit,
            "Dispatching profiles"
        );

        let mut next_batch_index = 0usize;
        for wave in batches.chunks(self.config.concurrency_limit) {
            let tasks = wave.iter().enumerate().map(|(offset, batch)| {
                self.send_batch_with_retry(next_batch_index + offset, batch)
            });

            // Wave barrier: every task settles before the next wave starts,
            // and the accounting below runs on the settled outcomes only.
            let outcomes = futures::future::join_all(tasks).await;

            for outcome in outcomes {
                match outcome.result {
                    Ok(()) => result.record_success(outcome.profile_count),
                    Err(e) => {
                        tracing::error!(
                            batch_index = outcome.batch_index,
                            profiles = outcome.profile_count,
                            error = %e,
                            "Batch failed after exhausting retries"
                        );
                        result.record_failure(
                            outcome.batch_index,
                            outcome.profile_count,
                            e.to_string(),
                        );
                    }
                }
            }
            next_batch_index += wave.len();
        }

        debug_assert_eq!(result.total(), total);
        tracing::info!(
            successful = result.success_count,
            failed = result.failed_count,
            "Dispatch completed"
        );
        result
    }

    /// Send one batch, retrying the entire request on any failure
    ///
    /// Attempt n (1-based) waits `base_delay * n` after failing, up to
    /// `max_retries` attempts.
    async fn send_batch_with_retry(
        &self,
        batch_index: usize,
        batch: &[ConsolidatedProfile],
    ) -> BatchOutcome {
        let payload = UploadPayload::from_profiles(batch);
        let max_retries = self.config.max_retries;
        let mut attempt = 1;

        let result = loop {
            tracing::debug!(
                batch_index,
                profiles = batch.len(),
                attempt,
                "Sending batch"
            );

            match self.sink.send(&payload).await {
                Ok(()) => break Ok(()),
                Err(e) => {
                    if attempt >= max_retries {
                        break Err(e);
                    }
                    let delay = self.config.base_delay * attempt as u32;
                    tracing::warn!(
                        batch_index,
                        attempt,
                        max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Batch send failed, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        };

        BatchOutcome {
            batch_index,
            profile_count: batch.len(),
            result,
        }
    }
}
