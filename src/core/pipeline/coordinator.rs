//! Pipeline coordinator - main orchestrator for a run
//!
//! A run executes one or more jobs: the delta jobs read event exports from
//! object storage, compute the delta, and upload an artifact; the dispatch
//! jobs read back the latest artifact, consolidate it into profiles, and
//! push them to the ingestion API.

use crate::adapters::ingestion::{EventSink, HttpIngestClient};
use crate::adapters::storage::csv as csv_codec;
use crate::adapters::storage::{ObjectInfo, ObjectStore, S3ObjectStore};
use crate::config::CourierConfig;
use crate::core::consolidate::{ConsolidateConfig, ProfileConsolidator};
use crate::core::delta::DeltaComputer;
use crate::core::dispatch::BatchDispatcher;
use crate::core::pipeline::summary::{JobKind, JobSummary, RunSummary};
use crate::core::views::ViewAggregator;
use crate::domain::{CourierError, RawRow, Result};
use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use std::sync::Arc;
use std::time::Instant;

/// Artifact key prefix for the cart-abandon delta
pub const CART_DELTA_PREFIX: &str = "delta_";

/// Artifact key prefix for the most-viewed delta
pub const MOST_VIEWED_DELTA_PREFIX: &str = "most_viewed_delta_";

/// Pipeline coordinator
pub struct PipelineCoordinator {
    config: CourierConfig,
    store: Arc<dyn ObjectStore>,
    sink: Arc<dyn EventSink>,
    delta_computer: DeltaComputer,
    view_aggregator: ViewAggregator,
    consolidator: ProfileConsolidator,
    dry_run: bool,
}

impl PipelineCoordinator {
    /// Create a coordinator with production adapters
    ///
    /// # Errors
    ///
    /// Returns an error when the ingestion client cannot be constructed.
    pub async fn new(config: CourierConfig) -> Result<Self> {
        let store: Arc<dyn ObjectStore> =
            Arc::new(S3ObjectStore::new(&config.storage.region).await);
        let sink: Arc<dyn EventSink> = Arc::new(HttpIngestClient::new(config.ingestion.clone())?);
        Ok(Self::with_components(config, store, sink))
    }

    /// Create a coordinator over explicit adapter implementations
    ///
    /// Used by tests to substitute an in-memory store and a scripted sink.
    pub fn with_components(
        config: CourierConfig,
        store: Arc<dyn ObjectStore>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let dry_run = config.application.dry_run;
        Self {
            config,
            store,
            sink,
            delta_computer: DeltaComputer::new(),
            view_aggregator: ViewAggregator::new(),
            consolidator: ProfileConsolidator::new(),
            dry_run,
        }
    }

    /// Execute the given jobs in order and collect a run summary
    ///
    /// A job that fails aborts the run: storage failures mean the delta
    /// would under-report, so nothing after it executes either.
    pub async fn execute_run(&self, jobs: &[JobKind]) -> Result<RunSummary> {
        let start = Instant::now();
        let mut summary = RunSummary::new();

        tracing::info!(run_id = %summary.run_id, jobs = jobs.len(), "Starting run");

        for job in jobs {
            let job_summary = self.run_job(*job).await?;
            summary.add_job(job_summary);
        }

        let summary = summary.with_duration(start.elapsed());
        summary.log_summary();
        Ok(summary)
    }

    /// Execute a single job
    pub async fn run_job(&self, job: JobKind) -> Result<JobSummary> {
        let start = Instant::now();
        tracing::info!(job = %job, dry_run = self.dry_run, "Starting job");

        let mut summary = match job {
            JobKind::CartAbandonDelta => self.run_cart_abandon_delta().await?,
            JobKind::CartAbandonDispatch => {
                let cfg = &self.config.pipeline.cart_abandon;
                let consolidate = ConsolidateConfig::new(
                    cfg.max_items_per_profile,
                    cfg.order_mode().map_err(CourierError::Configuration)?,
                    cfg.event_name.clone(),
                    false,
                );
                self.run_dispatch(job, CART_DELTA_PREFIX, consolidate)
                    .await?
            }
            JobKind::MostViewedDelta => self.run_most_viewed_delta().await?,
            JobKind::MostViewedDispatch => {
                let cfg = &self.config.pipeline.most_viewed;
                let consolidate = ConsolidateConfig::new(
                    cfg.max_items_per_profile,
                    cfg.order_mode().map_err(CourierError::Configuration)?,
                    cfg.event_name.clone(),
                    true,
                );
                self.run_dispatch(job, MOST_VIEWED_DELTA_PREFIX, consolidate)
                    .await?
            }
        };

        summary.duration = start.elapsed();
        tracing::info!(
            job = %job,
            duration_ms = summary.duration.as_millis() as u64,
            "Job completed"
        );
        Ok(summary)
    }

    /// Compute the cart-abandon delta and upload its artifact
    async fn run_cart_abandon_delta(&self) -> Result<JobSummary> {
        let mut summary = JobSummary::new(JobKind::CartAbandonDelta);
        let lookback = self.config.pipeline.cart_abandon.lookback_days;

        let primary = self
            .fetch_export_rows(&self.config.storage.cart_abandon_bucket, lookback)
            .await?;
        let exclusion = self
            .fetch_export_rows(&self.config.storage.charged_events_bucket, lookback)
            .await?;
        summary.rows_read = primary.len();
        summary.exclusion_rows_read = exclusion.len();

        let delta = self.delta_computer.compute_delta(&primary, &exclusion);
        summary.delta_records = delta.len();

        if delta.is_empty() {
            tracing::info!("No cart-abandon delta to upload");
            return Ok(summary);
        }

        summary.artifact_key = self
            .upload_artifact(&delta.raw_rows(), CART_DELTA_PREFIX)
            .await?;
        Ok(summary)
    }

    /// Aggregate product views, compute the delta, and upload its artifact
    async fn run_most_viewed_delta(&self) -> Result<JobSummary> {
        let mut summary = JobSummary::new(JobKind::MostViewedDelta);
        let cfg = &self.config.pipeline.most_viewed;

        let views = self
            .fetch_export_rows(&self.config.storage.product_view_bucket, cfg.lookback_days)
            .await?;
        let exclusion = self
            .fetch_export_rows(&self.config.storage.charged_events_bucket, cfg.lookback_days)
            .await?;
        summary.rows_read = views.len();
        summary.exclusion_rows_read = exclusion.len();

        let aggregated = self.view_aggregator.aggregate(&views, cfg.min_view_count);
        let delta = self.delta_computer.compute_delta(&aggregated, &exclusion);
        summary.delta_records = delta.len();

        if delta.is_empty() {
            tracing::info!("No most-viewed delta to upload");
            return Ok(summary);
        }

        summary.artifact_key = self
            .upload_artifact(&delta.raw_rows(), MOST_VIEWED_DELTA_PREFIX)
            .await?;
        Ok(summary)
    }

    /// Read back the latest delta artifact, consolidate, and dispatch
    async fn run_dispatch(
        &self,
        job: JobKind,
        prefix: &str,
        consolidate: ConsolidateConfig,
    ) -> Result<JobSummary> {
        let mut summary = JobSummary::new(job);

        let (rows, artifact_key) = self.fetch_latest_artifact_rows(prefix).await?;
        summary.rows_read = rows.len();
        summary.artifact_key = artifact_key;

        if rows.is_empty() {
            tracing::info!(job = %job, "No delta artifact found for today, nothing to dispatch");
            return Ok(summary);
        }

        // The artifact is already deduplicated, but rows are re-normalized
        // here so hand-edited or stale artifacts still obey the invariants.
        let delta = self.delta_computer.compute_delta(&rows, &[]);
        let profiles = self.consolidator.consolidate(&delta, &consolidate);
        summary.delta_records = delta.len();
        summary.profiles = profiles.len();

        if self.dry_run {
            tracing::info!(
                job = %job,
                profiles = profiles.len(),
                "Dry run: skipping dispatch"
            );
            return Ok(summary);
        }

        let dispatcher =
            BatchDispatcher::new(self.sink.clone(), self.config.dispatch.to_dispatch_config());
        summary.dispatch = Some(dispatcher.dispatch(profiles).await);
        Ok(summary)
    }

    /// Fetch every export row for the lookback window from a bucket
    ///
    /// Export objects are selected by key: `-<yyyymmdd>-` with a `.csv.gz`
    /// suffix, one date per lookback day. Missing days are not an error.
    async fn fetch_export_rows(&self, bucket: &str, lookback_days: u32) -> Result<Vec<RawRow>> {
        let objects = self.store.list(bucket).await?;
        let dates = lookback_dates(lookback_days);
        let matching: Vec<&ObjectInfo> = objects
            .iter()
            .filter(|obj| matches_export_window(&obj.key, &dates))
            .collect();

        if matching.is_empty() {
            tracing::warn!(bucket, dates = ?dates, "No export objects found for window");
            return Ok(Vec::new());
        }

        tracing::info!(bucket, files = matching.len(), "Fetching export objects");

        let mut rows = Vec::new();
        for object in matching {
            let bytes = self.store.get(bucket, &object.key).await?;
            let parsed = csv_codec::parse_rows(&bytes, &object.key)?;
            tracing::debug!(key = %object.key, rows = parsed.len(), "Parsed export object");
            rows.extend(parsed);
        }

        tracing::info!(bucket, rows = rows.len(), "Fetched export rows");
        Ok(rows)
    }

    /// Fetch the latest delta artifact written today under a prefix
    ///
    /// Returns no rows when no artifact exists; the dispatch job then has
    /// nothing to do, which is not an error.
    async fn fetch_latest_artifact_rows(
        &self,
        prefix: &str,
    ) -> Result<(Vec<RawRow>, Option<String>)> {
        let bucket = &self.config.storage.delta_bucket;
        let objects = self.store.list(bucket).await?;
        let today = Utc::now().format("%Y-%m-%d").to_string();

        let mut candidates: Vec<&ObjectInfo> = objects
            .iter()
            .filter(|obj| is_todays_artifact(&obj.key, prefix, &today))
            .collect();
        candidates.sort_by_key(|obj| std::cmp::Reverse(obj.last_modified));

        let Some(latest) = candidates.first() else {
            return Ok((Vec::new(), None));
        };

        tracing::info!(key = %latest.key, "Reading latest delta artifact");
        let bytes = self.store.get(bucket, &latest.key).await?;
        let rows = csv_codec::parse_rows(&bytes, &latest.key)?;
        Ok((rows, Some(latest.key.clone())))
    }

    /// Serialize rows and upload them as a timestamped artifact
    ///
    /// Returns the artifact key, or `None` in dry-run mode.
    async fn upload_artifact(&self, rows: &[RawRow], prefix: &str) -> Result<Option<String>> {
        let key = format!("{prefix}{}.csv", artifact_timestamp());
        let content = csv_codec::write_rows(rows)?;

        if self.dry_run {
            tracing::info!(key = %key, rows = rows.len(), "Dry run: skipping artifact upload");
            return Ok(None);
        }

        self.store
            .put(
                &self.config.storage.delta_bucket,
                &key,
                content.into_bytes(),
                "text/csv",
            )
            .await?;

        tracing::info!(key = %key, rows = rows.len(), "Uploaded delta artifact");
        Ok(Some(key))
    }
}

/// Dates of the lookback window as `yyyymmdd` strings, today first
fn lookback_dates(lookback_days: u32) -> Vec<String> {
    let today = Utc::now();
    (0..lookback_days.max(1))
        .map(|i| {
            (today - ChronoDuration::days(i64::from(i)))
                .format("%Y%m%d")
                .to_string()
        })
        .collect()
}

/// True when an export key falls inside the date window
///
/// Export keys embed their date as `-<yyyymmdd>-` and end with `.csv.gz`.
fn matches_export_window(key: &str, dates: &[String]) -> bool {
    if !key.ends_with(".csv.gz") {
        return false;
    }
    dates.iter().any(|date| key.contains(&format!("-{date}-")))
}

/// True when a delta artifact key matches the prefix and today's date
fn is_todays_artifact(key: &str, prefix: &str, today: &str) -> bool {
    key.starts_with(prefix) && key.ends_with(".csv") && key.contains(today)
}

/// Artifact timestamp: RFC3339 UTC with `:` and `.` replaced by `-`
fn artifact_timestamp() -> String {
    Utc::now()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_export_window() {
        let dates = vec!["20250604".to_string(), "20250603".to_string()];

        assert!(matches_export_window(
            "cart-20250604-000123-export.csv.gz",
            &dates
        ));
        assert!(matches_export_window(
            "cart-20250603-999-export.csv.gz",
            &dates
        ));
        // Wrong date
        assert!(!matches_export_window(
            "cart-20250601-000123-export.csv.gz",
            &dates
        ));
        // Not gzipped csv
        assert!(!matches_export_window("cart-20250604-000123.csv", &dates));
        // Date not delimited by dashes
        assert!(!matches_export_window("cart20250604export.csv.gz", &dates));
    }

    #[test]
    fn test_lookback_dates_count_and_format() {
        let dates = lookback_dates(3);
        assert_eq!(dates.len(), 3);
        for date in &dates {
            assert_eq!(date.len(), 8);
            assert!(date.chars().all(|c| c.is_ascii_digit()));
        }
        // Zero clamps to one day
        assert_eq!(lookback_dates(0).len(), 1);
    }

    #[test]
    fn test_is_todays_artifact() {
        assert!(is_todays_artifact(
            "delta_2025-06-04T12-44-02-619Z.csv",
            "delta_",
            "2025-06-04"
        ));
        // Most-viewed artifacts also start with "delta_"-like prefixes; the
        // plain prefix must not swallow them
        assert!(!is_todays_artifact(
            "most_viewed_delta_2025-06-04T12-44-02-619Z.csv",
            "delta_",
            "2025-06-04"
        ));
        assert!(!is_todays_artifact(
            "delta_2025-06-03T12-44-02-619Z.csv",
            "delta_",
            "2025-06-04"
        ));
        assert!(!is_todays_artifact(
            "delta_2025-06-04T12-44-02-619Z.csv.gz",
            "delta_",
            "2025-06-04"
        ));
    }

    #[test]
    fn test_artifact_timestamp_has_no_colons_or_dots() {
        let ts = artifact_timestamp();
        assert!(!ts.contains(':'));
        assert!(!ts.contains('.'));
        assert!(ts.ends_with('Z'));
    }
}
