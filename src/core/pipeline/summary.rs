//! Run summary and reporting

use crate::core::dispatch::DispatchResult;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// The pipeline jobs a run can execute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// Compute and upload the cart-abandon delta artifact
    CartAbandonDelta,
    /// Dispatch the latest cart-abandon delta artifact
    CartAbandonDispatch,
    /// Compute and upload the most-viewed delta artifact
    MostViewedDelta,
    /// Dispatch the latest most-viewed delta artifact
    MostViewedDispatch,
}

impl JobKind {
    /// Every job, in the order a full run executes them
    pub const ALL: [JobKind; 4] = [
        JobKind::CartAbandonDelta,
        JobKind::CartAbandonDispatch,
        JobKind::MostViewedDelta,
        JobKind::MostViewedDispatch,
    ];
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobKind::CartAbandonDelta => "cart-abandon-delta",
            JobKind::CartAbandonDispatch => "cart-abandon-dispatch",
            JobKind::MostViewedDelta => "most-viewed-delta",
            JobKind::MostViewedDispatch => "most-viewed-dispatch",
        };
        write!(f, "{name}")
    }
}

impl FromStr for JobKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cart-abandon-delta" => Ok(JobKind::CartAbandonDelta),
            "cart-abandon-dispatch" => Ok(JobKind::CartAbandonDispatch),
            "most-viewed-delta" => Ok(JobKind::MostViewedDelta),
            "most-viewed-dispatch" => Ok(JobKind::MostViewedDispatch),
            _ => Err(format!(
                "Unknown job '{s}'. Valid jobs: cart-abandon-delta, cart-abandon-dispatch, \
                 most-viewed-delta, most-viewed-dispatch"
            )),
        }
    }
}

/// Summary of one executed job
#[derive(Debug, Clone)]
pub struct JobSummary {
    /// Which job ran
    pub job: JobKind,

    /// Primary rows read from storage
    pub rows_read: usize,

    /// Exclusion rows read from storage
    pub exclusion_rows_read: usize,

    /// Delta records after exclusion and dedup
    pub delta_records: usize,

    /// Key of the uploaded artifact, when one was written
    pub artifact_key: Option<String>,

    /// Consolidated profiles built
    pub profiles: usize,

    /// Dispatch accounting, when the job dispatched
    pub dispatch: Option<DispatchResult>,

    /// Job duration
    pub duration: Duration,
}

impl JobSummary {
    /// Create an empty summary for a job
    pub fn new(job: JobKind) -> Self {
        Self {
            job,
            rows_read: 0,
            exclusion_rows_read: 0,
            delta_records: 0,
            artifact_key: None,
            profiles: 0,
            dispatch: None,
            duration: Duration::from_secs(0),
        }
    }

    /// True when the job's dispatch (if any) had no failed batches
    pub fn is_successful(&self) -> bool {
        self.dispatch
            .as_ref()
            .map(|d| d.is_complete_success())
            .unwrap_or(true)
    }
}

/// Summary of a whole pipeline run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Correlation id for this run's log lines
    pub run_id: Uuid,

    /// Summaries of the jobs that executed, in order
    pub jobs: Vec<JobSummary>,

    /// Total run duration
    pub duration: Duration,
}

impl RunSummary {
    /// Create a new run summary with a fresh run id
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            jobs: Vec::new(),
            duration: Duration::from_secs(0),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Record a completed job
    pub fn add_job(&mut self, job: JobSummary) {
        self.jobs.push(job);
    }

    /// True when every executed job succeeded
    pub fn is_successful(&self) -> bool {
        self.jobs.iter().all(JobSummary::is_successful)
    }

    /// Total profiles that failed dispatch across all jobs
    pub fn total_failed(&self) -> usize {
        self.jobs
            .iter()
            .filter_map(|j| j.dispatch.as_ref())
            .map(|d| d.failed_count)
            .sum()
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            run_id = %self.run_id,
            jobs = self.jobs.len(),
            duration_ms = self.duration.as_millis() as u64,
            successful = self.is_successful(),
            "Run completed"
        );

        for job in &self.jobs {
            tracing::info!(
                run_id = %self.run_id,
                job = %job.job,
                rows_read = job.rows_read,
                exclusion_rows_read = job.exclusion_rows_read,
                delta_records = job.delta_records,
                artifact_key = job.artifact_key.as_deref().unwrap_or("-"),
                profiles = job.profiles,
                dispatched_ok = job.dispatch.as_ref().map(|d| d.success_count).unwrap_or(0),
                dispatched_failed = job.dispatch.as_ref().map(|d| d.failed_count).unwrap_or(0),
                duration_ms = job.duration.as_millis() as u64,
                "Job summary"
            );

            if let Some(dispatch) = &job.dispatch {
                for error in &dispatch.errors {
                    tracing::warn!(
                        run_id = %self.run_id,
                        job = %job.job,
                        batch_index = error.batch_index,
                        profiles = error.profile_count,
                        message = %error.message,
                        "Batch failure"
                    );
                }
            }
        }
    }
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}
