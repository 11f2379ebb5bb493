//! Run command implementation
//!
//! This module implements the `run` command for executing pipeline jobs:
//! delta computation, artifact upload, and dispatch to the ingestion API.

use crate::config::load_config;
use crate::core::pipeline::{JobKind, PipelineCoordinator};
use clap::Args;
use std::str::FromStr;
use tokio::sync::watch;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Job to run (cart-abandon-delta, cart-abandon-dispatch,
    /// most-viewed-delta, most-viewed-dispatch); all jobs when omitted
    #[arg(long)]
    pub job: Option<String>,

    /// Dry run mode - compute everything, upload and dispatch nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Override the lookback window in days for both delta jobs
    #[arg(long)]
    pub lookback: Option<u32>,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting run command");

        // Load configuration
        let mut config = load_config(config_path)?;

        // Apply CLI overrides
        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }
        if let Some(days) = self.lookback {
            tracing::info!(lookback_days = days, "Overriding lookback window from CLI");
            config.pipeline.cart_abandon.lookback_days = days;
            config.pipeline.most_viewed.lookback_days = days;
        }

        // Validate configuration
        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2); // Configuration error exit code
        }

        // Resolve which jobs to run
        let jobs: Vec<JobKind> = match &self.job {
            Some(name) => match JobKind::from_str(name) {
                Ok(job) => vec![job],
                Err(e) => {
                    eprintln!("{e}");
                    return Ok(2);
                }
            },
            None => JobKind::ALL.to_vec(),
        };

        if config.application.dry_run {
            println!("DRY RUN MODE - no artifacts will be uploaded, nothing will be dispatched");
            println!();
        }

        let dry_run = config.application.dry_run;
        let coordinator = PipelineCoordinator::new(config).await?;

        // Jobs run sequentially; the shutdown signal is honored between
        // jobs only - an in-flight dispatch always runs to completion so
        // its accounting stays whole.
        let mut summaries = Vec::new();
        for job in &jobs {
            if *shutdown_signal.borrow() {
                tracing::warn!(job = %job, "Shutdown requested, skipping remaining jobs");
                println!("Shutdown requested, skipping remaining jobs");
                break;
            }
            summaries.push(coordinator.run_job(*job).await?);
        }

        // Report results
        println!();
        println!("Run Results:");
        let mut failed_profiles = 0;
        for summary in &summaries {
            let dispatched = summary
                .dispatch
                .as_ref()
                .map(|d| format!("{} ok / {} failed", d.success_count, d.failed_count))
                .unwrap_or_else(|| "-".to_string());
            failed_profiles += summary
                .dispatch
                .as_ref()
                .map(|d| d.failed_count)
                .unwrap_or(0);

            println!(
                "  {}: {} rows read, {} delta records, {} profiles, dispatched: {}{}",
                summary.job,
                summary.rows_read,
                summary.delta_records,
                summary.profiles,
                dispatched,
                summary
                    .artifact_key
                    .as_deref()
                    .map(|k| format!(", artifact: {k}"))
                    .unwrap_or_default(),
            );
        }

        if dry_run {
            println!();
            println!("Dry run completed - no data was written");
            return Ok(0);
        }

        if failed_profiles > 0 {
            println!();
            println!("Completed with {failed_profiles} profiles failed to dispatch");
            return Ok(1);
        }

        Ok(0)
    }
}
