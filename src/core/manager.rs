//! Sync Manager - runs playlist jobs end to end
//!
//! A job is: extract the playlist snapshot, reconcile it against the
//! destination's ledger and files, then fetch every entry that needs it.
//! Jobs run strictly one after another. A failed entry never stops its job
//! and a failed job never stops the batch; only a run-scoped failure
//! (configuration or terminal interaction) ends the run early.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::core::downloader::{FetchOrchestrator, FetchTarget};
use crate::core::error_handling::{ErrorCategory, ErrorScope};
use crate::core::ledger::LedgerStore;
use crate::core::models::{AppError, AppResult, DownloadDecision, FetchError, Job};
use crate::core::reconciler::{ReconcileTally, Reconciler};
use crate::core::youtube_downloader::PlaylistExtractor;
use crate::utils::ensure_dir_exists;

/// Result of one completed job
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub label: String,
    pub destination_dir: PathBuf,
    /// Entries in the playlist snapshot
    pub total: usize,
    pub tally: ReconcileTally,
    /// New entries fetched successfully
    pub downloaded: usize,
    /// Missing entries fetched again successfully
    pub redownloaded: usize,
    pub failures: Vec<FetchError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl JobReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// How one job of a run ended
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status")]
pub enum JobOutcome {
    Completed(JobReport),
    Failed {
        label: String,
        error: String,
        category: ErrorCategory,
    },
}

/// Everything that happened during one run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub outcomes: Vec<JobOutcome>,
    /// A run-scoped failure stopped the remaining jobs
    pub halted: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn completed(&self) -> impl Iterator<Item = &JobReport> {
        self.outcomes.iter().filter_map(|o| match o {
            JobOutcome::Completed(report) => Some(report),
            JobOutcome::Failed { .. } => None,
        })
    }

    pub fn failed_jobs(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, JobOutcome::Failed { .. }))
            .count()
    }

    pub fn failed_entries(&self) -> usize {
        self.completed().map(|r| r.failures.len()).sum()
    }

    /// True when any job or any entry failed
    pub fn has_failures(&self) -> bool {
        self.failed_jobs() > 0 || self.failed_entries() > 0
    }

    /// Decision counts summed over every completed job
    pub fn tally(&self) -> ReconcileTally {
        self.completed().fold(ReconcileTally::default(), |mut acc, r| {
            acc.new += r.tally.new;
            acc.skipped += r.tally.skipped;
            acc.redownloaded += r.tally.redownloaded;
            acc.skipped_missing += r.tally.skipped_missing;
            acc
        })
    }
}

/// Runs jobs through extraction, reconciliation and fetching
#[derive(Clone)]
pub struct SyncManager {
    extractor: Arc<dyn PlaylistExtractor>,
    orchestrator: FetchOrchestrator,
}

impl SyncManager {
    pub fn new(extractor: Arc<dyn PlaylistExtractor>, orchestrator: FetchOrchestrator) -> Self {
        Self {
            extractor,
            orchestrator,
        }
    }

    /// Run one job. Entry failures are collected in the report; extraction
    /// and filesystem failures abort the job and are returned.
    pub async fn run_job(&self, job: &Job) -> AppResult<JobReport> {
        let started_at = Utc::now();

        ensure_dir_exists(&job.destination_dir)?;

        info!("📂 Download folder: {}", job.destination_dir.display());
        info!(
            "🎵 Format: {} @ {} kbps",
            job.audio_format, job.preferred_quality_kbps
        );
        info!("🔗 Playlist URL: {}", job.playlist_reference);
        info!(
            "🔁 Redownload missing files: {}",
            if job.redownload_missing { "yes" } else { "no" }
        );

        let target = FetchTarget::new(
            &job.destination_dir,
            job.audio_format,
            job.preferred_quality_kbps,
        );
        if !target.metadata_capable {
            warn!(
                "⚠️  Format '{}' does not support embedded metadata, files will have no tags or artwork",
                job.audio_format
            );
        }

        let entries = self
            .extractor
            .extract_entries(&job.playlist_reference)
            .await?;
        info!("📋 Found {} videos in playlist", entries.len());

        let mut ledger = LedgerStore::open(&job.destination_dir)?;
        let plan = Reconciler::new(
            &mut ledger,
            &job.destination_dir,
            job.audio_format,
            job.redownload_missing,
        )
        .reconcile(&entries);

        let mut downloaded = 0;
        let mut redownloaded = 0;
        let mut failures = Vec::new();

        for item in plan.pending() {
            info!("⬇️ Downloading: {}", item.entry.display_title());
            match self.orchestrator.fetch(&item.entry, &target, &mut ledger).await {
                Ok(_) => match item.decision {
                    DownloadDecision::Redownload => redownloaded += 1,
                    _ => downloaded += 1,
                },
                Err(e) => {
                    error!("❌ {}", e);
                    failures.push(e);
                }
            }
        }

        info!(
            "🔁 Re-downloaded: {} | ⏩ Skipped missing: {} | ✅ Done.",
            plan.tally.redownloaded, plan.tally.skipped_missing
        );

        Ok(JobReport {
            label: job.label.clone(),
            destination_dir: job.destination_dir.clone(),
            total: entries.len(),
            tally: plan.tally,
            downloaded,
            redownloaded,
            failures,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Run every job in order. Job failures are recorded and the run moves
    /// on, unless the failure's scope is the whole run.
    pub async fn run_all(&self, jobs: &[Job]) -> RunSummary {
        let started_at = Utc::now();
        let mut outcomes = Vec::with_capacity(jobs.len());
        let mut halted = false;

        for (index, job) in jobs.iter().enumerate() {
            info!(
                "▶️ Job {}/{}: [{}]",
                index + 1,
                jobs.len(),
                job.label
            );
            match self.run_job(job).await {
                Ok(report) => outcomes.push(JobOutcome::Completed(report)),
                Err(e) => {
                    error!("{}", e.user_message());
                    outcomes.push(failed_outcome(job, &e));
                    if e.category().scope() == ErrorScope::Run {
                        error!(
                            "🛑 Stopping run, {} job(s) not started",
                            jobs.len() - index - 1
                        );
                        halted = true;
                        break;
                    }
                }
            }
        }

        let summary = RunSummary {
            outcomes,
            halted,
            started_at,
            finished_at: Utc::now(),
        };

        let tally = summary.tally();
        info!(
            "📊 New: {} | Skipped: {} | 🔁 Re-downloaded: {} | ⏩ Skipped missing: {} | ❌ Failed entries: {} | ❌ Failed jobs: {}",
            tally.new,
            tally.skipped,
            tally.redownloaded,
            tally.skipped_missing,
            summary.failed_entries(),
            summary.failed_jobs()
        );
        info!("✅ All downloads completed.");

        summary
    }
}

fn failed_outcome(job: &Job, error: &AppError) -> JobOutcome {
    JobOutcome::Failed {
        label: job.label.clone(),
        error: error.to_string(),
        category: error.category(),
    }
}
