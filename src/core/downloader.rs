//! Fetch orchestrator
//!
//! Drives one planned entry through download, conversion and optional
//! metadata embedding, then records it in the ledger. The ledger is written
//! if and only if the converted file is actually on disk; every failure is
//! returned as a [`FetchError`] so the caller can log it and move on.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::error_handling::RetryPolicy;
use crate::core::ledger::LedgerStore;
use crate::core::models::{AudioFormat, Entry, FetchError};
use crate::core::reconciler::expected_path;
use crate::core::youtube_downloader::{MediaTransfer, TransferRequest};
use crate::utils::is_nonempty_file;

/// Per-job conversion target shared by every entry of the job
#[derive(Debug, Clone, Copy)]
pub struct FetchTarget<'a> {
    pub destination_dir: &'a Path,
    pub audio_format: AudioFormat,
    pub quality_kbps: u32,
    pub metadata_capable: bool,
}

impl<'a> FetchTarget<'a> {
    pub fn new(destination_dir: &'a Path, audio_format: AudioFormat, quality_kbps: u32) -> Self {
        Self {
            destination_dir,
            audio_format,
            quality_kbps,
            metadata_capable: audio_format.supports_metadata(),
        }
    }
}

/// Runs single-entry transfers through a [`MediaTransfer`] capability
#[derive(Clone)]
pub struct FetchOrchestrator {
    transfer: Arc<dyn MediaTransfer>,
    retry: RetryPolicy,
}

impl FetchOrchestrator {
    pub fn new(transfer: Arc<dyn MediaTransfer>) -> Self {
        Self {
            transfer,
            retry: RetryPolicy::default(),
        }
    }

    /// Build the transfer request for one entry
    pub fn request_for(&self, entry: &Entry, target: &FetchTarget<'_>) -> TransferRequest {
        TransferRequest {
            locator: entry.locator.clone(),
            output_stem: target.destination_dir.join(entry.file_stem()),
            audio_format: target.audio_format,
            quality_kbps: target.quality_kbps,
            embed_metadata: target.metadata_capable,
            retry: self.retry,
        }
    }

    /// Fetch one entry and, on success, record it in `ledger`.
    /// Returns the path of the produced file.
    pub async fn fetch(
        &self,
        entry: &Entry,
        target: &FetchTarget<'_>,
        ledger: &mut LedgerStore,
    ) -> Result<PathBuf, FetchError> {
        let title = entry.display_title();
        let output = expected_path(entry, target.destination_dir, target.audio_format);
        let request = self.request_for(entry, target);

        debug!("⬇️ Fetching {} -> {}", entry.locator, output.display());
        self.transfer
            .transfer(&request)
            .await
            .map_err(|e| FetchError::new(title.clone(), e.to_string()))?;

        if !is_nonempty_file(&output) {
            return Err(FetchError::new(
                title,
                format!(
                    "transfer reported success but {} was not produced",
                    output.display()
                ),
            ));
        }

        if let Some(tag) = entry.ledger_tag() {
            ledger.append(&tag).map_err(|e| {
                FetchError::new(
                    title.clone(),
                    format!("downloaded but could not update ledger: {}", e),
                )
            })?;
        }

        info!("✅ Saved: {}", output.display());
        Ok(output)
    }
}
