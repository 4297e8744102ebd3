//! Playlist Audio Sync - Core Library
//!
//! Keeps local audio folders in step with online playlists: each run lists a
//! playlist, compares it with the per-folder ledger of finished downloads and
//! the files on disk, and fetches only what is new or went missing.

pub mod cli;
pub mod commands;
pub mod core;
pub mod utils;

// Re-export commonly used types
pub use core::{
    config::{AppConfig, JobSource},
    downloader::{FetchOrchestrator, FetchTarget},
    ledger::LedgerStore,
    manager::{JobOutcome, JobReport, RunSummary, SyncManager},
    models::{AppError, AppResult, AudioFormat, DownloadDecision, Entry, FetchError, Job},
    reconciler::{reconcile, ReconcileTally, Reconciliation},
    youtube_downloader::{MediaTransfer, PlaylistExtractor, YoutubeDownloader},
};

pub use utils::sanitize_title;

use std::sync::Arc;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Wire the yt-dlp backed capabilities into a manager
pub fn build_manager(downloader: YoutubeDownloader) -> SyncManager {
    let downloader = Arc::new(downloader);
    SyncManager::new(downloader.clone(), FetchOrchestrator::new(downloader))
}
