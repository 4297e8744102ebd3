//! Core business logic module
//!
//! This module contains the domain models, the ledger, reconciliation and
//! fetch orchestration, the job source and the run manager.

pub mod config;
pub mod downloader;
pub mod error_handling;
pub mod ledger;
pub mod manager;
pub mod models;
pub mod reconciler;
pub mod youtube_downloader;


#[cfg(test)]
mod manager_integration_tests;


// Re-export commonly used types
pub use config::{AppConfig, JobSource};
pub use manager::{JobOutcome, JobReport, RunSummary, SyncManager};
