//! Error classification and retry policy
//!
//! Failures are sorted into categories that decide how far they propagate:
//! entry-level failures stay inside their job, job-level failures stay inside
//! their batch, and only configuration failures halt the run.

use serde::{Deserialize, Serialize};

use crate::core::models::AppError;

/// Fixed transient-failure budget handed to the transfer capability
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Lowercase stderr fragments that mean the remote wants a logged-in session
const AUTHENTICATION_MARKERS: [&str; 2] = ["sign in to confirm", "cookies"];

/// Error categories for the sync system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Bad or missing configuration, fatal to the whole run
    Configuration,
    /// Login/cookie failure during extraction, fatal to one job
    Authentication,
    /// Playlist metadata fetch failed, fatal to one job
    Extraction,
    /// One entry failed to transfer or convert
    Fetch,
    /// File system errors (permissions, disk space, IO)
    FileSystem,
    /// Terminal interaction failed
    Interaction,
}

/// How far a failure is allowed to propagate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorScope {
    Entry,
    Job,
    Run,
}

impl ErrorCategory {
    pub fn scope(&self) -> ErrorScope {
        match self {
            Self::Fetch => ErrorScope::Entry,
            Self::Authentication | Self::Extraction | Self::FileSystem => ErrorScope::Job,
            Self::Configuration | Self::Interaction => ErrorScope::Run,
        }
    }
}

impl AppError {
    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Io(_) => ErrorCategory::FileSystem,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::Extraction(_) => ErrorCategory::Extraction,
            Self::Fetch(_) => ErrorCategory::Fetch,
            Self::Prompt(_) => ErrorCategory::Interaction,
        }
    }

    /// Message shown to the user for a failure of the given job
    pub fn user_message(&self) -> String {
        match self {
            Self::Authentication(_) => {
                "❌ Cookie error: This playlist/video requires login. Check your cookies file."
                    .to_string()
            }
            Self::Extraction(detail) => format!("❌ Failed to extract playlist: {}", detail),
            other => format!("❌ {}", other),
        }
    }
}

/// Whether extractor output reports that authentication is required
pub fn is_authentication_failure(message: &str) -> bool {
    let lowered = message.to_lowercase();
    AUTHENTICATION_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// Turn a failed extractor invocation into the matching job-level error
pub fn classify_extraction_failure(stderr: &str) -> AppError {
    let detail = last_error_line(stderr);
    if is_authentication_failure(stderr) {
        AppError::Authentication(detail)
    } else {
        AppError::Extraction(detail)
    }
}

/// Most specific line of a tool's stderr: the last `ERROR:` line if any,
/// else the last non-blank line.
pub fn last_error_line(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .map(|l| l.to_string())
        .unwrap_or_else(|| "no diagnostic output".to_string())
}

/// Retry budget for transient network and fragment failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries of a whole request
    pub max_attempts: u32,
    /// Retries of a single fragment of a segmented stream
    pub fragment_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_ATTEMPTS,
            fragment_attempts: DEFAULT_RETRY_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    /// Render the policy as yt-dlp arguments
    pub fn to_args(&self) -> Vec<String> {
        vec![
            "--retries".to_string(),
            self.max_attempts.to_string(),
            "--fragment-retries".to_string(),
            self.fragment_attempts.to_string(),
        ]
    }
}
