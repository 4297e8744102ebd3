//! Core data models for the playlist audio synchronizer

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Title used when the remote source reports none
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Source kind used in ledger tags when the extractor does not report one
pub const DEFAULT_SOURCE_KIND: &str = "youtube";

/// Target audio codec for conversion

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,

    #[default]
    M4a,

    Aac,

    Flac,

    Opus,

    Vorbis,

    Wav,

    Alac,
}

impl AudioFormat {
    /// Every codec the converter is asked to produce
    pub const SUPPORTED: [AudioFormat; 8] = [
        AudioFormat::Mp3,
        AudioFormat::M4a,
        AudioFormat::Aac,
        AudioFormat::Flac,
        AudioFormat::Opus,
        AudioFormat::Vorbis,
        AudioFormat::Wav,
        AudioFormat::Alac,
    ];

    /// Codec name as understood by yt-dlp's `--audio-format`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::M4a => "m4a",
            Self::Aac => "aac",
            Self::Flac => "flac",
            Self::Opus => "opus",
            Self::Vorbis => "vorbis",
            Self::Wav => "wav",
            Self::Alac => "alac",
        }
    }

    /// Extension of the file the converter writes for this codec
    pub fn file_extension(&self) -> &'static str {
        match self {
            Self::Vorbis => "ogg",
            Self::Aac | Self::Alac => "m4a",
            other => other.as_str(),
        }
    }

    /// Whether thumbnail and tag embedding work for this container
    pub fn supports_metadata(&self) -> bool {
        matches!(self, Self::Mp3 | Self::M4a | Self::Flac | Self::Alac)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::SUPPORTED
            .iter()
            .copied()
            .find(|format| format.as_str() == wanted)
            .ok_or_else(|| AppError::Configuration(format!("Unsupported audio format: {}", s)))
    }
}

/// One playlist item as reported by the remote source

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Entry {
    /// Stable remote identifier, absent for some sources
    pub id: Option<String>,

    /// Raw display title
    pub title: String,

    /// Opaque reference handed back to the transfer capability
    pub locator: String,

    /// Lowercased extractor key, first half of the ledger tag
    pub source_kind: String,
}

impl Entry {
    pub fn new(id: Option<&str>, title: &str, locator: &str) -> Self {
        Self {
            id: id.map(str::to_string),
            title: title.to_string(),
            locator: locator.to_string(),
            source_kind: DEFAULT_SOURCE_KIND.to_string(),
        }
    }

    /// Ledger tag `"<source-kind> <id>"`, `None` for untrackable entries
    pub fn ledger_tag(&self) -> Option<String> {
        self.id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| format!("{} {}", self.source_kind, id))
    }

    /// Sanitized title used as the log key
    pub fn display_title(&self) -> String {
        crate::utils::sanitize_title(&self.title)
    }

    /// On-disk filename stem. Falls back to the id, then to [`UNKNOWN_TITLE`],
    /// when sanitization leaves nothing.
    pub fn file_stem(&self) -> String {
        let sanitized = self.display_title();
        if !sanitized.is_empty() {
            return sanitized;
        }

        self.id
            .as_deref()
            .map(crate::utils::sanitize_title)
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string())
    }
}

/// One playlist sync task

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Job {
    /// Section name (batch) or `manual`
    pub label: String,

    pub destination_dir: PathBuf,

    pub playlist_reference: String,

    pub audio_format: AudioFormat,

    /// 0 means best available
    pub preferred_quality_kbps: u32,

    pub redownload_missing: bool,
}

/// Per-entry outcome of reconciliation

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DownloadDecision {
    /// Ledger claims it and the file is present
    Skip,

    /// Never recorded (or untrackable)
    Download,

    /// Ledger claimed it but the file is gone, replay allowed
    Redownload,

    /// Ledger claimed it but the file is gone, replay forbidden
    SkipMissing,
}

impl DownloadDecision {
    /// Whether the fetch orchestrator has work to do for this decision
    pub fn requires_fetch(&self) -> bool {
        matches!(self, Self::Download | Self::Redownload)
    }
}

/// Failure of a single entry's transfer or conversion

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[error("Error downloading {entry}: {cause}")]
pub struct FetchError {
    pub entry: String,

    pub cause: String,
}

impl FetchError {
    pub fn new(entry: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            entry: entry.into(),
            cause: cause.into(),
        }
    }
}

/// Application error types

#[derive(Debug, thiserror::Error)]

pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication required: {0}")]
    Authentication(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Prompt error: {0}")]
    Prompt(String),
}

/// Result type alias for application operations

pub type AppResult<T> = Result<T, AppError>;
