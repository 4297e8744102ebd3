//! Job source: batch configuration file and manual job construction
//!
//! The configuration file is INI-style, one section per playlist:
//!
//! ```ini
//! [manual]
//! save_path = /home/me/Music/inbox
//! audio_format = mp3
//!
//! [lofi]
//! save_path = /home/me/Music/lofi
//! video_url = https://www.youtube.com/playlist?list=PL...
//! preferred_quality = 192
//! redownload_missing = false
//! ```
//!
//! The reserved `manual` section only supplies defaults for the single
//! interactive job and is never run in batch mode.

use config::{Config, ConfigError, File, FileFormat, Map, Value};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::core::models::{AppError, AppResult, AudioFormat, Job};
use crate::utils::{is_web_url, non_empty};

/// Configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "input.txt";

/// Section holding the manual job's settings
pub const MANUAL_SECTION: &str = "manual";

/// Where the jobs of a run come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSource {
    /// Every non-reserved section of the configuration file
    Batch,
    /// One playlist, settings from the `manual` section
    Manual { playlist_reference: String },
}

/// One named section of the configuration file
#[derive(Debug, Clone)]
pub struct ConfigSection {
    pub name: String,
    values: Map<String, Value>,
}

impl ConfigSection {
    fn string(&self, key: &str) -> AppResult<Option<String>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(value) => {
                let text = value.clone().into_string().map_err(|e| {
                    AppError::Configuration(format!("[{}] {}: {}", self.name, key, e))
                })?;
                Ok(non_empty(Some(text.as_str())))
            }
        }
    }

    fn boolean(&self, key: &str, default: bool) -> AppResult<bool> {
        let Some(raw) = self.string(key)? else {
            return Ok(default);
        };
        match raw.to_ascii_lowercase().as_str() {
            "1" | "yes" | "true" | "on" => Ok(true),
            "0" | "no" | "false" | "off" => Ok(false),
            _ => Err(AppError::Configuration(format!(
                "[{}] {} must be a boolean, got '{}'",
                self.name, key, raw
            ))),
        }
    }

    /// Audio format with fallback to the default for unsupported values
    fn audio_format(&self) -> AppResult<AudioFormat> {
        let Some(raw) = self.string("audio_format")? else {
            return Ok(AudioFormat::default());
        };
        Ok(raw.parse::<AudioFormat>().unwrap_or_else(|_| {
            warn!(
                "❌ Unsupported audio format: {}. Falling back to '{}'.",
                raw,
                AudioFormat::default()
            );
            AudioFormat::default()
        }))
    }

    fn preferred_quality(&self) -> AppResult<u32> {
        let Some(raw) = self.string("preferred_quality")? else {
            return Ok(0);
        };
        Ok(raw.parse::<u32>().unwrap_or_else(|_| {
            warn!(
                "⚠️  [{}] preferred_quality '{}' is not a number, using best quality",
                self.name, raw
            );
            0
        }))
    }

    pub fn is_reserved(&self) -> bool {
        self.name.eq_ignore_ascii_case(MANUAL_SECTION)
    }
}

/// Parsed configuration file
#[derive(Debug, Clone)]
pub struct AppConfig {
    path: Option<PathBuf>,
    sections: Vec<ConfigSection>,
}

impl AppConfig {
    /// Load the configuration file. A missing file is a configuration error.
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.is_file() {
            let cwd = std::env::current_dir()
                .map(|d| d.display().to_string())
                .unwrap_or_default();
            return Err(AppError::Configuration(format!(
                "{} not found (working directory: {})",
                path.display(),
                cwd
            )));
        }

        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_ini_str(&text)?;
        config.path = Some(path.to_path_buf());

        info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Parse configuration text directly. Backslashes are taken literally,
    /// so Windows paths such as `D:\Music\new` survive as written.
    pub fn from_ini_str(text: &str) -> AppResult<Self> {
        let literal = text.replace('\\', "\\\\");
        Self::from_built(
            Config::builder()
                .add_source(File::from_str(&literal, FileFormat::Ini))
                .build(),
        )
    }

    fn from_built(built: Result<Config, ConfigError>) -> AppResult<Self> {
        let root = built
            .and_then(|c| c.try_deserialize::<Value>())
            .and_then(|v| v.into_table())
            .map_err(|e| AppError::Configuration(format!("Failed to parse config file: {}", e)))?;

        let mut sections = Vec::new();
        for (name, value) in root {
            match value.into_table() {
                Ok(values) => sections.push(ConfigSection { name, values }),
                Err(_) => warn!("⚠️  Ignoring key '{}' outside of any section", name),
            }
        }

        Ok(Self {
            path: None,
            sections,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn sections(&self) -> &[ConfigSection] {
        &self.sections
    }

    fn manual_section(&self) -> Option<&ConfigSection> {
        self.sections.iter().find(|s| s.is_reserved())
    }

    /// One job per playlist section, in file order. Incomplete sections are
    /// skipped with a warning; the result may be empty.
    pub fn batch_jobs(&self) -> AppResult<Vec<Job>> {
        let mut jobs = Vec::new();

        for section in self.sections.iter().filter(|s| !s.is_reserved()) {
            let (Some(save_path), Some(video_url)) =
                (section.string("save_path")?, section.string("video_url")?)
            else {
                warn!(
                    "⚠️  Skipping [{}]: both save_path and video_url are required",
                    section.name
                );
                continue;
            };

            jobs.push(build_job(section, save_path, video_url)?);
        }

        Ok(jobs)
    }

    /// The single manual job for `playlist_reference`
    pub fn manual_job(&self, playlist_reference: &str) -> AppResult<Job> {
        let Some(playlist_reference) = non_empty(Some(playlist_reference)) else {
            return Err(AppError::Configuration("No URL provided.".to_string()));
        };

        let section = self.manual_section().ok_or_else(|| {
            AppError::Configuration(format!("[{}] section not found", MANUAL_SECTION))
        })?;

        let save_path = section.string("save_path")?.ok_or_else(|| {
            AppError::Configuration(format!("Missing 'save_path' in [{}] section.", MANUAL_SECTION))
        })?;

        build_job(section, save_path, playlist_reference)
    }

    /// Resolve the ordered job list for a run
    pub fn resolve_jobs(&self, source: &JobSource) -> AppResult<Vec<Job>> {
        match source {
            JobSource::Batch => {
                let jobs = self.batch_jobs()?;
                if jobs.is_empty() {
                    return Err(AppError::Configuration(
                        "No valid playlist entries found in the configuration file".to_string(),
                    ));
                }
                Ok(jobs)
            }
            JobSource::Manual { playlist_reference } => {
                let job = self.manual_job(playlist_reference)?;
                info!("Using manual settings:");
                info!("Download Path: {}", job.destination_dir.display());
                info!(
                    "Audio Format: {} @ {} kbps",
                    job.audio_format, job.preferred_quality_kbps
                );
                info!("Redownload Missing Files: {}", job.redownload_missing);
                Ok(vec![job])
            }
        }
    }
}

fn build_job(section: &ConfigSection, save_path: String, video_url: String) -> AppResult<Job> {
    if !is_web_url(&video_url) {
        warn!(
            "⚠️  [{}] '{}' is not an http(s) URL, passing it to the extractor as-is",
            section.name, video_url
        );
    }

    Ok(Job {
        label: section.name.clone(),
        destination_dir: PathBuf::from(save_path),
        playlist_reference: video_url,
        audio_format: section.audio_format()?,
        preferred_quality_kbps: section.preferred_quality()?,
        redownload_missing: section.boolean("redownload_missing", true)?,
    })
}
