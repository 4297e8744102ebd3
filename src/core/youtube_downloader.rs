//! YouTube Downloader Module
//!
//! Drives the external `yt-dlp` executable for the two capabilities the sync
//! engine delegates: flat playlist extraction and single-entry
//! download + audio conversion. Both sit behind traits so the engine can be
//! exercised without the binary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::core::error_handling::{classify_extraction_failure, last_error_line, RetryPolicy};
use crate::core::models::{
    AppError, AppResult, AudioFormat, Entry, DEFAULT_SOURCE_KIND, UNKNOWN_TITLE,
};

/// Executable looked up on `PATH` when none is configured
pub const DEFAULT_YT_DLP_BINARY: &str = "yt-dlp";

/// Cookie file picked up from the working directory when present
pub const DEFAULT_COOKIE_FILE: &str = "cookies.txt";

/// Extraction capability: list a playlist's entries without downloading
#[async_trait]
pub trait PlaylistExtractor: Send + Sync {
    async fn extract_entries(&self, playlist_reference: &str) -> AppResult<Vec<Entry>>;
}

/// Transfer capability: download one entry and convert it to audio
#[async_trait]
pub trait MediaTransfer: Send + Sync {
    async fn transfer(&self, request: &TransferRequest) -> AppResult<()>;
}

/// Everything the transfer capability needs for one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Entry locator as reported by extraction
    pub locator: String,
    /// Output path without extension; the converter appends the codec's
    pub output_stem: PathBuf,
    pub audio_format: AudioFormat,
    pub quality_kbps: u32,
    /// Embed tags and thumbnail into the converted file
    pub embed_metadata: bool,
    pub retry: RetryPolicy,
}

/// yt-dlp invocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoutubeDownloaderConfig {
    /// yt-dlp executable name or path
    pub binary: PathBuf,
    /// Netscape cookie file for access-restricted playlists
    pub cookie_file: Option<PathBuf>,
}

impl Default for YoutubeDownloaderConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_YT_DLP_BINARY),
            cookie_file: Some(PathBuf::from(DEFAULT_COOKIE_FILE)),
        }
    }
}

/// `yt-dlp` backed implementation of both capabilities
#[derive(Debug, Clone)]
pub struct YoutubeDownloader {
    config: YoutubeDownloaderConfig,
}

impl YoutubeDownloader {
    pub fn new(config: YoutubeDownloaderConfig) -> Self {
        Self { config }
    }

    /// Get current configuration
    pub fn get_config(&self) -> &YoutubeDownloaderConfig {
        &self.config
    }

    fn cookie_args(&self) -> Vec<String> {
        match &self.config.cookie_file {
            Some(path) if path.is_file() => {
                vec!["--cookies".to_string(), path.to_string_lossy().into_owned()]
            }
            Some(path) => {
                debug!("🍪 Cookie file {} not found, continuing without it", path.display());
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Arguments for a flat, metadata-only playlist listing
    pub fn extraction_args(&self, playlist_reference: &str) -> Vec<String> {
        let mut args: Vec<String> = [
            "--flat-playlist",
            "--dump-single-json",
            "--quiet",
            "--no-warnings",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.extend(self.cookie_args());
        args.push(playlist_reference.to_string());
        args
    }

    /// Arguments for one entry's download and conversion
    pub fn transfer_args(&self, request: &TransferRequest) -> Vec<String> {
        let format = request.audio_format.as_str();
        let template = format!(
            "{}.%(ext)s",
            crate::utils::escape_output_template(&request.output_stem.to_string_lossy())
        );

        let mut args: Vec<String> = [
            "--no-playlist",
            "--quiet",
            "--no-warnings",
            "--force-overwrites",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.extend(request.retry.to_args());
        args.extend([
            "-f".to_string(),
            format!("bestaudio[ext={}]/bestaudio/best", format),
            "-x".to_string(),
            "--audio-format".to_string(),
            format.to_string(),
            "--audio-quality".to_string(),
            audio_quality_arg(request.quality_kbps),
            "-o".to_string(),
            template,
        ]);
        if request.embed_metadata {
            args.push("--embed-metadata".to_string());
            args.push("--embed-thumbnail".to_string());
        }
        args.extend(self.cookie_args());
        args.push(request.locator.clone());
        args
    }

    async fn run(&self, args: &[String]) -> AppResult<std::process::Output> {
        debug!("▶️ {} {}", self.config.binary.display(), args.join(" "));
        Command::new(&self.config.binary)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    AppError::Extraction(format!(
                        "{} executable not found; install yt-dlp or pass its path",
                        self.config.binary.display()
                    ))
                } else {
                    AppError::Io(e)
                }
            })
    }
}

#[async_trait]
impl PlaylistExtractor for YoutubeDownloader {
    async fn extract_entries(&self, playlist_reference: &str) -> AppResult<Vec<Entry>> {
        debug!("🔍 Fetching playlist info for: {}", playlist_reference);
        let output = self.run(&self.extraction_args(playlist_reference)).await?;

        if !output.status.success() {
            return Err(classify_extraction_failure(&String::from_utf8_lossy(
                &output.stderr,
            )));
        }

        parse_flat_playlist(&String::from_utf8_lossy(&output.stdout))
    }
}

#[async_trait]
impl MediaTransfer for YoutubeDownloader {
    async fn transfer(&self, request: &TransferRequest) -> AppResult<()> {
        let output = self.run(&self.transfer_args(request)).await?;

        if output.status.success() {
            Ok(())
        } else {
            Err(AppError::Extraction(format!(
                "yt-dlp exited with {}: {}",
                output.status,
                last_error_line(&String::from_utf8_lossy(&output.stderr))
            )))
        }
    }
}

/// Render the preferred quality as yt-dlp's `--audio-quality` value:
/// 0..=10 is a VBR level (0 best), anything larger a bitrate in kbps.
pub fn audio_quality_arg(quality_kbps: u32) -> String {
    if quality_kbps <= 10 {
        quality_kbps.to_string()
    } else {
        format!("{}K", quality_kbps)
    }
}

#[derive(Debug, Deserialize)]
struct FlatPlaylist {
    id: Option<String>,
    title: Option<String>,
    webpage_url: Option<String>,
    original_url: Option<String>,
    extractor_key: Option<String>,
    entries: Option<Vec<Option<FlatEntry>>>,
}

#[derive(Debug, Deserialize)]
struct FlatEntry {
    id: Option<String>,
    title: Option<String>,
    url: Option<String>,
    webpage_url: Option<String>,
    ie_key: Option<String>,
}

fn source_kind(key: Option<&str>) -> String {
    key.map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_lowercase)
        .unwrap_or_else(|| DEFAULT_SOURCE_KIND.to_string())
}

/// Parse `--flat-playlist --dump-single-json` output into entries, in order.
/// A reference that resolves to a single video yields one entry.
pub fn parse_flat_playlist(json: &str) -> AppResult<Vec<Entry>> {
    let playlist: FlatPlaylist = serde_json::from_str(json)
        .map_err(|e| AppError::Extraction(format!("Unreadable playlist metadata: {}", e)))?;

    let Some(raw_entries) = playlist.entries else {
        let locator = playlist
            .webpage_url
            .or(playlist.original_url)
            .or_else(|| playlist.id.clone());
        return Ok(locator
            .map(|locator| Entry {
                id: playlist.id,
                title: playlist.title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
                locator,
                source_kind: source_kind(playlist.extractor_key.as_deref()),
            })
            .into_iter()
            .collect());
    };

    let mut entries = Vec::with_capacity(raw_entries.len());
    for (index, raw) in raw_entries.into_iter().enumerate() {
        let Some(raw) = raw else {
            warn!("⚠️  Playlist item {} is unavailable, skipping", index + 1);
            continue;
        };

        let Some(locator) = raw.url.or(raw.webpage_url).or_else(|| raw.id.clone()) else {
            warn!("⚠️  Playlist item {} has no usable link, skipping", index + 1);
            continue;
        };

        entries.push(Entry {
            id: raw.id,
            title: raw.title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            locator,
            source_kind: source_kind(raw.ie_key.as_deref()),
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn downloader_without_cookies() -> YoutubeDownloader {
        YoutubeDownloader::new(YoutubeDownloaderConfig {
            binary: PathBuf::from("yt-dlp"),
            cookie_file: None,
        })
    }

    fn request(format: AudioFormat, quality: u32) -> TransferRequest {
        TransferRequest {
            locator: "https://www.youtube.com/watch?v=abc".to_string(),
            output_stem: PathBuf::from("/music/100% Song"),
            audio_format: format,
            quality_kbps: quality,
            embed_metadata: format.supports_metadata(),
            retry: RetryPolicy::default(),
        }
    }

    #[test]
    fn test_audio_quality_arg() {
        assert_eq!(audio_quality_arg(0), "0");
        assert_eq!(audio_quality_arg(5), "5");
        assert_eq!(audio_quality_arg(192), "192K");
    }

    #[test]
    fn test_transfer_args_with_metadata() {
        let args = downloader_without_cookies().transfer_args(&request(AudioFormat::Mp3, 320));

        assert!(args.contains(&"bestaudio[ext=mp3]/bestaudio/best".to_string()));
        assert!(args.contains(&"/music/100%% Song.%(ext)s".to_string()));
        assert!(args.contains(&"320K".to_string()));
        assert!(args.contains(&"--embed-thumbnail".to_string()));
        assert!(args.contains(&"--embed-metadata".to_string()));
        assert!(!args.contains(&"--cookies".to_string()));
        assert_eq!(args.last().unwrap(), "https://www.youtube.com/watch?v=abc");

        let retries = args.iter().position(|a| a == "--retries").unwrap();
        assert_eq!(args[retries + 1], "3");
    }

    #[test]
    fn test_transfer_args_without_metadata() {
        let args = downloader_without_cookies().transfer_args(&request(AudioFormat::Opus, 0));

        assert!(!args.contains(&"--embed-thumbnail".to_string()));
        assert!(!args.contains(&"--embed-metadata".to_string()));
        let quality = args.iter().position(|a| a == "--audio-quality").unwrap();
        assert_eq!(args[quality + 1], "0");
    }

    #[test]
    fn test_cookie_file_used_only_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let cookies = dir.path().join("cookies.txt");

        let downloader = YoutubeDownloader::new(YoutubeDownloaderConfig {
            binary: PathBuf::from("yt-dlp"),
            cookie_file: Some(cookies.clone()),
        });
        assert!(!downloader.extraction_args("PL1").contains(&"--cookies".to_string()));

        std::fs::write(&cookies, "# Netscape HTTP Cookie File\n").unwrap();
        let args = downloader.extraction_args("PL1");
        let at = args.iter().position(|a| a == "--cookies").unwrap();
        assert_eq!(args[at + 1], cookies.to_string_lossy());
        assert_eq!(args.last().unwrap(), "PL1");
    }

    #[test]
    fn test_parse_flat_playlist() {
        let json = r#"{
            "id": "PL1",
            "title": "Mix",
            "extractor_key": "YoutubeTab",
            "entries": [
                {"id": "a1", "title": "First (Official Video)", "url": "https://www.youtube.com/watch?v=a1", "ie_key": "Youtube"},
                null,
                {"title": "No Id", "url": "https://example.com/track"},
                {"id": "c3", "url": null, "webpage_url": null}
            ]
        }"#;

        let entries = parse_flat_playlist(json).unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].ledger_tag().as_deref(), Some("youtube a1"));
        assert_eq!(entries[0].title, "First (Official Video)");
        assert_eq!(entries[1].id, None);
        assert_eq!(entries[1].source_kind, "youtube");
        assert_eq!(entries[2].locator, "c3");
        assert_eq!(entries[2].title, UNKNOWN_TITLE);
    }

    #[test]
    fn test_parse_single_video() {
        let json = r#"{"id": "v1", "title": "Solo", "webpage_url": "https://www.youtube.com/watch?v=v1", "extractor_key": "Youtube"}"#;

        let entries = parse_flat_playlist(json).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].ledger_tag().as_deref(), Some("youtube v1"));
    }

    #[test]
    fn test_parse_garbage_is_extraction_error() {
        assert!(matches!(
            parse_flat_playlist("not json"),
            Err(AppError::Extraction(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_binary_is_extraction_error() {
        let downloader = YoutubeDownloader::new(YoutubeDownloaderConfig {
            binary: PathBuf::from("definitely-not-a-real-yt-dlp-binary"),
            cookie_file: None,
        });

        let result = downloader.extract_entries("PL1").await;
        assert!(matches!(result, Err(AppError::Extraction(_))));
    }
}
