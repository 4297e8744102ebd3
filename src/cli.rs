//! Command-line arguments

use clap::Parser;
use std::path::PathBuf;

use crate::core::config::DEFAULT_CONFIG_FILE;
use crate::core::youtube_downloader::{
    YoutubeDownloaderConfig, DEFAULT_COOKIE_FILE, DEFAULT_YT_DLP_BINARY,
};
use crate::utils::Verbosity;

/// Incrementally sync online playlists into local audio folders.
///
/// With no options the tool asks whether to run every playlist from the
/// configuration file or a single playlist URL.
#[derive(Debug, Clone, Parser)]
#[command(name = "playlist-audio-sync", version, about)]
pub struct Cli {
    /// Batch configuration file
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Run every playlist section of the configuration file without asking
    #[arg(long, conflicts_with = "url")]
    pub batch: bool,

    /// Sync a single playlist using the [manual] section's settings
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Never prompt or wait for a keypress; report through the exit code
    #[arg(long)]
    pub non_interactive: bool,

    /// Netscape cookie file for playlists that require login, used when present
    #[arg(long, value_name = "PATH", default_value = DEFAULT_COOKIE_FILE)]
    pub cookies: PathBuf,

    /// yt-dlp executable
    #[arg(long = "yt-dlp", value_name = "PATH", default_value = DEFAULT_YT_DLP_BINARY)]
    pub yt_dlp: PathBuf,

    /// Debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        if self.verbose {
            Verbosity::Verbose
        } else if self.quiet {
            Verbosity::Quiet
        } else {
            Verbosity::Normal
        }
    }

    /// Extractor settings. The cookie file is only handed over when it exists.
    pub fn downloader_config(&self) -> YoutubeDownloaderConfig {
        YoutubeDownloaderConfig {
            binary: self.yt_dlp.clone(),
            cookie_file: self.cookies.is_file().then(|| self.cookies.clone()),
        }
    }
}
