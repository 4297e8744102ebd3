use clap::Parser;
use tracing::{debug, error};

use playlist_audio_sync::cli::Cli;
use playlist_audio_sync::commands::{run_sync, RunMode, SyncOptions, TerminalPrompter};
use playlist_audio_sync::core::config::JobSource;
use playlist_audio_sync::utils::init_tracing;
use playlist_audio_sync::{build_manager, YoutubeDownloader, NAME, VERSION};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbosity());
    debug!("🚀 {} v{}", NAME, VERSION);

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("❌ {:#}", e);
            playlist_audio_sync::commands::sync::EXIT_FATAL
        }
    };

    std::process::exit(code);
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    // One entry at a time, on one thread.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let mode = if cli.non_interactive {
        RunMode::NonInteractive
    } else {
        RunMode::Interactive
    };
    let source = match (&cli.url, cli.batch) {
        (Some(url), _) => Some(JobSource::Manual {
            playlist_reference: url.clone(),
        }),
        (None, true) => Some(JobSource::Batch),
        (None, false) => None,
    };
    let options = SyncOptions {
        config_path: cli.config.clone(),
        mode,
        source,
    };

    let downloader = YoutubeDownloader::new(cli.downloader_config());
    debug!(
        "🔧 yt-dlp: {}, cookies: {}",
        downloader.get_config().binary.display(),
        downloader
            .get_config()
            .cookie_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "none".to_string())
    );
    let manager = build_manager(downloader);
    let mut prompter = TerminalPrompter::new();

    let outcome = runtime.block_on(run_sync(&options, &manager, &mut prompter));
    Ok(outcome.exit_code)
}
