use tracing_subscriber::EnvFilter;

/// Filter applied when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "playlist_audio_sync=info";

/// Console verbosity chosen on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

fn build_filter(verbosity: Verbosity) -> EnvFilter {
    match verbosity {
        Verbosity::Quiet => EnvFilter::new("playlist_audio_sync=warn"),
        Verbosity::Verbose => EnvFilter::new("playlist_audio_sync=debug"),
        Verbosity::Normal => {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into())
        }
    }
}

/// Install the console subscriber. Safe to call more than once.
pub fn init_tracing(verbosity: Verbosity) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(verbosity))
        .with_target(verbosity == Verbosity::Verbose)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing(Verbosity::Quiet);
        init_tracing(Verbosity::Verbose);
    }
}
