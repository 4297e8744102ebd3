//! Sync command
//!
//! Loads the configuration, picks batch or manual mode, runs the jobs and
//! turns the result into a process exit code. In interactive mode every
//! terminal path waits for the user before returning.

use std::path::PathBuf;
use tracing::{debug, error, info};

use crate::commands::prompt::Prompter;
use crate::core::config::{AppConfig, JobSource};
use crate::core::manager::{RunSummary, SyncManager};
use crate::core::models::{AppResult, Job};

/// Every job completed without failed entries
pub const EXIT_SUCCESS: i32 = 0;
/// Configuration or other fatal error halted the run
pub const EXIT_FATAL: i32 = 1;
/// The run finished but a job or an entry failed
pub const EXIT_PARTIAL_FAILURE: i32 = 2;

/// Whether a human is at the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Prompt for the mode and wait for Enter before exiting
    #[default]
    Interactive,
    /// Never prompt; report through logs and the exit code
    NonInteractive,
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub config_path: PathBuf,
    pub mode: RunMode,
    /// Preselected job source; asked for when absent in interactive mode
    pub source: Option<JobSource>,
}

/// What a sync invocation produced
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub exit_code: i32,
    /// Absent when the run halted before any job started
    pub summary: Option<RunSummary>,
}

impl SyncOutcome {
    fn fatal() -> Self {
        Self {
            exit_code: EXIT_FATAL,
            summary: None,
        }
    }

    fn finished(summary: RunSummary) -> Self {
        let exit_code = if summary.halted {
            EXIT_FATAL
        } else if summary.has_failures() {
            EXIT_PARTIAL_FAILURE
        } else {
            EXIT_SUCCESS
        };
        Self {
            exit_code,
            summary: Some(summary),
        }
    }
}

/// Run the sync command end to end
pub async fn run_sync(
    options: &SyncOptions,
    manager: &SyncManager,
    prompter: &mut dyn Prompter,
) -> SyncOutcome {
    let outcome = match prepare_jobs(options, prompter) {
        Ok(jobs) => SyncOutcome::finished(manager.run_all(&jobs).await),
        Err(e) => {
            error!("{}", e.user_message());
            SyncOutcome::fatal()
        }
    };

    if options.mode == RunMode::Interactive {
        if let Err(e) = prompter.pause("Press Enter to exit...") {
            debug!("Exit prompt failed: {}", e);
        }
    }

    outcome
}

fn prepare_jobs(
    options: &SyncOptions,
    prompter: &mut dyn Prompter,
) -> AppResult<Vec<Job>> {
    let config = AppConfig::load(&options.config_path)?;
    let source = choose_source(options, prompter)?;
    config.resolve_jobs(&source)
}

fn choose_source(options: &SyncOptions, prompter: &mut dyn Prompter) -> AppResult<JobSource> {
    if let Some(source) = &options.source {
        return Ok(source.clone());
    }

    match options.mode {
        RunMode::NonInteractive => Ok(JobSource::Batch),
        RunMode::Interactive => {
            if prompter.confirm("Batch mode?", false)? {
                info!("📚 Running batch mode");
                Ok(JobSource::Batch)
            } else {
                let playlist_reference = prompter.input("Enter playlist URL")?;
                Ok(JobSource::Manual { playlist_reference })
            }
        }
    }
}
