//! Reconciliation engine
//!
//! Decides, for every entry of a playlist snapshot, whether it is already
//! satisfied, new, or recorded-but-missing, by cross-checking the ledger with
//! the files actually present in the destination directory. Running it twice
//! with nothing changed in between yields the same decisions, so an
//! interrupted run is repaired by simply running again.

use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::core::ledger::LedgerStore;
use crate::core::models::{AudioFormat, DownloadDecision, Entry};

/// One entry with its decision and the file it maps to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEntry {
    pub entry: Entry,
    pub decision: DownloadDecision,
    pub expected_path: PathBuf,
}

/// Decision counts for end-of-run reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileTally {
    pub new: usize,
    pub skipped: usize,
    pub redownloaded: usize,
    pub skipped_missing: usize,
}

impl ReconcileTally {
    fn record(&mut self, decision: DownloadDecision) {
        match decision {
            DownloadDecision::Download => self.new += 1,
            DownloadDecision::Skip => self.skipped += 1,
            DownloadDecision::Redownload => self.redownloaded += 1,
            DownloadDecision::SkipMissing => self.skipped_missing += 1,
        }
    }
}

/// Outcome of reconciling one playlist snapshot, in playlist order
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub items: Vec<PlannedEntry>,
    pub tally: ReconcileTally,
}

impl Reconciliation {
    pub fn decisions(&self) -> Vec<DownloadDecision> {
        self.items.iter().map(|item| item.decision).collect()
    }

    /// Items the fetch orchestrator must process
    pub fn pending(&self) -> impl Iterator<Item = &PlannedEntry> {
        self.items.iter().filter(|item| item.decision.requires_fetch())
    }
}

/// Where an entry's converted file is expected to live
pub fn expected_path(entry: &Entry, destination_dir: &Path, audio_format: AudioFormat) -> PathBuf {
    destination_dir.join(format!(
        "{}.{}",
        entry.file_stem(),
        audio_format.file_extension()
    ))
}

/// Reconciles playlist entries against one destination's ledger and files
pub struct Reconciler<'a> {
    ledger: &'a mut LedgerStore,
    destination_dir: &'a Path,
    audio_format: AudioFormat,
    redownload_missing: bool,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        ledger: &'a mut LedgerStore,
        destination_dir: &'a Path,
        audio_format: AudioFormat,
        redownload_missing: bool,
    ) -> Self {
        Self {
            ledger,
            destination_dir,
            audio_format,
            redownload_missing,
        }
    }

    /// Classify one entry, removing its ledger record when a missing file
    /// is going to be replayed.
    pub fn decide(&mut self, entry: &Entry, expected_path: &Path) -> DownloadDecision {
        let title = entry.display_title();

        // Untracked entries cannot be attributed to a file, always attempt them.
        let Some(tag) = entry.ledger_tag() else {
            return DownloadDecision::Download;
        };

        if !self.ledger.contains(&tag) {
            return DownloadDecision::Download;
        }

        if expected_path.exists() {
            return DownloadDecision::Skip;
        }

        if !self.redownload_missing {
            info!("⏩ Skipping missing file (listed as downloaded): {}", title);
            return DownloadDecision::SkipMissing;
        }

        if let Err(e) = self.ledger.remove(&tag) {
            warn!(
                "⚠️  Could not remove {} from {}: {}",
                tag,
                self.ledger.path().display(),
                e
            );
        }
        info!("🔁 Will re-download missing file: {}", title);
        DownloadDecision::Redownload
    }

    /// Reconcile a whole playlist snapshot, preserving its order
    pub fn reconcile(&mut self, entries: &[Entry]) -> Reconciliation {
        let total = entries.len();
        let mut result = Reconciliation::default();
        let mut claimed_paths: HashMap<PathBuf, String> = HashMap::new();

        for (index, entry) in entries.iter().enumerate() {
            let expected = expected_path(entry, self.destination_dir, self.audio_format);
            info!("[{}/{}] Checking: {}", index + 1, total, entry.display_title());

            if let Some(previous) = claimed_paths.insert(expected.clone(), entry.title.clone()) {
                warn!(
                    "⚠️  \"{}\" and \"{}\" both map to {}; the later one overwrites",
                    previous,
                    entry.title,
                    expected.display()
                );
            }

            let decision = self.decide(entry, &expected);
            result.tally.record(decision);
            result.items.push(PlannedEntry {
                entry: entry.clone(),
                decision,
                expected_path: expected,
            });
        }

        result
    }
}

/// Convenience wrapper around [`Reconciler::reconcile`]
pub fn reconcile(
    entries: &[Entry],
    ledger: &mut LedgerStore,
    destination_dir: &Path,
    audio_format: AudioFormat,
    redownload_missing: bool,
) -> Reconciliation {
    Reconciler::new(ledger, destination_dir, audio_format, redownload_missing).reconcile(entries)
}
