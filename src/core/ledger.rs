//! Download ledger
//!
//! Per-destination text file recording which entries were successfully
//! produced, one `"<source-kind> <id>"` tag per line. The format is the same
//! as yt-dlp's download archive, so existing archives keep working and users
//! can edit the file by hand.
//!
//! A tag in the ledger only claims the file was produced once; the file may
//! since have been deleted or moved. Reconciliation resolves that divergence.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::models::AppResult;
use crate::utils::write_atomic;

/// Ledger file name inside every destination directory
pub const LEDGER_FILE_NAME: &str = "downloaded.txt";

/// Read/remove/append access to one destination's ledger file
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
    /// Raw lines as last read, kept verbatim for rewrites
    lines: Vec<String>,
}

impl LedgerStore {
    /// Open the ledger of a destination directory
    pub fn open(destination_dir: &Path) -> AppResult<Self> {
        Self::at(destination_dir.join(LEDGER_FILE_NAME))
    }

    /// Open a ledger at an explicit path. A missing file is an empty ledger.
    pub fn at(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let lines = read_lines(&path)?;
        debug!("📒 Loaded {} ledger lines from {}", lines.len(), path.display());
        Ok(Self { path, lines })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Exact match against trimmed lines
    pub fn contains(&self, tag: &str) -> bool {
        let tag = tag.trim();
        !tag.is_empty() && self.lines.iter().any(|line| line.trim() == tag)
    }

    /// Drop every line equal to `tag`. The file is re-read first so lines
    /// appended since the last load survive, then replaced atomically.
    /// Returns how many lines were removed.
    pub fn remove(&mut self, tag: &str) -> AppResult<usize> {
        let tag = tag.trim();
        let current = read_lines(&self.path)?;
        let before = current.len();
        let kept: Vec<String> = current
            .into_iter()
            .filter(|line| line.trim() != tag)
            .collect();
        let removed = before - kept.len();

        if removed > 0 {
            let mut contents = kept.join("\n");
            if !kept.is_empty() {
                contents.push('\n');
            }
            write_atomic(&self.path, contents.as_bytes())?;
            debug!("🗑️ Removed {} from {}", tag, self.path.display());
        }

        self.lines = kept;
        Ok(removed)
    }

    /// Record a produced entry. Creates the file when needed; an already
    /// present tag is not written twice.
    pub fn append(&mut self, tag: &str) -> AppResult<()> {
        let tag = tag.trim();
        if tag.is_empty() || self.contains(tag) {
            return Ok(());
        }

        let needs_newline = fs::read(&self.path)
            .map(|bytes| bytes.last().is_some_and(|b| *b != b'\n'))
            .unwrap_or(false);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if needs_newline {
            file.write_all(b"\n")?;
        }
        writeln!(file, "{}", tag)?;

        self.lines.push(tag.to_string());
        Ok(())
    }

    /// Non-blank tags in file order
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
    }

    pub fn len(&self) -> usize {
        self.tags().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn read_lines(path: &Path) -> AppResult<Vec<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content.lines().map(str::to_string).collect()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty_ledger() {
        let dir = tempdir().unwrap();
        let ledger = LedgerStore::open(dir.path()).unwrap();

        assert!(ledger.is_empty());
        assert!(!ledger.contains("youtube abc"));
        assert!(!ledger.path().exists());
    }

    #[test]
    fn test_contains_is_exact_not_substring() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(LEDGER_FILE_NAME), "youtube abcd\nyoutube xyz  \n").unwrap();
        let ledger = LedgerStore::open(dir.path()).unwrap();

        assert!(!ledger.contains("youtube abc"));
        assert!(ledger.contains("youtube abcd"));
        assert!(ledger.contains("youtube xyz"));
        assert!(!ledger.contains(""));
    }

    #[test]
    fn test_append_creates_file_and_skips_duplicates() {
        let dir = tempdir().unwrap();
        let mut ledger = LedgerStore::open(dir.path()).unwrap();

        ledger.append("youtube one").unwrap();
        ledger.append("youtube two").unwrap();
        ledger.append("youtube one").unwrap();

        let content = fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(content, "youtube one\nyoutube two\n");
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_append_after_unterminated_last_line() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(LEDGER_FILE_NAME), "youtube one").unwrap();
        let mut ledger = LedgerStore::open(dir.path()).unwrap();

        ledger.append("youtube two").unwrap();

        let content = fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(content, "youtube one\nyoutube two\n");
    }

    #[test]
    fn test_remove_keeps_other_lines() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(LEDGER_FILE_NAME),
            "youtube a\nyoutube ab\nyoutube a\nyoutube b\n",
        )
        .unwrap();
        let mut ledger = LedgerStore::open(dir.path()).unwrap();

        let removed = ledger.remove("youtube a").unwrap();

        assert_eq!(removed, 2);
        assert!(!ledger.contains("youtube a"));
        assert!(ledger.contains("youtube ab"));
        let content = fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(content, "youtube ab\nyoutube b\n");
    }

    #[test]
    fn test_remove_sees_lines_written_after_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LEDGER_FILE_NAME);
        fs::write(&path, "youtube a\n").unwrap();
        let mut ledger = LedgerStore::open(dir.path()).unwrap();

        fs::write(&path, "youtube a\nyoutube late\n").unwrap();
        ledger.remove("youtube a").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "youtube late\n");
        assert!(ledger.contains("youtube late"));
    }

    #[test]
    fn test_remove_absent_tag_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let mut ledger = LedgerStore::open(dir.path()).unwrap();

        assert_eq!(ledger.remove("youtube nope").unwrap(), 0);
        assert!(!ledger.path().exists());
    }
}
