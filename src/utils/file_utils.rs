//! File system utilities

use regex::Regex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::core::models::AppResult;

fn decoration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?is)\s*\[(.*?)\]|\s*\((.*?)\)").expect("decoration pattern is valid")
    })
}

fn forbidden_chars_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"[\\/:*?"<>|]"#).expect("forbidden pattern is valid"))
}

fn whitespace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

/// Normalize a raw remote title into a filesystem-safe filename stem.
///
/// Bracketed and parenthesized decorations are dropped, then path-illegal
/// characters, then whitespace runs collapse to one space. The result may be
/// empty for an all-decoration title.
pub fn sanitize_title(raw: &str) -> String {
    let undecorated = decoration_pattern().replace_all(raw, "");
    let legal = forbidden_chars_pattern().replace_all(&undecorated, "");
    let collapsed = whitespace_pattern().replace_all(&legal, " ");
    collapsed.trim().to_string()
}

/// Escape a literal path fragment for use inside a yt-dlp output template
pub fn escape_output_template(fragment: &str) -> String {
    fragment.replace('%', "%%")
}

/// Ensure directory exists
pub fn ensure_dir_exists(path: &Path) -> AppResult<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Replace `path` with `contents` via a sibling temp file and a rename, so
/// readers never observe a half-written file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> AppResult<()> {
    let tmp_path = temp_sibling(path);

    let result = (|| -> AppResult<()> {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Whether a regular, non-empty file exists at `path`
pub fn is_nonempty_file(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.len() > 0)
        .unwrap_or(false)
}
