//! URL and input validation utilities

use url::Url;

use crate::core::models::{AppError, AppResult};

/// Validate if URL is well formed
pub fn validate_url(url: &str) -> AppResult<Url> {
    Url::parse(url.trim())
        .map_err(|e| AppError::Configuration(format!("Invalid URL format: {}", e)))
}

/// Check if the reference is an http(s) URL. yt-dlp also accepts other
/// references (search prefixes, bare ids), so callers only warn on `false`.
pub fn is_web_url(reference: &str) -> bool {
    match validate_url(reference) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Trimmed, non-empty value or `None`
pub fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
