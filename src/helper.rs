use std::{
    path::Path,
    sync::atomic::{AtomicU64, Ordering},
};

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{NaiveDate, Utc};
use log::error;

use crate::{CnError, Result};

/// Returns today's day key as `YYYY-MM-DD`.
///
/// Day keys are derived from the UTC clock, matching the keys stored in the
/// archive document.
pub fn today_string() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// Validates a `YYYY-MM-DD` day key, returning the parsed date.
pub fn parse_date_key(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| CnError::InvalidDate {
        value: value.to_string(),
    })
}

/// Generates an identifier from the current timestamp and a process-local
/// sequence number. Unique within a process even when called in a tight loop.
pub fn generate_id() -> String {
    static SEQ: AtomicU64 = AtomicU64::new(0);
    let seq = SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{}-{:04}", Utc::now().timestamp_millis(), seq)
}

// Helper method for parsing tags
pub fn parse_tags(tags: Option<String>) -> Vec<String> {
    tags.map(|t| {
        t.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

/// Reads an image file and encodes it as an inline `data:` URL, the form
/// image payloads take inside the archive document.
pub fn encode_image_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| {
        error!("Failed to read image file {}: {}", path.display(), e);
        CnError::Io(e)
    })?;

    let mime = match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    };

    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tags_splits_and_trims() {
        let tags = parse_tags(Some(" ideas, love ,, health".to_string()));
        assert_eq!(tags, vec!["ideas", "love", "health"]);
        assert!(parse_tags(None).is_empty());
    }

    #[test]
    fn date_key_validation() {
        assert!(parse_date_key("2024-01-31").is_ok());
        assert!(parse_date_key("2024-02-30").is_err());
        assert!(parse_date_key("not-a-date").is_err());
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
    }
}
