//! Storage naming for ingested uploads.
//!
//! Uploaded filenames are untrusted input and never reach the filesystem;
//! the stored name is derived from the content hash, and the sanitized
//! upload name is kept as display metadata only.

use chrono::{DateTime, Utc};

use mediary_core::MediaFamily;

/// Longest sanitized stem kept from an uploaded filename.
const MAX_STEM_CHARS: usize = 50;

/// Number of content-hash characters used in generated filenames.
const HASH_PREFIX_LEN: usize = 16;

/// Sanitize an uploaded filename into display metadata.
///
/// Directory components are dropped, the rest is lowercased, every run of
/// characters outside `[a-z0-9._-]` collapses to a single dash, dashes are
/// trimmed from the ends and the stem is capped at `MAX_STEM_CHARS`
/// characters. A name with nothing left becomes `file`.
pub fn sanitize_filename(filename: &str) -> String {
    let base = std::path::Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    let mut cleaned = String::with_capacity(base.len());
    let mut in_run = false;
    for c in base.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-') {
            cleaned.push(c);
            in_run = false;
        } else if !in_run {
            cleaned.push('-');
            in_run = true;
        }
    }

    let cleaned = cleaned.trim_matches('-');
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        return "file".to_string();
    }

    let (stem, ext) = match cleaned.rfind('.') {
        Some(idx) if idx > 0 => cleaned.split_at(idx),
        _ => (cleaned, ""),
    };

    let capped: String = stem.chars().take(MAX_STEM_CHARS).collect();
    format!("{}{}", capped.trim_end_matches('-'), ext)
}

/// Generate the stored filename for an upload: a content-hash prefix, the
/// ingestion timestamp in milliseconds, and the extension of the family's
/// normalized format.
pub fn unique_filename(content_hash: &str, family: MediaFamily, now: DateTime<Utc>) -> String {
    let hash_prefix: String = content_hash.chars().take(HASH_PREFIX_LEN).collect();
    format!(
        "{}_{}{}",
        hash_prefix,
        now.timestamp_millis(),
        processed_extension(family)
    )
}

/// Insert a size label before the extension: `a.webp` → `a-thumbnail.webp`.
pub fn derivative_filename(filename: &str, label: &str) -> String {
    match filename.rfind('.') {
        Some(idx) => format!("{}-{}{}", &filename[..idx], label, &filename[idx..]),
        None => format!("{}-{}", filename, label),
    }
}

/// Dated storage prefix uploads are grouped under.
pub fn upload_prefix(now: DateTime<Utc>) -> String {
    format!("uploads/{}", now.format("%Y/%m"))
}

/// Extension of the normalized format each family is stored in.
pub fn processed_extension(family: MediaFamily) -> &'static str {
    match family {
        MediaFamily::Image => ".webp",
        MediaFamily::Video | MediaFamily::Audio => ".webm",
        MediaFamily::Document => ".pdf",
    }
}

/// MIME type of the normalized format each family is stored in.
pub fn processed_mime(family: MediaFamily) -> &'static str {
    match family {
        MediaFamily::Image => "image/webp",
        MediaFamily::Video => "video/webm",
        MediaFamily::Audio => "audio/webm",
        MediaFamily::Document => "application/pdf",
    }
}
