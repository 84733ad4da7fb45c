//! MIME type classification and upload size validation.

use mediary_core::{IngestError, MediaFamily, PipelineConfig};

/// Image formats the decoder supports.
pub const SUPPORTED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

pub const SUPPORTED_VIDEO_TYPES: &[&str] = &[
    "video/mp4",
    "video/mpeg",
    "video/quicktime",
    "video/x-msvideo",
    "video/x-matroska",
    "video/webm",
];

pub const SUPPORTED_AUDIO_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/mp3",
    "audio/wav",
    "audio/ogg",
    "audio/webm",
    "audio/aac",
    "audio/flac",
];

pub const SUPPORTED_DOCUMENT_TYPES: &[&str] = &[
    "application/pdf",
    "text/plain",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

/// Normalize a MIME type for classification: trim, lowercase and drop any
/// parameters (`text/plain; charset=utf-8` classifies as `text/plain`).
fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase()
}

/// Classify a MIME type into its media family.
///
/// Types outside the allow-lists are rejected with `UnsupportedFormat`.
pub fn classify_content_type(content_type: &str) -> Result<MediaFamily, IngestError> {
    let normalized = normalize_content_type(content_type);

    if SUPPORTED_IMAGE_TYPES.contains(&normalized.as_str()) {
        Ok(MediaFamily::Image)
    } else if SUPPORTED_VIDEO_TYPES.contains(&normalized.as_str()) {
        Ok(MediaFamily::Video)
    } else if SUPPORTED_AUDIO_TYPES.contains(&normalized.as_str()) {
        Ok(MediaFamily::Audio)
    } else if SUPPORTED_DOCUMENT_TYPES.contains(&normalized.as_str()) {
        Ok(MediaFamily::Document)
    } else {
        Err(IngestError::UnsupportedFormat {
            content_type: content_type.to_string(),
        })
    }
}

/// Validate an upload's byte length against the per-family limit.
pub fn validate_size(
    size: usize,
    family: MediaFamily,
    config: &PipelineConfig,
) -> Result<(), IngestError> {
    let max = config.max_bytes(family);
    if size > max {
        return Err(IngestError::FileTooLarge { size, max });
    }
    Ok(())
}

/// File extension conventionally used for a supported MIME type.
///
/// Used to name temporary input files so external tools can rely on the
/// extension for format detection.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    let normalized = normalize_content_type(content_type);
    let ext = match normalized.as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "video/mp4" => "mp4",
        "video/mpeg" => "mpg",
        "video/quicktime" => "mov",
        "video/x-msvideo" => "avi",
        "video/x-matroska" => "mkv",
        "video/webm" => "webm",
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/wav" => "wav",
        "audio/ogg" => "ogg",
        "audio/webm" => "weba",
        "audio/aac" => "aac",
        "audio/flac" => "flac",
        "application/pdf" => "pdf",
        "text/plain" => "txt",
        "application/msword" => "doc",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "docx",
        "application/vnd.ms-excel" => "xls",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => "xlsx",
        _ => return None,
    };
    Some(ext)
}
