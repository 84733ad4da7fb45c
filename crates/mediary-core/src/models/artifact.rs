use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Media family an upload is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "media_family", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum MediaFamily {
    Image,
    Video,
    Audio,
    Document,
}

impl MediaFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaFamily::Image => "image",
            MediaFamily::Video => "video",
            MediaFamily::Audio => "audio",
            MediaFamily::Document => "document",
        }
    }
}

impl fmt::Display for MediaFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(MediaFamily::Image),
            "video" => Ok(MediaFamily::Video),
            "audio" => Ok(MediaFamily::Audio),
            "document" => Ok(MediaFamily::Document),
            other => Err(format!("unknown media family: {}", other)),
        }
    }
}

/// Canonical record of one deduplicated upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Artifact {
    pub id: Uuid,
    /// Generated storage filename (hash-prefixed, processed extension).
    pub filename: String,
    /// Sanitized name the file was uploaded under.
    pub original_filename: String,
    /// MIME type of the normalized output, not of the upload.
    pub content_type: String,
    pub file_size: i64,
    /// SHA-256 hex digest of the raw upload bytes; unique across artifacts.
    pub content_hash: String,
    pub storage_path: String,
    pub url: String,
    pub storage_provider: String,
    pub family: MediaFamily,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub duration_seconds: Option<i32>,
    pub uploaded_by: i32,
    pub created_at: DateTime<Utc>,
}

/// Artifact fields known before recording assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct NewArtifact {
    pub filename: String,
    pub original_filename: String,
    pub content_type: String,
    pub file_size: i64,
    pub content_hash: String,
    pub storage_path: String,
    pub url: String,
    pub storage_provider: String,
    pub family: MediaFamily,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub duration_seconds: Option<i32>,
    pub uploaded_by: i32,
}

/// One resized variant of an image artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Derivative {
    pub id: Uuid,
    pub artifact_id: Uuid,
    /// Size label, unique per artifact ("thumbnail", "small", ..., "original").
    pub label: String,
    pub width: i32,
    pub height: i32,
    pub storage_path: String,
    pub url: String,
    pub file_size: i64,
}

/// Derivative fields known before recording assigns ids.
#[derive(Debug, Clone)]
pub struct NewDerivative {
    pub label: String,
    pub width: i32,
    pub height: i32,
    pub storage_path: String,
    pub url: String,
    pub file_size: i64,
}
