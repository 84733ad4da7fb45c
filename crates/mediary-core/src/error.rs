//! Error taxonomy for the ingestion pipeline.
//!
//! Input errors (`UnsupportedFormat`, `FileTooLarge`, `InvalidImage`) are
//! caller-fixable and never retried. `DependencyMissing` flags a broken
//! deployment rather than a bad upload. `TranscodeFailed`, `TranscodeTimeout`
//! and `StorageWriteFailed` are transient; retrying is a caller decision.
//! Duplicate uploads are not an error anywhere in this taxonomy.

/// Log level an error should be reported at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected errors such as validation failures.
    Debug,
    /// Recoverable issues such as timeouts.
    Warn,
    /// Unexpected failures.
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Unsupported media type: {content_type}")]
    UnsupportedFormat { content_type: String },

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid image data: {reason}")]
    InvalidImage { reason: String },

    #[error("Required external tool not available: {tool}")]
    DependencyMissing { tool: String },

    #[error("{tool} failed: {detail}")]
    TranscodeFailed { tool: String, detail: String },

    #[error("{tool} timed out after {timeout_secs}s")]
    TranscodeTimeout { tool: String, timeout_secs: u64 },

    #[error("Failed to write {path}")]
    StorageWriteFailed {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Static metadata per variant: (http_status, error_code, retryable, log_level).
/// client_message stays per-variant because some variants expose their
/// Display text while others must hide process diagnostics.
fn ingest_error_static_metadata(err: &IngestError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        IngestError::UnsupportedFormat { .. } => {
            (415, "UNSUPPORTED_FORMAT", false, LogLevel::Debug)
        }
        IngestError::FileTooLarge { .. } => (413, "FILE_TOO_LARGE", false, LogLevel::Debug),
        IngestError::InvalidImage { .. } => (400, "INVALID_IMAGE", false, LogLevel::Warn),
        IngestError::DependencyMissing { .. } => {
            (503, "DEPENDENCY_MISSING", false, LogLevel::Error)
        }
        IngestError::TranscodeFailed { .. } => (500, "TRANSCODE_FAILED", true, LogLevel::Error),
        IngestError::TranscodeTimeout { .. } => (504, "TRANSCODE_TIMEOUT", true, LogLevel::Warn),
        IngestError::StorageWriteFailed { .. } => {
            (500, "STORAGE_WRITE_FAILED", true, LogLevel::Error)
        }
        IngestError::Internal(_) => (500, "INTERNAL_ERROR", true, LogLevel::Error),
    }
}

impl IngestError {
    pub fn invalid_image(reason: impl Into<String>) -> Self {
        IngestError::InvalidImage {
            reason: reason.into(),
        }
    }

    pub fn dependency_missing(tool: impl Into<String>) -> Self {
        IngestError::DependencyMissing { tool: tool.into() }
    }

    pub fn storage_write(path: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        IngestError::StorageWriteFailed {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn internal(source: impl Into<anyhow::Error>) -> Self {
        IngestError::Internal(source.into())
    }

    /// HTTP status an API layer should map this error to.
    pub fn http_status_code(&self) -> u16 {
        ingest_error_static_metadata(self).0
    }

    /// Machine-readable error code (e.g. "TRANSCODE_TIMEOUT").
    pub fn error_code(&self) -> &'static str {
        ingest_error_static_metadata(self).1
    }

    /// Whether the caller may retry the request as-is.
    pub fn is_retryable(&self) -> bool {
        ingest_error_static_metadata(self).2
    }

    pub fn log_level(&self) -> LogLevel {
        ingest_error_static_metadata(self).3
    }

    /// Message safe to return to the uploader. Process diagnostics (stderr,
    /// internal paths) stay in the logs.
    pub fn client_message(&self) -> String {
        match self {
            IngestError::UnsupportedFormat { .. }
            | IngestError::FileTooLarge { .. }
            | IngestError::InvalidImage { .. } => self.to_string(),
            IngestError::DependencyMissing { .. } => {
                "Media processing is not available for this file type".to_string()
            }
            IngestError::TranscodeFailed { .. } => "Media conversion failed".to_string(),
            IngestError::TranscodeTimeout { .. } => "Media conversion timed out".to_string(),
            IngestError::StorageWriteFailed { .. } => {
                "Failed to store the processed file".to_string()
            }
            IngestError::Internal(_) => "Internal server error".to_string(),
        }
    }
}
