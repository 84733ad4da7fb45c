//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// All storage backends must implement this trait. This allows the pipeline
/// and the artifact recorder to work with any backend without coupling to
/// implementation details.
///
/// **Key format:** Keys are relative paths under the storage root, e.g.
/// `uploads/2024/06/{filename}`. See the crate root documentation.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write a file at the given storage key, creating parent directories as
    /// needed, and return the publicly accessible URL for it.
    async fn save(&self, storage_key: &str, data: Bytes) -> StorageResult<String>;

    /// Read a file by its storage key.
    async fn read(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Delete a file by its storage key.
    ///
    /// Deleting a key that does not exist is not an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Ensure a directory prefix exists under the storage root.
    async fn ensure_dir(&self, prefix: &str) -> StorageResult<()>;

    /// Check if a file exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Public URL for a storage key, without touching the filesystem.
    fn url_for(&self, storage_key: &str) -> String;

    /// Identifier of the storage backend, recorded alongside each artifact.
    fn provider(&self) -> &'static str;
}
