//! Mediary Storage Library
//!
//! This crate provides the storage abstraction used by the ingestion pipeline
//! and its local filesystem implementation.
//!
//! # Storage key format
//!
//! Storage keys are relative paths under the storage root, e.g.
//! `uploads/2024/06/{filename}`. Keys must not contain `..` or a leading `/`.
//! Key generation lives with the pipeline; backends only validate and resolve.

pub mod local;
pub mod traits;

// Re-export commonly used types
pub use local::LocalStorage;
pub use traits::{Storage, StorageError, StorageResult};
