//! Mediary Pipeline Library
//!
//! This crate ties the processing, storage and recording layers together
//! into the ingestion orchestrator: one call takes raw upload bytes through
//! classification, content-hash deduplication, family-specific transcoding,
//! derivative generation and transactional recording. It also hosts the
//! management operations over recorded artifacts.

pub mod context;
pub mod filename;
pub mod manage;
pub mod pipeline;

// Re-export commonly used types
pub use context::IngestionContext;
pub use manage::ArtifactDetails;
pub use pipeline::{IngestRequest, MediaPipeline};
