//! Mediary Core Library
//!
//! This crate provides the domain models, error taxonomy, and configuration
//! shared across all Mediary components.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use error::{IngestError, LogLevel};
pub use models::{
    Artifact, Derivative, DescriptiveMetadata, MediaFamily, NewArtifact, NewDerivative,
};
