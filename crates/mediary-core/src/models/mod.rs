//! Domain models for ingested media.

mod artifact;
mod descriptive;

pub use artifact::{Artifact, Derivative, MediaFamily, NewArtifact, NewDerivative};
pub use descriptive::DescriptiveMetadata;
