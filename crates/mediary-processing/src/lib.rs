//! Mediary Processing Library
//!
//! This crate provides the per-family media processing for the ingestion
//! pipeline: content hashing, MIME classification, image normalization and
//! derivative generation, and external-tool transcoding for video, audio
//! and documents.

pub mod classifier;
pub mod hasher;
pub mod runner;

#[cfg(feature = "image")]
pub mod image;

#[cfg(any(feature = "video", feature = "audio"))]
pub mod av;

#[cfg(feature = "document")]
pub mod document;

// Re-export commonly used types
pub use classifier::{classify_content_type, extension_for, validate_size};
pub use hasher::content_hash;
pub use runner::{ProcessError, ProcessOutput, ProcessRunner, SystemProcessRunner};

#[cfg(feature = "image")]
pub use self::image::{
    DerivativeImage, ImageTranscoder, NormalizedImage, SizeLadder, SizeSpec, ORIGINAL_LABEL,
    SIZE_LADDER,
};

#[cfg(any(feature = "video", feature = "audio"))]
pub use av::{AvTranscoder, MediaProbe};

#[cfg(feature = "document")]
pub use document::{DocumentTranscoder, NormalizedDocument};
