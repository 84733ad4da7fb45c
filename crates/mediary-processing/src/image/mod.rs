//! Image processing module
//!
//! This module normalizes uploaded images into the canonical web format and
//! generates the configured ladder of resized derivatives:
//! - Decoding, EXIF orientation correction and re-encoding (transcoder, orientation)
//! - Size ladder and center-crop/resize rules (ladder)

pub mod ladder;
pub mod orientation;
pub mod transcoder;

pub use ladder::{DerivativeImage, SizeLadder, SizeSpec, ORIGINAL_LABEL, SIZE_LADDER};
pub use orientation::ImageOrientation;
pub use transcoder::{ImageTranscoder, NormalizedImage};
