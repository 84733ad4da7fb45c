//! Video and audio processing module
//!
//! Transcoding into the canonical web container and stream inspection, both
//! delegated to external tools through the process runner.

pub mod probe;
pub mod transcoder;

pub use probe::MediaProbe;
pub use transcoder::AvTranscoder;
