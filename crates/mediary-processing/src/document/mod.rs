//! Document processing module
//!
//! Conversion of office documents into the canonical PDF format, metadata
//! stripping and best-effort page counting, all through external tools.

pub mod transcoder;

pub use transcoder::{DocumentTranscoder, NormalizedDocument};
