//! Artifact persistence: the `ArtifactRecorder` contract, a PostgreSQL
//! implementation, and an in-memory implementation for tests.
//!
//! `record` is the write path of the ingestion pipeline. It is transactional
//! and resolves unique-content-hash conflicts to the already-recorded
//! artifact instead of failing, so two concurrent uploads of identical bytes
//! converge on one row.

pub mod memory;
pub mod postgres;
pub mod recorder;

pub use memory::InMemoryRecorder;
pub use postgres::PgArtifactRecorder;
pub use recorder::{ArtifactRecord, ArtifactRecorder, RecordOutcome, RecorderError};

/// Embedded schema migrations, applied via `PgArtifactRecorder::migrate`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");
