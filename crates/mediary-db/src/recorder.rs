//! The artifact persistence contract.

use async_trait::async_trait;
use mediary_core::{
    Artifact, Derivative, DescriptiveMetadata, IngestError, NewArtifact, NewDerivative,
};
use uuid::Uuid;

/// Everything one ingestion persists: the canonical artifact row, its
/// derivative rows, and optional descriptive metadata.
#[derive(Debug, Clone)]
pub struct ArtifactRecord {
    pub artifact: NewArtifact,
    pub derivatives: Vec<NewDerivative>,
    pub descriptive: Option<DescriptiveMetadata>,
}

/// Result of `record`.
///
/// `DuplicateHash` carries the artifact that already owned the content hash;
/// the caller's freshly written files are then redundant and should be
/// removed.
#[derive(Debug, Clone)]
pub enum RecordOutcome {
    Created(Artifact),
    DuplicateHash(Artifact),
}

impl RecordOutcome {
    pub fn artifact(&self) -> &Artifact {
        match self {
            RecordOutcome::Created(artifact) => artifact,
            RecordOutcome::DuplicateHash(artifact) => artifact,
        }
    }

    pub fn into_artifact(self) -> Artifact {
        match self {
            RecordOutcome::Created(artifact) => artifact,
            RecordOutcome::DuplicateHash(artifact) => artifact,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, RecordOutcome::DuplicateHash(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<RecorderError> for IngestError {
    fn from(e: RecorderError) -> Self {
        IngestError::internal(anyhow::Error::new(e))
    }
}

/// Persistence operations for artifacts and their satellite rows.
///
/// `record` is transactional: either the artifact, all derivatives and the
/// descriptive row land together, or nothing does. A concurrent insert of
/// the same content hash must not fail the call; implementations resolve it
/// to `RecordOutcome::DuplicateHash` with the surviving artifact.
#[async_trait]
pub trait ArtifactRecorder: Send + Sync {
    async fn find_by_hash(&self, content_hash: &str) -> Result<Option<Artifact>, RecorderError>;

    async fn record(&self, record: ArtifactRecord) -> Result<RecordOutcome, RecorderError>;

    async fn get(&self, id: Uuid) -> Result<Option<Artifact>, RecorderError>;

    /// Newest-first page of artifacts.
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Artifact>, RecorderError>;

    async fn derivatives_for(&self, artifact_id: Uuid) -> Result<Vec<Derivative>, RecorderError>;

    async fn descriptive_for(
        &self,
        artifact_id: Uuid,
    ) -> Result<Option<DescriptiveMetadata>, RecorderError>;

    /// Delete an artifact and, by cascade, its derivatives and descriptive
    /// metadata. Returns whether a row existed.
    async fn delete(&self, id: Uuid) -> Result<bool, RecorderError>;

    /// Insert or fully replace the descriptive metadata of an artifact.
    async fn upsert_descriptive(
        &self,
        artifact_id: Uuid,
        meta: DescriptiveMetadata,
    ) -> Result<(), RecorderError>;
}
