//! Management operations over recorded artifacts.

use serde::Serialize;
use uuid::Uuid;

use mediary_core::{Artifact, Derivative, DescriptiveMetadata, IngestError};

use crate::pipeline::MediaPipeline;

/// An artifact with its satellite rows, as served to management callers.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactDetails {
    pub artifact: Artifact,
    pub derivatives: Vec<Derivative>,
    pub descriptive: Option<DescriptiveMetadata>,
}

impl MediaPipeline {
    /// Fetch one artifact together with its derivatives and descriptive
    /// metadata.
    pub async fn get_artifact(&self, id: Uuid) -> Result<Option<ArtifactDetails>, IngestError> {
        let Some(artifact) = self.recorder.get(id).await? else {
            return Ok(None);
        };

        let derivatives = self.recorder.derivatives_for(id).await?;
        let descriptive = self.recorder.descriptive_for(id).await?;

        Ok(Some(ArtifactDetails {
            artifact,
            derivatives,
            descriptive,
        }))
    }

    /// Newest-first page of artifacts.
    pub async fn list_artifacts(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Artifact>, IngestError> {
        Ok(self.recorder.list(limit, offset).await?)
    }

    /// Delete an artifact, its satellite rows and every stored file.
    ///
    /// File deletion is best-effort: a file that cannot be removed is logged
    /// and left for the orphan sweep, and the rows go away regardless.
    /// Returns false when no such artifact exists.
    #[tracing::instrument(skip(self), fields(artifact_id = %id))]
    pub async fn delete_artifact(&self, id: Uuid) -> Result<bool, IngestError> {
        let Some(artifact) = self.recorder.get(id).await? else {
            return Ok(false);
        };
        let derivatives = self.recorder.derivatives_for(id).await?;

        let mut keys = Vec::with_capacity(derivatives.len() + 1);
        keys.push(artifact.storage_path);
        keys.extend(derivatives.into_iter().map(|d| d.storage_path));

        for key in &keys {
            if let Err(e) = self.storage.delete(key).await {
                tracing::warn!(key = %key, error = %e, "Failed to delete stored file");
            }
        }

        let deleted = self.recorder.delete(id).await?;
        if deleted {
            tracing::info!(file_count = keys.len(), "Artifact deleted");
        }
        Ok(deleted)
    }

    /// Attach or replace the descriptive metadata of an artifact.
    ///
    /// Returns false when no such artifact exists.
    pub async fn set_descriptive_metadata(
        &self,
        id: Uuid,
        meta: DescriptiveMetadata,
    ) -> Result<bool, IngestError> {
        if self.recorder.get(id).await?.is_none() {
            return Ok(false);
        }

        self.recorder.upsert_descriptive(id, meta).await?;
        tracing::info!(artifact_id = %id, "Descriptive metadata updated");
        Ok(true)
    }
}
