//! In-memory artifact recorder for tests and embedded use.

use async_trait::async_trait;
use chrono::Utc;
use mediary_core::{Artifact, Derivative, DescriptiveMetadata};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::recorder::{ArtifactRecord, ArtifactRecorder, RecordOutcome, RecorderError};

#[derive(Default)]
struct Inner {
    artifacts: Vec<Artifact>,
    derivatives: Vec<Derivative>,
    descriptive: HashMap<Uuid, DescriptiveMetadata>,
}

/// Recorder keeping everything in process memory.
///
/// Emulates the unique content-hash constraint so dedup behavior matches the
/// PostgreSQL implementation.
#[derive(Default)]
pub struct InMemoryRecorder {
    inner: Mutex<Inner>,
}

impl InMemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArtifactRecorder for InMemoryRecorder {
    async fn find_by_hash(&self, content_hash: &str) -> Result<Option<Artifact>, RecorderError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .artifacts
            .iter()
            .find(|a| a.content_hash == content_hash)
            .cloned())
    }

    async fn record(&self, record: ArtifactRecord) -> Result<RecordOutcome, RecorderError> {
        let mut inner = self.inner.lock().await;

        if let Some(existing) = inner
            .artifacts
            .iter()
            .find(|a| a.content_hash == record.artifact.content_hash)
        {
            return Ok(RecordOutcome::DuplicateHash(existing.clone()));
        }

        let new = record.artifact;
        let artifact = Artifact {
            id: Uuid::new_v4(),
            filename: new.filename,
            original_filename: new.original_filename,
            content_type: new.content_type,
            file_size: new.file_size,
            content_hash: new.content_hash,
            storage_path: new.storage_path,
            url: new.url,
            storage_provider: new.storage_provider,
            family: new.family,
            width: new.width,
            height: new.height,
            duration_seconds: new.duration_seconds,
            uploaded_by: new.uploaded_by,
            created_at: Utc::now(),
        };

        for derivative in record.derivatives {
            inner.derivatives.push(Derivative {
                id: Uuid::new_v4(),
                artifact_id: artifact.id,
                label: derivative.label,
                width: derivative.width,
                height: derivative.height,
                storage_path: derivative.storage_path,
                url: derivative.url,
                file_size: derivative.file_size,
            });
        }

        if let Some(meta) = record.descriptive {
            inner.descriptive.insert(artifact.id, meta);
        }

        inner.artifacts.push(artifact.clone());
        Ok(RecordOutcome::Created(artifact))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Artifact>, RecorderError> {
        let inner = self.inner.lock().await;
        Ok(inner.artifacts.iter().find(|a| a.id == id).cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Artifact>, RecorderError> {
        let inner = self.inner.lock().await;
        let mut artifacts = inner.artifacts.clone();
        artifacts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(artifacts
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn derivatives_for(&self, artifact_id: Uuid) -> Result<Vec<Derivative>, RecorderError> {
        let inner = self.inner.lock().await;
        let mut derivatives: Vec<Derivative> = inner
            .derivatives
            .iter()
            .filter(|d| d.artifact_id == artifact_id)
            .cloned()
            .collect();
        derivatives.sort_by(|a, b| b.width.cmp(&a.width));
        Ok(derivatives)
    }

    async fn descriptive_for(
        &self,
        artifact_id: Uuid,
    ) -> Result<Option<DescriptiveMetadata>, RecorderError> {
        let inner = self.inner.lock().await;
        Ok(inner.descriptive.get(&artifact_id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RecorderError> {
        let mut inner = self.inner.lock().await;
        let before = inner.artifacts.len();
        inner.artifacts.retain(|a| a.id != id);
        let existed = inner.artifacts.len() < before;
        if existed {
            inner.derivatives.retain(|d| d.artifact_id != id);
            inner.descriptive.remove(&id);
        }
        Ok(existed)
    }

    async fn upsert_descriptive(
        &self,
        artifact_id: Uuid,
        meta: DescriptiveMetadata,
    ) -> Result<(), RecorderError> {
        let mut inner = self.inner.lock().await;
        inner.descriptive.insert(artifact_id, meta);
        Ok(())
    }
}
