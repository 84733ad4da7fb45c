//! Ingestion orchestration: classify → dedup → transcode → store → record.

use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use chrono::Utc;
use image::GenericImageView;

use mediary_core::{
    Artifact, DescriptiveMetadata, IngestError, MediaFamily, NewArtifact, NewDerivative,
    PipelineConfig,
};
use mediary_db::{ArtifactRecord, ArtifactRecorder, RecordOutcome};
use mediary_processing::{
    classify_content_type, content_hash, extension_for, validate_size, AvTranscoder,
    DocumentTranscoder, ImageTranscoder, MediaProbe, ProcessRunner, SizeLadder,
};
use mediary_storage::Storage;

use crate::context::IngestionContext;
use crate::filename::{
    derivative_filename, processed_mime, sanitize_filename, unique_filename, upload_prefix,
};

/// One upload to ingest.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub data: Bytes,
    /// Filename as the uploader supplied it; sanitized before storage.
    pub filename: String,
    /// MIME type as the uploader declared it.
    pub content_type: String,
    pub uploaded_by: i32,
    pub descriptive: Option<DescriptiveMetadata>,
}

/// Naming decisions for one ingestion, fixed before any bytes are written.
struct StoragePlan {
    prefix: String,
    filename: String,
    original_filename: String,
}

impl StoragePlan {
    fn new(request: &IngestRequest, content_hash: &str, family: MediaFamily) -> Self {
        let now = Utc::now();
        Self {
            prefix: upload_prefix(now),
            filename: unique_filename(content_hash, family, now),
            original_filename: sanitize_filename(&request.filename),
        }
    }

    fn key(&self) -> String {
        format!("{}/{}", self.prefix, self.filename)
    }

    fn derivative_key(&self, label: &str) -> String {
        format!("{}/{}", self.prefix, derivative_filename(&self.filename, label))
    }
}

/// Rows to record for one transcoded upload, plus the storage keys written
/// for them in case a concurrent duplicate makes the files redundant.
struct StoredUpload {
    artifact: NewArtifact,
    derivatives: Vec<NewDerivative>,
    written_keys: Vec<String>,
}

/// Orchestrates the full ingestion flow for every media family.
///
/// One instance serves concurrent ingestions; the only shared state is the
/// storage backend and the recorder, both of which tolerate concurrent
/// writers. Duplicate content is detected by hash before transcoding and
/// again at recording time, and both paths return the existing artifact
/// instead of an error.
pub struct MediaPipeline {
    config: PipelineConfig,
    pub(crate) storage: Arc<dyn Storage>,
    pub(crate) recorder: Arc<dyn ArtifactRecorder>,
    images: ImageTranscoder,
    av: AvTranscoder,
    documents: DocumentTranscoder,
}

impl MediaPipeline {
    pub fn new(
        config: PipelineConfig,
        storage: Arc<dyn Storage>,
        recorder: Arc<dyn ArtifactRecorder>,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        let images = ImageTranscoder::from_config(&config);
        let av = AvTranscoder::new(runner.clone(), &config);
        let documents = DocumentTranscoder::new(runner, &config);

        Self {
            config,
            storage,
            recorder,
            images,
            av,
            documents,
        }
    }

    /// Ingest one upload end to end and return its canonical artifact.
    ///
    /// The returned artifact may belong to an earlier upload of the same
    /// bytes; callers must not assume a fresh row.
    #[tracing::instrument(
        skip(self, request),
        fields(
            filename = %request.filename,
            content_type = %request.content_type,
            size_bytes = request.data.len(),
        )
    )]
    pub async fn ingest(&self, request: IngestRequest) -> Result<Artifact, IngestError> {
        let start = std::time::Instant::now();

        let family = classify_content_type(&request.content_type)?;
        validate_size(request.data.len(), family, &self.config)?;

        let hash = content_hash(&request.data);
        if let Some(existing) = self.recorder.find_by_hash(&hash).await? {
            tracing::info!(
                artifact_id = %existing.id,
                content_hash = %hash,
                "Content already ingested, returning existing artifact"
            );
            return Ok(existing);
        }

        tracing::info!(family = %family, content_hash = %hash, "Starting ingestion");
        let plan = StoragePlan::new(&request, &hash, family);

        let stored = match family {
            MediaFamily::Image => self.ingest_image(&request, &hash, &plan).await?,
            MediaFamily::Video | MediaFamily::Audio => {
                self.ingest_av(&request, family, &hash, &plan).await?
            }
            MediaFamily::Document => self.ingest_document(&request, &hash, &plan).await?,
        };

        let artifact = self.record(stored, request.descriptive).await?;

        tracing::info!(
            artifact_id = %artifact.id,
            family = %family,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Ingestion completed"
        );

        Ok(artifact)
    }

    /// Image flow: decode once, encode the normalized file and the size
    /// ladder from the same pixels, write everything straight to final
    /// storage. No temp files.
    async fn ingest_image(
        &self,
        request: &IngestRequest,
        hash: &str,
        plan: &StoragePlan,
    ) -> Result<StoredUpload, IngestError> {
        let img = self.images.decode(&request.data)?;
        let (width, height) = img.dimensions();

        let normalized = self.images.encode_webp(&img, self.images.quality());
        let ladder = SizeLadder::generate(&self.images, &img);

        self.ensure_prefix(&plan.prefix).await?;

        let key = plan.key();
        let file_size = normalized.len();
        let url = self.save(&key, normalized).await?;
        let mut written_keys = vec![key];

        let mut rows = Vec::with_capacity(ladder.len());
        for derivative in ladder {
            let derivative_key = plan.derivative_key(&derivative.label);
            let derivative_url = self.save(&derivative_key, derivative.data.clone()).await?;
            rows.push(NewDerivative {
                label: derivative.label,
                width: derivative.width as i32,
                height: derivative.height as i32,
                storage_path: derivative_key.clone(),
                url: derivative_url,
                file_size: derivative.data.len() as i64,
            });
            written_keys.push(derivative_key);
        }

        Ok(StoredUpload {
            artifact: NewArtifact {
                width: Some(width as i32),
                height: Some(height as i32),
                ..self.base_row(request, MediaFamily::Image, hash, plan, url, file_size)
            },
            derivatives: rows,
            written_keys,
        })
    }

    /// Video/audio flow: raw input goes to a temp file, the external
    /// transcoder writes a temp output, and the result is read back and
    /// stored. Temp files are removed before recording, whatever happened.
    async fn ingest_av(
        &self,
        request: &IngestRequest,
        family: MediaFamily,
        hash: &str,
        plan: &StoragePlan,
    ) -> Result<StoredUpload, IngestError> {
        self.av.ensure_available().await?;

        let mut ctx = IngestionContext::new()?;
        let transcoded = self.transcode_av(&mut ctx, request, family).await;
        ctx.cleanup().await;
        let (data, probe) = transcoded?;

        self.ensure_prefix(&plan.prefix).await?;

        let key = plan.key();
        let file_size = data.len();
        let url = self.save(&key, data).await?;

        Ok(StoredUpload {
            artifact: NewArtifact {
                width: probe.width.map(|w| w as i32),
                height: probe.height.map(|h| h as i32),
                duration_seconds: probe.duration_seconds.map(|d| d.round() as i32),
                ..self.base_row(request, family, hash, plan, url, file_size)
            },
            derivatives: Vec::new(),
            written_keys: vec![key],
        })
    }

    async fn transcode_av(
        &self,
        ctx: &mut IngestionContext,
        request: &IngestRequest,
        family: MediaFamily,
    ) -> Result<(Bytes, MediaProbe), IngestError> {
        let ext = extension_for(&request.content_type).unwrap_or("bin");
        let input_path = ctx
            .write_temp(&format!("input.{}", ext), &request.data)
            .await?;
        let output_path = ctx.temp_path("output.webm");

        let probe = match family {
            MediaFamily::Video => self.av.transcode_video(&input_path, &output_path).await?,
            _ => self.av.transcode_audio(&input_path, &output_path).await?,
        };

        let data = tokio::fs::read(&output_path)
            .await
            .with_context(|| format!("Failed to read transcoded output {}", output_path.display()))?;

        Ok((Bytes::from(data), probe))
    }

    /// Document flow: the document transcoder runs inside the scratch
    /// directory and hands back the normalized bytes.
    async fn ingest_document(
        &self,
        request: &IngestRequest,
        hash: &str,
        plan: &StoragePlan,
    ) -> Result<StoredUpload, IngestError> {
        self.documents
            .ensure_available(&request.content_type, &request.data)
            .await?;

        let ctx = IngestionContext::new()?;
        let normalized = self
            .documents
            .normalize(&request.data, &request.content_type, ctx.work_dir())
            .await;
        ctx.cleanup().await;
        let document = normalized?;

        self.ensure_prefix(&plan.prefix).await?;

        let key = plan.key();
        let file_size = document.data.len();
        let url = self.save(&key, document.data).await?;

        Ok(StoredUpload {
            artifact: self.base_row(request, MediaFamily::Document, hash, plan, url, file_size),
            derivatives: Vec::new(),
            written_keys: vec![key],
        })
    }

    /// Record the rows transactionally. A hash conflict means a concurrent
    /// ingestion of the same bytes won the race; its artifact is returned
    /// and our files are deleted as best effort.
    async fn record(
        &self,
        upload: StoredUpload,
        descriptive: Option<DescriptiveMetadata>,
    ) -> Result<Artifact, IngestError> {
        let written_keys = upload.written_keys;
        let record = ArtifactRecord {
            artifact: upload.artifact,
            derivatives: upload.derivatives,
            descriptive: descriptive.filter(|d| !d.is_empty()),
        };

        match self.recorder.record(record).await? {
            RecordOutcome::Created(artifact) => Ok(artifact),
            RecordOutcome::DuplicateHash(existing) => {
                tracing::info!(
                    artifact_id = %existing.id,
                    "Concurrent ingestion of the same content won, removing redundant files"
                );
                for key in &written_keys {
                    if let Err(e) = self.storage.delete(key).await {
                        tracing::warn!(key = %key, error = %e, "Failed to remove redundant file");
                    }
                }
                Ok(existing)
            }
        }
    }

    fn base_row(
        &self,
        request: &IngestRequest,
        family: MediaFamily,
        hash: &str,
        plan: &StoragePlan,
        url: String,
        file_size: usize,
    ) -> NewArtifact {
        NewArtifact {
            filename: plan.filename.clone(),
            original_filename: plan.original_filename.clone(),
            content_type: processed_mime(family).to_string(),
            file_size: file_size as i64,
            content_hash: hash.to_string(),
            storage_path: plan.key(),
            url,
            storage_provider: self.storage.provider().to_string(),
            family,
            width: None,
            height: None,
            duration_seconds: None,
            uploaded_by: request.uploaded_by,
        }
    }

    async fn ensure_prefix(&self, prefix: &str) -> Result<(), IngestError> {
        self.storage
            .ensure_dir(prefix)
            .await
            .map_err(|e| IngestError::storage_write(prefix, e))
    }

    async fn save(&self, key: &str, data: Bytes) -> Result<String, IngestError> {
        self.storage
            .save(key, data)
            .await
            .map_err(|e| IngestError::storage_write(key, e))
    }
}
