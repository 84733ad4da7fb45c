//! PostgreSQL-backed artifact recorder.

use async_trait::async_trait;
use chrono::Utc;
use mediary_core::{Artifact, Derivative, DescriptiveMetadata};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres};
use std::time::Duration;
use uuid::Uuid;

use crate::recorder::{ArtifactRecord, ArtifactRecorder, RecordOutcome, RecorderError};

#[derive(Clone)]
pub struct PgArtifactRecorder {
    pool: PgPool,
}

impl PgArtifactRecorder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, RecorderError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Apply the embedded migrations.
    pub async fn migrate(&self) -> Result<(), RecorderError> {
        crate::MIGRATOR
            .run(&self.pool)
            .await
            .map_err(sqlx::Error::from)?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ArtifactRecorder for PgArtifactRecorder {
    #[tracing::instrument(skip(self), fields(db.table = "artifacts", db.operation = "select"))]
    async fn find_by_hash(&self, content_hash: &str) -> Result<Option<Artifact>, RecorderError> {
        let artifact = sqlx::query_as::<Postgres, Artifact>(
            "SELECT * FROM artifacts WHERE content_hash = $1",
        )
        .bind(content_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(artifact)
    }

    #[tracing::instrument(
        skip(self, record),
        fields(
            db.table = "artifacts",
            db.operation = "insert",
            content_hash = %record.artifact.content_hash
        )
    )]
    async fn record(&self, record: ArtifactRecord) -> Result<RecordOutcome, RecorderError> {
        let mut tx = self.pool.begin().await?;

        let new = &record.artifact;
        let inserted: Option<Artifact> = sqlx::query_as::<Postgres, Artifact>(
            r#"
            INSERT INTO artifacts (
                id, filename, original_filename, content_type, file_size,
                content_hash, storage_path, url, storage_provider, family,
                width, height, duration_seconds, uploaded_by, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (content_hash) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.filename)
        .bind(&new.original_filename)
        .bind(&new.content_type)
        .bind(new.file_size)
        .bind(&new.content_hash)
        .bind(&new.storage_path)
        .bind(&new.url)
        .bind(&new.storage_provider)
        .bind(new.family)
        .bind(new.width)
        .bind(new.height)
        .bind(new.duration_seconds)
        .bind(new.uploaded_by)
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(artifact) = inserted else {
            // Another writer owns this hash. Their row is the artifact of
            // record; ours never existed.
            tx.rollback().await?;
            let existing = sqlx::query_as::<Postgres, Artifact>(
                "SELECT * FROM artifacts WHERE content_hash = $1",
            )
            .bind(&new.content_hash)
            .fetch_one(&self.pool)
            .await?;
            tracing::info!(
                artifact_id = %existing.id,
                "Concurrent upload of the same content, returning existing artifact"
            );
            return Ok(RecordOutcome::DuplicateHash(existing));
        };

        for derivative in &record.derivatives {
            sqlx::query(
                r#"
                INSERT INTO derivatives (
                    id, artifact_id, label, width, height, storage_path, url, file_size
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(artifact.id)
            .bind(&derivative.label)
            .bind(derivative.width)
            .bind(derivative.height)
            .bind(&derivative.storage_path)
            .bind(&derivative.url)
            .bind(derivative.file_size)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(meta) = &record.descriptive {
            sqlx::query(
                r#"
                INSERT INTO descriptive_metadata (
                    artifact_id, alt_text, title, caption, description,
                    focus_keyword, credits, copyright
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(artifact.id)
            .bind(&meta.alt_text)
            .bind(&meta.title)
            .bind(&meta.caption)
            .bind(&meta.description)
            .bind(&meta.focus_keyword)
            .bind(&meta.credits)
            .bind(&meta.copyright)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            artifact_id = %artifact.id,
            derivative_count = record.derivatives.len(),
            "Artifact recorded"
        );

        Ok(RecordOutcome::Created(artifact))
    }

    #[tracing::instrument(skip(self), fields(db.table = "artifacts", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<Artifact>, RecorderError> {
        let artifact = sqlx::query_as::<Postgres, Artifact>("SELECT * FROM artifacts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(artifact)
    }

    #[tracing::instrument(skip(self), fields(db.table = "artifacts", db.operation = "select"))]
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Artifact>, RecorderError> {
        let artifacts = sqlx::query_as::<Postgres, Artifact>(
            "SELECT * FROM artifacts ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(artifacts)
    }

    #[tracing::instrument(skip(self), fields(db.table = "derivatives", db.operation = "select", db.record_id = %artifact_id))]
    async fn derivatives_for(&self, artifact_id: Uuid) -> Result<Vec<Derivative>, RecorderError> {
        let derivatives = sqlx::query_as::<Postgres, Derivative>(
            "SELECT * FROM derivatives WHERE artifact_id = $1 ORDER BY width DESC",
        )
        .bind(artifact_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(derivatives)
    }

    #[tracing::instrument(skip(self), fields(db.table = "descriptive_metadata", db.operation = "select", db.record_id = %artifact_id))]
    async fn descriptive_for(
        &self,
        artifact_id: Uuid,
    ) -> Result<Option<DescriptiveMetadata>, RecorderError> {
        let meta = sqlx::query_as::<Postgres, DescriptiveMetadata>(
            "SELECT * FROM descriptive_metadata WHERE artifact_id = $1",
        )
        .bind(artifact_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(meta)
    }

    #[tracing::instrument(skip(self), fields(db.table = "artifacts", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<bool, RecorderError> {
        let rows_affected = sqlx::query("DELETE FROM artifacts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows_affected > 0)
    }

    #[tracing::instrument(skip(self, meta), fields(db.table = "descriptive_metadata", db.operation = "upsert", db.record_id = %artifact_id))]
    async fn upsert_descriptive(
        &self,
        artifact_id: Uuid,
        meta: DescriptiveMetadata,
    ) -> Result<(), RecorderError> {
        sqlx::query(
            r#"
            INSERT INTO descriptive_metadata (
                artifact_id, alt_text, title, caption, description,
                focus_keyword, credits, copyright
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (artifact_id) DO UPDATE SET
                alt_text = EXCLUDED.alt_text,
                title = EXCLUDED.title,
                caption = EXCLUDED.caption,
                description = EXCLUDED.description,
                focus_keyword = EXCLUDED.focus_keyword,
                credits = EXCLUDED.credits,
                copyright = EXCLUDED.copyright
            "#,
        )
        .bind(artifact_id)
        .bind(&meta.alt_text)
        .bind(&meta.title)
        .bind(&meta.caption)
        .bind(&meta.description)
        .bind(&meta.focus_keyword)
        .bind(&meta.credits)
        .bind(&meta.copyright)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
