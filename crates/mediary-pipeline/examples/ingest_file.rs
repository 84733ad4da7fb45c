//! Ingest one file from disk and print the recorded artifact as JSON.
//!
//! Usage: cargo run --example ingest_file -- <path> <content-type>
//!
//! Storage and tool paths come from the environment (see `PipelineConfig`);
//! recording goes to an in-memory recorder, so this exercises the full
//! transcoding flow without a database.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use mediary_core::PipelineConfig;
use mediary_db::InMemoryRecorder;
use mediary_pipeline::{IngestRequest, MediaPipeline};
use mediary_processing::SystemProcessRunner;
use mediary_storage::LocalStorage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let usage = "usage: ingest_file <path> <content-type>";
    let path = args.next().context(usage)?;
    let content_type = args.next().context(usage)?;

    let config = PipelineConfig::from_env()?;
    let storage =
        LocalStorage::new(config.storage_root.clone(), config.public_base_url.clone()).await?;

    let pipeline = MediaPipeline::new(
        config,
        Arc::new(storage),
        Arc::new(InMemoryRecorder::new()),
        Arc::new(SystemProcessRunner),
    );

    let data = tokio::fs::read(&path)
        .await
        .with_context(|| format!("Failed to read {}", path))?;
    let filename = std::path::Path::new(&path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.bin")
        .to_string();

    let artifact = pipeline
        .ingest(IngestRequest {
            data: data.into(),
            filename,
            content_type,
            uploaded_by: 1,
            descriptive: None,
        })
        .await?;

    println!("{}", serde_json::to_string_pretty(&artifact)?);
    Ok(())
}
