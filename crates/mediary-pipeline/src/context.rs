//! Temporary workspace for one ingestion.
//!
//! External tools work against real paths, so video, audio and document
//! uploads pass through a per-ingestion scratch directory. `cleanup` removes
//! every temp file and the directory itself; if the ingestion is cancelled
//! before cleanup runs, the backing `TempDir` removes them on drop.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tempfile::TempDir;

use mediary_core::IngestError;

/// Scratch directory holding the temp files created for one ingestion.
pub struct IngestionContext {
    root: TempDir,
    tracked: Vec<PathBuf>,
}

impl IngestionContext {
    pub fn new() -> Result<Self, IngestError> {
        let root = TempDir::new().context("Failed to create ingestion scratch directory")?;
        tracing::debug!(path = %root.path().display(), "Created ingestion scratch directory");
        Ok(Self {
            root,
            tracked: Vec::new(),
        })
    }

    /// Directory external tools may write intermediate files into.
    pub fn work_dir(&self) -> &Path {
        self.root.path()
    }

    /// Reserve a path inside the scratch directory for a tool to write.
    pub fn temp_path(&mut self, file_name: &str) -> PathBuf {
        let path = self.root.path().join(file_name);
        self.tracked.push(path.clone());
        path
    }

    /// Write raw bytes to a new temp file.
    pub async fn write_temp(
        &mut self,
        file_name: &str,
        data: &[u8],
    ) -> Result<PathBuf, IngestError> {
        let path = self.temp_path(file_name);
        tokio::fs::write(&path, data)
            .await
            .with_context(|| format!("Failed to write temp file {}", path.display()))?;
        Ok(path)
    }

    /// Remove every temp file and the scratch directory itself.
    ///
    /// Runs on success and failure alike. Removal failures are logged and
    /// never change the ingestion outcome.
    pub async fn cleanup(mut self) {
        for path in self.tracked.drain(..) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => tracing::debug!(path = %path.display(), "Removed temp file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove temp file")
                }
            }
        }

        if let Err(e) = self.root.close() {
            tracing::warn!(error = %e, "Failed to remove scratch directory");
        }
    }
}
