//! Document normalization through external tools.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;

use mediary_core::{IngestError, PipelineConfig};

use crate::classifier::extension_for;
use crate::runner::ProcessRunner;

/// Timeout for tool availability checks.
const VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// A normalized document payload with its advisory page count.
#[derive(Debug, Clone)]
pub struct NormalizedDocument {
    pub data: Bytes,
    /// Best-effort page count; 0 when it could not be determined.
    pub page_count: u32,
}

/// Converts document uploads into metadata-free PDFs.
pub struct DocumentTranscoder {
    runner: Arc<dyn ProcessRunner>,
    soffice_path: String,
    exiftool_path: String,
    pdfinfo_path: String,
    timeout: Duration,
}

impl DocumentTranscoder {
    pub fn new(runner: Arc<dyn ProcessRunner>, config: &PipelineConfig) -> Self {
        Self {
            runner,
            soffice_path: config.soffice_path.clone(),
            exiftool_path: config.exiftool_path.clone(),
            pdfinfo_path: config.pdfinfo_path.clone(),
            timeout: config.transcode_timeout(),
        }
    }

    /// Verify the tools a given upload will need before any file I/O.
    ///
    /// PDF inputs skip conversion, so only the metadata stripper is
    /// required for them. The page counter is advisory and never checked.
    pub async fn ensure_available(&self, content_type: &str, data: &[u8]) -> Result<(), IngestError> {
        if !Self::is_pdf(content_type, data) {
            let output = self
                .runner
                .run(&self.soffice_path, &["--version"], VERSION_CHECK_TIMEOUT)
                .await?;
            if !output.success() {
                return Err(IngestError::dependency_missing(self.soffice_path.clone()));
            }
        }

        let output = self
            .runner
            .run(&self.exiftool_path, &["-ver"], VERSION_CHECK_TIMEOUT)
            .await?;
        if !output.success() {
            return Err(IngestError::dependency_missing(self.exiftool_path.clone()));
        }

        Ok(())
    }

    /// Normalize a document upload inside `work_dir`.
    ///
    /// PDF inputs go straight to metadata stripping; anything else is
    /// converted first. The returned bytes are read back from the stripped
    /// file.
    #[tracing::instrument(skip(self, data, work_dir), fields(content_type = %content_type))]
    pub async fn normalize(
        &self,
        data: &[u8],
        content_type: &str,
        work_dir: &Path,
    ) -> Result<NormalizedDocument, IngestError> {
        let start = std::time::Instant::now();

        let pdf_path = if Self::is_pdf(content_type, data) {
            let path = work_dir.join("input.pdf");
            tokio::fs::write(&path, data)
                .await
                .with_context(|| format!("Failed to write document input {}", path.display()))?;
            path
        } else {
            let ext = extension_for(content_type).unwrap_or("bin");
            let input_path = work_dir.join(format!("input.{}", ext));
            tokio::fs::write(&input_path, data)
                .await
                .with_context(|| {
                    format!("Failed to write document input {}", input_path.display())
                })?;
            self.convert_to_pdf(&input_path, work_dir).await?
        };

        self.strip_metadata(&pdf_path).await?;

        let stripped = tokio::fs::read(&pdf_path)
            .await
            .with_context(|| format!("Failed to read converted document {}", pdf_path.display()))?;

        let page_count = self.page_count(&pdf_path, &stripped).await;

        tracing::info!(
            page_count,
            size_bytes = stripped.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Document normalized"
        );

        Ok(NormalizedDocument {
            data: Bytes::from(stripped),
            page_count,
        })
    }

    fn is_pdf(content_type: &str, data: &[u8]) -> bool {
        content_type.trim().to_lowercase().starts_with("application/pdf")
            || data.starts_with(b"%PDF-")
    }

    #[tracing::instrument(skip(self, input_path, out_dir), fields(process.executable.name = "soffice"))]
    async fn convert_to_pdf(&self, input_path: &Path, out_dir: &Path) -> Result<PathBuf, IngestError> {
        let input = path_arg(input_path)?;
        let outdir = path_arg(out_dir)?;

        let args = [
            "--headless",
            "--convert-to",
            "pdf",
            "--outdir",
            outdir.as_str(),
            input.as_str(),
        ];

        let result = self
            .runner
            .run(&self.soffice_path, &args, self.timeout)
            .await?;

        if !result.success() {
            let stderr = result.stderr_lossy();
            tracing::error!(exit_code = ?result.exit_code, stderr = %stderr, "Document conversion failed");
            return Err(IngestError::TranscodeFailed {
                tool: self.soffice_path.clone(),
                detail: stderr,
            });
        }

        // The converter names its output after the input stem.
        let stem = input_path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();
        let pdf_path = out_dir.join(format!("{}.pdf", stem));

        if !tokio::fs::try_exists(&pdf_path).await.unwrap_or(false) {
            return Err(IngestError::TranscodeFailed {
                tool: self.soffice_path.clone(),
                detail: format!("No output produced at {}", pdf_path.display()),
            });
        }

        Ok(pdf_path)
    }

    #[tracing::instrument(skip(self, pdf_path), fields(process.executable.name = "exiftool"))]
    async fn strip_metadata(&self, pdf_path: &Path) -> Result<(), IngestError> {
        let target = path_arg(pdf_path)?;

        let args = ["-all=", "-overwrite_original", target.as_str()];

        let result = self
            .runner
            .run(&self.exiftool_path, &args, self.timeout)
            .await?;

        if !result.success() {
            let stderr = result.stderr_lossy();
            tracing::error!(exit_code = ?result.exit_code, stderr = %stderr, "Metadata strip failed");
            return Err(IngestError::TranscodeFailed {
                tool: self.exiftool_path.clone(),
                detail: stderr,
            });
        }

        Ok(())
    }

    /// Best-effort page count: inspection tool first, then a raw scan of
    /// the PDF body. Never fails the ingestion.
    async fn page_count(&self, pdf_path: &Path, data: &[u8]) -> u32 {
        let target = match pdf_path.to_str() {
            Some(path) => path.to_string(),
            None => return Self::scan_page_count(data).unwrap_or(0),
        };

        match self
            .runner
            .run(&self.pdfinfo_path, &[target.as_str()], VERSION_CHECK_TIMEOUT)
            .await
        {
            Ok(output) if output.success() => Self::parse_pdfinfo_pages(&output.stdout_lossy())
                .or_else(|| Self::scan_page_count(data))
                .unwrap_or(0),
            Ok(output) => {
                tracing::warn!(
                    exit_code = ?output.exit_code,
                    "Page count inspection failed, falling back to raw scan"
                );
                Self::scan_page_count(data).unwrap_or(0)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Page count tool unavailable, falling back to raw scan");
                Self::scan_page_count(data).unwrap_or(0)
            }
        }
    }

    fn parse_pdfinfo_pages(stdout: &str) -> Option<u32> {
        stdout
            .lines()
            .find(|line| line.starts_with("Pages:"))
            .and_then(|line| line.split_whitespace().last())
            .and_then(|count| count.parse::<u32>().ok())
    }

    /// Scan the PDF body for the page tree's /Count entry.
    fn scan_page_count(data: &[u8]) -> Option<u32> {
        let data_str = String::from_utf8_lossy(data);
        data_str.split("/Count").nth(1).and_then(|s| {
            let num_str = s
                .chars()
                .skip_while(|c| !c.is_ascii_digit())
                .take_while(|c| c.is_ascii_digit())
                .collect::<String>();
            num_str.parse::<u32>().ok()
        })
    }
}

fn path_arg(path: &Path) -> Result<String, IngestError> {
    path.to_str().map(str::to_string).ok_or_else(|| {
        IngestError::internal(anyhow::anyhow!(
            "Path is not valid UTF-8: {}",
            path.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{ProcessError, ProcessOutput, ProcessRunner};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::tempdir;

    const DOCX_MIME: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

    /// Runner faking the document tool suite. The conversion step writes a
    /// real PDF into the requested output directory.
    struct FakeDocTools {
        calls: Mutex<Vec<String>>,
        converted_pdf: &'static [u8],
        pdfinfo_stdout: Option<&'static str>,
        exiftool_missing: bool,
        soffice_fails: bool,
    }

    impl FakeDocTools {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                converted_pdf: b"%PDF-1.7\n/Type /Pages /Count 2\n%%EOF",
                pdfinfo_stdout: Some("Title:\nPages:          2\nEncrypted:      no\n"),
                exiftool_missing: false,
                soffice_fails: false,
            }
        }

        fn programs_called(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProcessRunner for FakeDocTools {
        async fn run(
            &self,
            program: &str,
            args: &[&str],
            _timeout: Duration,
        ) -> Result<ProcessOutput, ProcessError> {
            self.calls.lock().unwrap().push(program.to_string());

            let ok = ProcessOutput {
                exit_code: Some(0),
                stdout: Vec::new(),
                stderr: Vec::new(),
            };

            match program {
                "soffice" => {
                    if self.soffice_fails {
                        return Ok(ProcessOutput {
                            exit_code: Some(77),
                            stdout: Vec::new(),
                            stderr: b"source file could not be loaded".to_vec(),
                        });
                    }
                    if args.first() == Some(&"--version") {
                        return Ok(ok);
                    }
                    let outdir = args
                        .iter()
                        .position(|a| *a == "--outdir")
                        .map(|i| args[i + 1])
                        .unwrap();
                    let input = Path::new(args.last().unwrap());
                    let stem = input.file_stem().unwrap().to_string_lossy();
                    std::fs::write(
                        Path::new(outdir).join(format!("{}.pdf", stem)),
                        self.converted_pdf,
                    )
                    .unwrap();
                    Ok(ok)
                }
                "exiftool" => {
                    if self.exiftool_missing {
                        return Err(ProcessError::NotFound(program.to_string()));
                    }
                    Ok(ok)
                }
                "pdfinfo" => match self.pdfinfo_stdout {
                    Some(stdout) => Ok(ProcessOutput {
                        exit_code: Some(0),
                        stdout: stdout.as_bytes().to_vec(),
                        stderr: Vec::new(),
                    }),
                    None => Err(ProcessError::NotFound(program.to_string())),
                },
                other => panic!("unexpected program {}", other),
            }
        }
    }

    fn transcoder_with(runner: Arc<FakeDocTools>) -> DocumentTranscoder {
        DocumentTranscoder::new(runner, &PipelineConfig::default())
    }

    #[tokio::test]
    async fn test_pdf_input_skips_conversion() {
        let runner = Arc::new(FakeDocTools::new());
        let transcoder = transcoder_with(runner.clone());
        let dir = tempdir().unwrap();

        let pdf = b"%PDF-1.4\n/Type /Pages /Count 3\n%%EOF";
        let normalized = transcoder
            .normalize(pdf, "application/pdf", dir.path())
            .await
            .unwrap();

        assert!(normalized.data.starts_with(b"%PDF-"));
        let programs = runner.programs_called();
        assert!(!programs.contains(&"soffice".to_string()));
        assert!(programs.contains(&"exiftool".to_string()));
    }

    #[tokio::test]
    async fn test_office_input_is_converted() {
        let runner = Arc::new(FakeDocTools::new());
        let transcoder = transcoder_with(runner.clone());
        let dir = tempdir().unwrap();

        let normalized = transcoder
            .normalize(b"PK\x03\x04 fake docx bytes", DOCX_MIME, dir.path())
            .await
            .unwrap();

        assert!(normalized.data.starts_with(b"%PDF-"));
        assert_eq!(normalized.page_count, 2);

        let programs = runner.programs_called();
        assert_eq!(
            programs,
            vec!["soffice".to_string(), "exiftool".to_string(), "pdfinfo".to_string()]
        );
    }

    #[tokio::test]
    async fn test_page_count_falls_back_to_raw_scan() {
        let runner = Arc::new(FakeDocTools {
            pdfinfo_stdout: None,
            ..FakeDocTools::new()
        });
        let transcoder = transcoder_with(runner);
        let dir = tempdir().unwrap();

        let pdf = b"%PDF-1.4\n/Type /Pages /Count 7\n%%EOF";
        let normalized = transcoder
            .normalize(pdf, "application/pdf", dir.path())
            .await
            .unwrap();

        assert_eq!(normalized.page_count, 7);
    }

    #[tokio::test]
    async fn test_missing_stripper_is_dependency_error() {
        let runner = Arc::new(FakeDocTools {
            exiftool_missing: true,
            ..FakeDocTools::new()
        });
        let transcoder = transcoder_with(runner);

        let result = transcoder
            .ensure_available("application/pdf", b"%PDF-1.4")
            .await;

        match result {
            Err(IngestError::DependencyMissing { tool }) => assert_eq!(tool, "exiftool"),
            other => panic!("expected DependencyMissing, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_conversion_is_transcode_error() {
        let runner = Arc::new(FakeDocTools {
            soffice_fails: true,
            ..FakeDocTools::new()
        });
        let transcoder = transcoder_with(runner);
        let dir = tempdir().unwrap();

        let result = transcoder
            .normalize(b"not really a docx", DOCX_MIME, dir.path())
            .await;

        match result {
            Err(IngestError::TranscodeFailed { tool, detail }) => {
                assert_eq!(tool, "soffice");
                assert!(detail.contains("could not be loaded"));
            }
            other => panic!("expected TranscodeFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_pdfinfo_pages() {
        let stdout = "Creator:        Writer\nProducer:       LibreOffice\nPages:          12\n";
        assert_eq!(DocumentTranscoder::parse_pdfinfo_pages(stdout), Some(12));
        assert_eq!(DocumentTranscoder::parse_pdfinfo_pages("no pages line"), None);
    }

    #[test]
    fn test_scan_page_count() {
        assert_eq!(
            DocumentTranscoder::scan_page_count(b"%PDF-1.4\n/Pages /Count 5\n"),
            Some(5)
        );
        assert_eq!(DocumentTranscoder::scan_page_count(b"%PDF-1.4\n"), None);
    }

    #[test]
    fn test_is_pdf_by_mime_or_magic() {
        assert!(DocumentTranscoder::is_pdf("application/pdf", b""));
        assert!(DocumentTranscoder::is_pdf("text/plain", b"%PDF-1.4"));
        assert!(!DocumentTranscoder::is_pdf("text/plain", b"plain text"));
    }
}
