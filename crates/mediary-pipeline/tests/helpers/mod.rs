//! Shared harness for pipeline integration tests: a real local storage root,
//! the in-memory recorder, and scripted external tools.

// Each test binary compiles this module separately and uses a subset of it.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use img_parts::{jpeg::Jpeg, ImageEXIF};
use tempfile::TempDir;

use mediary_core::{DescriptiveMetadata, PipelineConfig};
use mediary_db::InMemoryRecorder;
use mediary_pipeline::{IngestRequest, MediaPipeline};
use mediary_processing::{ProcessError, ProcessOutput, ProcessRunner};
use mediary_storage::LocalStorage;

/// EBML magic plus filler, standing in for transcoder output.
pub const FAKE_WEBM: &[u8] = b"\x1a\x45\xdf\xa3 transcoded webm payload";

/// Minimal PDF with a page tree, standing in for converter output.
pub const FAKE_PDF: &[u8] =
    b"%PDF-1.4\n1 0 obj\n<< /Type /Pages /Count 3 /Kids [] >>\nendobj\ntrailer\n<< >>\n%%EOF\n";

pub const VIDEO_PROBE_JSON: &str = r#"{
    "streams": [{"codec_type": "video", "codec_name": "vp9", "width": 640, "height": 360}],
    "format": {"duration": "12.5", "bit_rate": "900000"}
}"#;

pub const AUDIO_PROBE_JSON: &str = r#"{
    "streams": [{"codec_type": "audio", "codec_name": "opus"}],
    "format": {"duration": "201.4"}
}"#;

/// Fake external tools: records every invocation and fabricates the files
/// and stdout the real tools would produce.
pub struct ScriptedTools {
    calls: Mutex<Vec<(String, Vec<String>)>>,
    probe_json: &'static str,
    pub fail_ffmpeg: bool,
    pub missing_tool: Option<&'static str>,
}

impl ScriptedTools {
    pub fn new(probe_json: &'static str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            probe_json,
            fail_ffmpeg: false,
            missing_tool: None,
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Program names in invocation order.
    pub fn programs(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(program, _)| program.clone())
            .collect()
    }
}

#[async_trait]
impl ProcessRunner for ScriptedTools {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> Result<ProcessOutput, ProcessError> {
        self.calls.lock().unwrap().push((
            program.to_string(),
            args.iter().map(|a| a.to_string()).collect(),
        ));

        if self.missing_tool == Some(program) {
            return Err(ProcessError::NotFound(program.to_string()));
        }

        // Availability probes.
        if args.contains(&"-version") || args.contains(&"--version") || args.contains(&"-ver") {
            return Ok(ok_output(b"tool 1.0"));
        }

        match program {
            "ffmpeg" => {
                if self.fail_ffmpeg {
                    return Ok(ProcessOutput {
                        exit_code: Some(1),
                        stdout: Vec::new(),
                        stderr: b"Invalid data found when processing input".to_vec(),
                    });
                }
                let output_path = args.last().unwrap();
                std::fs::write(output_path, FAKE_WEBM).unwrap();
                Ok(ok_output(b""))
            }
            "ffprobe" => Ok(ok_output(self.probe_json.as_bytes())),
            "soffice" => {
                let outdir_pos = args.iter().position(|a| *a == "--outdir").unwrap();
                let outdir = Path::new(args[outdir_pos + 1]);
                let input = Path::new(args.last().unwrap());
                let stem = input.file_stem().unwrap().to_str().unwrap();
                std::fs::write(outdir.join(format!("{}.pdf", stem)), FAKE_PDF).unwrap();
                Ok(ok_output(b""))
            }
            "exiftool" => Ok(ok_output(b"1 image files updated")),
            "pdfinfo" => Ok(ok_output(b"Title:\nPages:          3\nEncrypted:      no\n")),
            other => panic!("unexpected program: {}", other),
        }
    }
}

fn ok_output(stdout: &[u8]) -> ProcessOutput {
    ProcessOutput {
        exit_code: Some(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub struct TestHarness {
    pub pipeline: MediaPipeline,
    pub recorder: Arc<InMemoryRecorder>,
    pub tools: Arc<ScriptedTools>,
    storage_dir: TempDir,
}

impl TestHarness {
    /// On-disk path behind a storage key.
    pub fn stored_path(&self, key: &str) -> PathBuf {
        self.storage_dir.path().join(key)
    }

    /// Number of files anywhere under the storage root.
    pub fn stored_file_count(&self) -> usize {
        fn walk(dir: &Path, count: &mut usize) {
            for entry in std::fs::read_dir(dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    walk(&path, count);
                } else {
                    *count += 1;
                }
            }
        }

        let mut count = 0;
        walk(self.storage_dir.path(), &mut count);
        count
    }
}

pub async fn harness() -> TestHarness {
    harness_with(
        PipelineConfig::default(),
        ScriptedTools::new(VIDEO_PROBE_JSON),
    )
    .await
}

pub async fn harness_with(config: PipelineConfig, tools: ScriptedTools) -> TestHarness {
    let storage_dir = TempDir::new().unwrap();
    let storage = LocalStorage::new(
        storage_dir.path(),
        "http://localhost:8080/media".to_string(),
    )
    .await
    .unwrap();

    let recorder = Arc::new(InMemoryRecorder::new());
    let tools = Arc::new(tools);

    let pipeline = MediaPipeline::new(config, Arc::new(storage), recorder.clone(), tools.clone());

    TestHarness {
        pipeline,
        recorder,
        tools,
        storage_dir,
    }
}

pub fn request(data: Vec<u8>, filename: &str, content_type: &str) -> IngestRequest {
    IngestRequest {
        data: data.into(),
        filename: filename.to_string(),
        content_type: content_type.to_string(),
        uploaded_by: 7,
        descriptive: None,
    }
}

pub fn descriptive(alt_text: &str) -> DescriptiveMetadata {
    DescriptiveMetadata {
        alt_text: Some(alt_text.to_string()),
        ..Default::default()
    }
}

/// Gradient JPEG at high quality; every ladder derivative re-encodes
/// strictly smaller than these bytes.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, 95);
    img.write_with_encoder(encoder).unwrap();
    buffer
}

/// Gradient JPEG carrying an EXIF block with identifying metadata.
pub fn jpeg_with_exif(width: u32, height: u32) -> Vec<u8> {
    // Little-endian TIFF with one ASCII Artist tag (0x013B).
    let artist = b"A. Photographer\0";
    let mut exif = vec![
        0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00, // II*\0, IFD at offset 8
        0x01, 0x00, // one entry
        0x3B, 0x01, 0x02, 0x00, // tag 0x013B, ASCII
    ];
    exif.extend_from_slice(&(artist.len() as u32).to_le_bytes());
    exif.extend_from_slice(&26u32.to_le_bytes()); // value offset past the IFD
    exif.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // no next IFD
    exif.extend_from_slice(artist);

    let mut jpeg = Jpeg::from_bytes(jpeg_bytes(width, height).into()).unwrap();
    jpeg.set_exif(Some(exif.into()));
    jpeg.encoder().bytes().to_vec()
}
