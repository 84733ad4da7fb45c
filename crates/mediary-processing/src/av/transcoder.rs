//! Video and audio transcoding through external tools.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use mediary_core::{IngestError, PipelineConfig};

use super::probe::MediaProbe;
use crate::runner::ProcessRunner;

/// Timeout for tool availability checks.
const VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Re-encodes video and audio uploads into the canonical web container.
///
/// Video gets a quality-targeted encode capped at the configured height;
/// audio gets a fixed-bitrate encode. Both drop all container and stream
/// metadata.
pub struct AvTranscoder {
    runner: Arc<dyn ProcessRunner>,
    ffmpeg_path: String,
    ffprobe_path: String,
    timeout: Duration,
    max_height: u32,
    video_crf: u32,
    audio_bitrate_kbps: u32,
}

impl AvTranscoder {
    pub fn new(runner: Arc<dyn ProcessRunner>, config: &PipelineConfig) -> Self {
        Self {
            runner,
            ffmpeg_path: config.ffmpeg_path.clone(),
            ffprobe_path: config.ffprobe_path.clone(),
            timeout: config.transcode_timeout(),
            max_height: config.max_video_height,
            video_crf: config.video_crf,
            audio_bitrate_kbps: config.audio_bitrate_kbps,
        }
    }

    /// Verify both external tools can be invoked.
    ///
    /// Runs before any temp file is written so a missing tool surfaces as
    /// `DependencyMissing` instead of a mid-pipeline failure.
    pub async fn ensure_available(&self) -> Result<(), IngestError> {
        for tool in [self.ffmpeg_path.as_str(), self.ffprobe_path.as_str()] {
            let output = self
                .runner
                .run(tool, &["-version"], VERSION_CHECK_TIMEOUT)
                .await?;
            if !output.success() {
                return Err(IngestError::dependency_missing(tool));
            }
        }
        Ok(())
    }

    /// Transcode a video upload, reporting the stored stream's
    /// characteristics.
    #[tracing::instrument(skip(self, input_path, output_path), fields(process.executable.name = "ffmpeg", av.operation = "transcode_video"))]
    pub async fn transcode_video(
        &self,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<MediaProbe, IngestError> {
        let start = std::time::Instant::now();

        let input = path_arg(input_path)?;
        let output = path_arg(output_path)?;
        let crf = self.video_crf.to_string();
        let audio_bitrate = format!("{}k", self.audio_bitrate_kbps);
        // -2 keeps the scaled width even, which the encoder requires.
        let scale = format!("scale=-2:'min({},ih)'", self.max_height);

        let args = [
            "-y",
            "-i",
            input.as_str(),
            "-map_metadata",
            "-1",
            "-map_chapters",
            "-1",
            "-c:v",
            "libvpx-vp9",
            "-crf",
            crf.as_str(),
            "-b:v",
            "0",
            "-vf",
            scale.as_str(),
            "-c:a",
            "libopus",
            "-b:a",
            audio_bitrate.as_str(),
            "-f",
            "webm",
            output.as_str(),
        ];

        let result = self
            .runner
            .run(&self.ffmpeg_path, &args, self.timeout)
            .await?;

        if !result.success() {
            let stderr = result.stderr_lossy();
            tracing::error!(
                exit_code = ?result.exit_code,
                stderr = %stderr,
                "Video transcode failed"
            );
            return Err(IngestError::TranscodeFailed {
                tool: self.ffmpeg_path.clone(),
                detail: stderr,
            });
        }

        let probe = self.probe(output_path).await?;

        tracing::info!(
            width = ?probe.width,
            height = ?probe.height,
            video_duration = ?probe.duration_seconds,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Video transcode completed"
        );

        Ok(probe)
    }

    /// Transcode an audio upload (no video stream in the output).
    #[tracing::instrument(skip(self, input_path, output_path), fields(process.executable.name = "ffmpeg", av.operation = "transcode_audio"))]
    pub async fn transcode_audio(
        &self,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<MediaProbe, IngestError> {
        let start = std::time::Instant::now();

        let input = path_arg(input_path)?;
        let output = path_arg(output_path)?;
        let audio_bitrate = format!("{}k", self.audio_bitrate_kbps);

        let args = [
            "-y",
            "-i",
            input.as_str(),
            "-map_metadata",
            "-1",
            "-map_chapters",
            "-1",
            "-vn",
            "-c:a",
            "libopus",
            "-b:a",
            audio_bitrate.as_str(),
            "-f",
            "webm",
            output.as_str(),
        ];

        let result = self
            .runner
            .run(&self.ffmpeg_path, &args, self.timeout)
            .await?;

        if !result.success() {
            let stderr = result.stderr_lossy();
            tracing::error!(
                exit_code = ?result.exit_code,
                stderr = %stderr,
                "Audio transcode failed"
            );
            return Err(IngestError::TranscodeFailed {
                tool: self.ffmpeg_path.clone(),
                detail: stderr,
            });
        }

        let probe = self.probe(output_path).await?;

        tracing::info!(
            audio_duration = ?probe.duration_seconds,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Audio transcode completed"
        );

        Ok(probe)
    }

    /// Read stream characteristics of a media file.
    #[tracing::instrument(skip(self, path), fields(process.executable.name = "ffprobe", av.operation = "probe"))]
    pub async fn probe(&self, path: &Path) -> Result<MediaProbe, IngestError> {
        let target = path_arg(path)?;

        let args = [
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
            target.as_str(),
        ];

        let result = self
            .runner
            .run(&self.ffprobe_path, &args, self.timeout)
            .await?;

        if !result.success() {
            let stderr = result.stderr_lossy();
            tracing::error!(exit_code = ?result.exit_code, stderr = %stderr, "Probe failed");
            return Err(IngestError::TranscodeFailed {
                tool: self.ffprobe_path.clone(),
                detail: stderr,
            });
        }

        MediaProbe::from_ffprobe_json(&result.stdout).map_err(|e| IngestError::TranscodeFailed {
            tool: self.ffprobe_path.clone(),
            detail: format!("Unparseable probe output: {}", e),
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
