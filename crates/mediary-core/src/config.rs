//! Pipeline configuration.
//!
//! Size limits, encoder settings and external tool paths are policy, not
//! component behavior, so they all live here and reach components by value.

use std::env;
use std::time::Duration;

use crate::models::MediaFamily;

const MAX_IMAGE_SIZE_MB: usize = 10;
const MAX_VIDEO_SIZE_MB: usize = 100;
const MAX_AUDIO_SIZE_MB: usize = 50;
const MAX_DOCUMENT_SIZE_MB: usize = 20;
const WEBP_QUALITY: f32 = 85.0;
const WEBP_ORIGINAL_QUALITY: f32 = 90.0;
const MAX_VIDEO_HEIGHT: u32 = 1080;
const VIDEO_CRF: u32 = 32;
const AUDIO_BITRATE_KBPS: u32 = 128;
const TRANSCODE_TIMEOUT_SECS: u64 = 300;

/// Configuration for the ingestion pipeline.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    // Per-family upload size limits
    pub max_image_bytes: usize,
    pub max_video_bytes: usize,
    pub max_audio_bytes: usize,
    pub max_document_bytes: usize,
    // Image encoding
    pub webp_quality: f32,
    pub webp_original_quality: f32,
    // Video/audio encoding
    pub max_video_height: u32,
    pub video_crf: u32,
    pub audio_bitrate_kbps: u32,
    // External tools
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub soffice_path: String,
    pub exiftool_path: String,
    pub pdfinfo_path: String,
    /// Time limit for each external-process invocation.
    pub transcode_timeout_secs: u64,
    // Storage
    pub storage_root: String,
    pub public_base_url: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: MAX_IMAGE_SIZE_MB * 1024 * 1024,
            max_video_bytes: MAX_VIDEO_SIZE_MB * 1024 * 1024,
            max_audio_bytes: MAX_AUDIO_SIZE_MB * 1024 * 1024,
            max_document_bytes: MAX_DOCUMENT_SIZE_MB * 1024 * 1024,
            webp_quality: WEBP_QUALITY,
            webp_original_quality: WEBP_ORIGINAL_QUALITY,
            max_video_height: MAX_VIDEO_HEIGHT,
            video_crf: VIDEO_CRF,
            audio_bitrate_kbps: AUDIO_BITRATE_KBPS,
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            soffice_path: "soffice".to_string(),
            exiftool_path: "exiftool".to_string(),
            pdfinfo_path: "pdfinfo".to_string(),
            transcode_timeout_secs: TRANSCODE_TIMEOUT_SECS,
            storage_root: "uploads".to_string(),
            public_base_url: "/uploads".to_string(),
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_f32(key: &str, default: f32) -> f32 {
    env::var(key)
        .ok()
        .and_then(|s| s.parse::<f32>().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let config = PipelineConfig {
            max_image_bytes: env_usize("MAX_IMAGE_SIZE_MB", MAX_IMAGE_SIZE_MB) * 1024 * 1024,
            max_video_bytes: env_usize("MAX_VIDEO_SIZE_MB", MAX_VIDEO_SIZE_MB) * 1024 * 1024,
            max_audio_bytes: env_usize("MAX_AUDIO_SIZE_MB", MAX_AUDIO_SIZE_MB) * 1024 * 1024,
            max_document_bytes: env_usize("MAX_DOCUMENT_SIZE_MB", MAX_DOCUMENT_SIZE_MB)
                * 1024
                * 1024,
            webp_quality: env_f32("WEBP_QUALITY", WEBP_QUALITY),
            webp_original_quality: env_f32("WEBP_ORIGINAL_QUALITY", WEBP_ORIGINAL_QUALITY),
            max_video_height: env_u32("MAX_VIDEO_HEIGHT", MAX_VIDEO_HEIGHT),
            video_crf: env_u32("VIDEO_CRF", VIDEO_CRF),
            audio_bitrate_kbps: env_u32("AUDIO_BITRATE_KBPS", AUDIO_BITRATE_KBPS),
            ffmpeg_path: env_string("FFMPEG_PATH", "ffmpeg"),
            ffprobe_path: env_string("FFPROBE_PATH", "ffprobe"),
            soffice_path: env_string("SOFFICE_PATH", "soffice"),
            exiftool_path: env_string("EXIFTOOL_PATH", "exiftool"),
            pdfinfo_path: env_string("PDFINFO_PATH", "pdfinfo"),
            transcode_timeout_secs: env::var("TRANSCODE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(TRANSCODE_TIMEOUT_SECS),
            storage_root: env_string("MEDIA_STORAGE_PATH", "uploads"),
            public_base_url: env_string("MEDIA_BASE_URL", "/uploads"),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(0.0..=100.0).contains(&self.webp_quality)
            || !(0.0..=100.0).contains(&self.webp_original_quality)
        {
            return Err(anyhow::anyhow!(
                "WEBP_QUALITY and WEBP_ORIGINAL_QUALITY must be between 0 and 100"
            ));
        }
        if self.video_crf > 63 {
            return Err(anyhow::anyhow!("VIDEO_CRF must be between 0 and 63"));
        }
        if self.max_video_height == 0 {
            return Err(anyhow::anyhow!("MAX_VIDEO_HEIGHT must be greater than 0"));
        }
        if self.transcode_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "TRANSCODE_TIMEOUT_SECS must be greater than 0"
            ));
        }
        if self.storage_root.is_empty() {
            return Err(anyhow::anyhow!("MEDIA_STORAGE_PATH must not be empty"));
        }
        Ok(())
    }

    /// Maximum accepted upload size for a family, in bytes.
    pub fn max_bytes(&self, family: MediaFamily) -> usize {
        match family {
            MediaFamily::Image => self.max_image_bytes,
            MediaFamily::Video => self.max_video_bytes,
            MediaFamily::Audio => self.max_audio_bytes,
            MediaFamily::Document => self.max_document_bytes,
        }
    }

    pub fn transcode_timeout(&self) -> Duration {
        Duration::from_secs(self.transcode_timeout_secs)
    }
}
