//! Stream inspection output parsing.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    streams: Option<Vec<FfprobeStream>>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Stream characteristics read back from a media file.
#[derive(Debug, Clone, Default)]
pub struct MediaProbe {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_seconds: Option<f64>,
    pub bitrate: Option<u64>,
    pub codec: Option<String>,
}

impl MediaProbe {
    /// Parse the JSON emitted by the inspection tool.
    pub(crate) fn from_ffprobe_json(stdout: &[u8]) -> Result<Self, serde_json::Error> {
        let parsed: FfprobeOutput = serde_json::from_slice(stdout)?;

        let duration_seconds = parsed
            .format
            .as_ref()
            .and_then(|f| f.duration.as_ref())
            .and_then(|d| d.parse::<f64>().ok());

        let bitrate = parsed
            .format
            .as_ref()
            .and_then(|f| f.bit_rate.as_ref())
            .and_then(|b| b.parse::<u64>().ok());

        let streams = parsed.streams.unwrap_or_default();
        let video_stream = streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"));
        let audio_stream = streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("audio"));

        let codec = video_stream
            .and_then(|s| s.codec_name.clone())
            .or_else(|| audio_stream.and_then(|s| s.codec_name.clone()));

        Ok(MediaProbe {
            width: video_stream.and_then(|s| s.width),
            height: video_stream.and_then(|s| s.height),
            duration_seconds,
            bitrate,
            codec,
        })
    }
}
