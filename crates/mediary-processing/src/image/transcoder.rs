//! Image normalization into the canonical web format.

use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageReader};
use std::io::Cursor;

use mediary_core::{IngestError, PipelineConfig};

use super::orientation::ImageOrientation;

/// Largest dimension the WebP encoder accepts.
const MAX_DIMENSION: u32 = 16_383;

/// A normalized image payload with its pixel dimensions.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
}

/// Decodes uploads and re-encodes them as WebP.
///
/// Re-encoding from raw pixels is also what discards embedded metadata:
/// EXIF, GPS tags and color profiles do not survive the round trip.
pub struct ImageTranscoder {
    quality: f32,
    original_quality: f32,
}

impl ImageTranscoder {
    pub fn new(quality: f32, original_quality: f32) -> Self {
        Self {
            quality,
            original_quality,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.webp_quality, config.webp_original_quality)
    }

    /// Encoding quality for resized derivatives.
    pub fn quality(&self) -> f32 {
        self.quality
    }

    /// Encoding quality for the full-size derivative.
    pub fn original_quality(&self) -> f32 {
        self.original_quality
    }

    /// Decode an upload and correct its EXIF orientation.
    pub fn decode(&self, data: &[u8]) -> Result<DynamicImage, IngestError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| {
                IngestError::invalid_image(format!("Failed to probe image format: {}", e))
            })?;

        let img = reader
            .decode()
            .map_err(|e| IngestError::invalid_image(format!("Failed to decode image: {}", e)))?;

        let (width, height) = img.dimensions();
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(IngestError::invalid_image(format!(
                "Image dimensions {}x{} exceed the supported maximum of {}",
                width, height, MAX_DIMENSION
            )));
        }

        Ok(ImageOrientation::apply_exif_orientation(img, data))
    }

    /// Encode an image as lossy WebP at the given quality.
    pub fn encode_webp(&self, img: &DynamicImage, quality: f32) -> Bytes {
        let (width, height) = img.dimensions();
        let rgba = img.to_rgba8();

        let encoder = webp::Encoder::from_rgba(&rgba, width, height);
        let webp_data = encoder.encode(quality);

        Bytes::copy_from_slice(&webp_data)
    }

    /// Normalize an upload: decode, orient, re-encode as WebP.
    pub fn normalize(&self, data: &[u8]) -> Result<NormalizedImage, IngestError> {
        let img = self.decode(data)?;
        let (width, height) = img.dimensions();
        let encoded = self.encode_webp(&img, self.quality);

        tracing::debug!(
            width,
            height,
            input_bytes = data.len(),
            output_bytes = encoded.len(),
            "Normalized image"
        );

        Ok(NormalizedImage {
            data: encoded,
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use img_parts::{jpeg::Jpeg, webp::WebP, ImageEXIF};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([255, 0, 0, 255]));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([0, 128, 255]));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
            .unwrap();
        buffer
    }

    /// Minimal little-endian TIFF blob carrying only an orientation tag.
    fn orientation_exif(orientation: u8) -> Vec<u8> {
        vec![
            0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00, // II*\0, IFD at offset 8
            0x01, 0x00, // one entry
            0x12, 0x01, 0x03, 0x00, 0x01, 0x00, 0x00, 0x00, // tag 0x0112, SHORT, count 1
            orientation, 0x00, 0x00, 0x00, // value
            0x00, 0x00, 0x00, 0x00, // no next IFD
        ]
    }

    fn jpeg_with_orientation(width: u32, height: u32, orientation: u8) -> Vec<u8> {
        let mut jpeg = Jpeg::from_bytes(jpeg_bytes(width, height).into()).unwrap();
        jpeg.set_exif(Some(orientation_exif(orientation).into()));
        jpeg.encoder().bytes().to_vec()
    }

    #[test]
    fn test_normalize_produces_webp() {
        let transcoder = ImageTranscoder::new(85.0, 90.0);
        let normalized = transcoder.normalize(&png_bytes(100, 80)).unwrap();

        assert_eq!(normalized.width, 100);
        assert_eq!(normalized.height, 80);
        assert_eq!(&normalized.data[0..4], b"RIFF");
        assert_eq!(&normalized.data[8..12], b"WEBP");
    }

    #[test]
    fn test_normalize_rejects_invalid_payload() {
        let transcoder = ImageTranscoder::new(85.0, 90.0);
        let result = transcoder.normalize(b"definitely not pixels");
        assert!(matches!(result, Err(IngestError::InvalidImage { .. })));
    }

    #[test]
    fn test_normalize_applies_exif_orientation() {
        let transcoder = ImageTranscoder::new(85.0, 90.0);

        // Orientation 6 is a 90 degree clockwise rotation, so width and
        // height swap.
        let data = jpeg_with_orientation(40, 20, 6);
        let normalized = transcoder.normalize(&data).unwrap();

        assert_eq!(normalized.width, 20);
        assert_eq!(normalized.height, 40);
    }

    #[test]
    fn test_normalize_strips_exif() {
        let transcoder = ImageTranscoder::new(85.0, 90.0);

        let data = jpeg_with_orientation(40, 20, 6);
        let source = Jpeg::from_bytes(data.clone().into()).unwrap();
        assert!(source.exif().is_some());

        let normalized = transcoder.normalize(&data).unwrap();
        let webp = WebP::from_bytes(normalized.data.clone()).unwrap();
        assert!(webp.exif().is_none());
    }

    #[test]
    fn test_encode_quality_affects_size() {
        let transcoder = ImageTranscoder::new(85.0, 90.0);
        let img = transcoder.decode(&jpeg_bytes(400, 300)).unwrap();

        let low = transcoder.encode_webp(&img, 10.0);
        let high = transcoder.encode_webp(&img, 95.0);
        assert!(low.len() <= high.len());
    }
}
