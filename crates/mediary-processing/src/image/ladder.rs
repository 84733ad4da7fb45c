//! Derivative size ladder.

use bytes::Bytes;
use image::{imageops::FilterType, DynamicImage, GenericImageView};

use super::transcoder::ImageTranscoder;

/// One target size in the ladder.
#[derive(Debug, Clone, Copy)]
pub struct SizeSpec {
    pub label: &'static str,
    pub width: u32,
    /// When set, the derivative is a fixed-aspect box filled by center-crop.
    pub height: Option<u32>,
}

/// Derivative sizes generated for every image upload, smallest first.
pub const SIZE_LADDER: &[SizeSpec] = &[
    SizeSpec {
        label: "thumbnail",
        width: 150,
        height: Some(150),
    },
    SizeSpec {
        label: "small",
        width: 300,
        height: None,
    },
    SizeSpec {
        label: "medium",
        width: 768,
        height: None,
    },
    SizeSpec {
        label: "large",
        width: 1024,
        height: None,
    },
    SizeSpec {
        label: "xlarge",
        width: 1920,
        height: None,
    },
];

/// Label of the full-size derivative kept alongside the ladder.
pub const ORIGINAL_LABEL: &str = "original";

/// One generated derivative, encoded and measured.
#[derive(Debug, Clone)]
pub struct DerivativeImage {
    pub label: String,
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
}

/// Derivative generation over the size ladder.
pub struct SizeLadder;

impl SizeLadder {
    /// Generate the full derivative set for a decoded image.
    ///
    /// The full-size `original` entry is always present, encoded at the
    /// higher quality setting. Ladder entries whose target width is not
    /// smaller than the source width are skipped so derivatives are never
    /// upscaled.
    pub fn generate(transcoder: &ImageTranscoder, img: &DynamicImage) -> Vec<DerivativeImage> {
        let (src_width, src_height) = img.dimensions();
        let mut derivatives = Vec::with_capacity(SIZE_LADDER.len() + 1);

        derivatives.push(DerivativeImage {
            label: ORIGINAL_LABEL.to_string(),
            data: transcoder.encode_webp(img, transcoder.original_quality()),
            width: src_width,
            height: src_height,
        });

        for spec in SIZE_LADDER {
            if src_width <= spec.width {
                tracing::debug!(
                    label = spec.label,
                    src_width,
                    target_width = spec.width,
                    "Skipping derivative, source not wider than target"
                );
                continue;
            }

            let resized = Self::resize_to_spec(img, spec);
            let (width, height) = resized.dimensions();
            let data = transcoder.encode_webp(&resized, transcoder.quality());

            tracing::debug!(
                label = spec.label,
                width,
                height,
                size_bytes = data.len(),
                "Generated derivative"
            );

            derivatives.push(DerivativeImage {
                label: spec.label.to_string(),
                data,
                width,
                height,
            });
        }

        derivatives
    }

    fn resize_to_spec(img: &DynamicImage, spec: &SizeSpec) -> DynamicImage {
        match spec.height {
            Some(target_height) => {
                let cropped = Self::center_crop(img, spec.width, target_height);
                let (crop_width, crop_height) = cropped.dimensions();
                let filter =
                    Self::select_filter(crop_width, crop_height, spec.width, target_height);
                cropped.resize_exact(spec.width, target_height, filter)
            }
            None => {
                let (src_width, src_height) = img.dimensions();
                let target_height = ((src_height as f32 * spec.width as f32 / src_width as f32)
                    .round() as u32)
                    .max(1);
                let filter = Self::select_filter(src_width, src_height, spec.width, target_height);
                img.resize_exact(spec.width, target_height, filter)
            }
        }
    }

    /// Crop the largest centered region matching the target aspect ratio.
    ///
    /// A wider source loses width from both sides; a taller source loses
    /// height from top and bottom. The result still has source-scale
    /// dimensions and is resized separately.
    pub fn center_crop(img: &DynamicImage, target_width: u32, target_height: u32) -> DynamicImage {
        let (src_width, src_height) = img.dimensions();
        let target_ratio = target_width as f32 / target_height as f32;
        let src_ratio = src_width as f32 / src_height as f32;

        let (crop_width, crop_height) = if src_ratio > target_ratio {
            let crop_width = ((src_height as f32 * target_ratio).round() as u32)
                .clamp(1, src_width);
            (crop_width, src_height)
        } else {
            let crop_height = ((src_width as f32 / target_ratio).round() as u32)
                .clamp(1, src_height);
            (src_width, crop_height)
        };

        let x = (src_width - crop_width) / 2;
        let y = (src_height - crop_height) / 2;

        img.crop_imm(x, y, crop_width, crop_height)
    }

    /// Select an interpolation filter based on how far the image shrinks.
    pub fn select_filter(
        orig_width: u32,
        orig_height: u32,
        new_width: u32,
        new_height: u32,
    ) -> FilterType {
        let width_ratio = orig_width as f32 / new_width as f32;
        let height_ratio = orig_height as f32 / new_height as f32;
        let max_ratio = width_ratio.max(height_ratio);

        if max_ratio > 2.0 {
            FilterType::Triangle
        } else if max_ratio > 1.5 {
            FilterType::CatmullRom
        } else {
            FilterType::Lanczos3
        }
    }
}
