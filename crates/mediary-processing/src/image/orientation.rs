use image::{imageops, DynamicImage};
use std::io::Cursor;

/// Image orientation operations (rotation and flipping)
pub struct ImageOrientation;

impl ImageOrientation {
    /// Apply EXIF orientation correction to a decoded image.
    ///
    /// `data` is the original encoded payload; the orientation tag is read
    /// from there since decoding discards it.
    pub fn apply_exif_orientation(mut img: DynamicImage, data: &[u8]) -> DynamicImage {
        let orientation = Self::read_exif_orientation(data);
        let (rotate, flip_h, flip_v) = Self::get_orientation_transforms(orientation);

        tracing::debug!(
            orientation = orientation,
            rotate = ?rotate,
            flip_horizontal = flip_h,
            flip_vertical = flip_v,
            "Applying EXIF orientation"
        );

        // Apply rotation first
        if let Some(angle) = rotate {
            img = Self::rotate_by_angle(img, angle);
        }

        // Then apply flips
        if flip_h {
            img = Self::apply_flip_horizontal(img);
        }
        if flip_v {
            img = Self::apply_flip_vertical(img);
        }

        img
    }

    /// Read the EXIF orientation tag from encoded image data.
    ///
    /// Returns the orientation value (1-8), or 1 (normal) when the image
    /// carries no EXIF data or no orientation tag.
    pub fn read_exif_orientation(data: &[u8]) -> u8 {
        let mut cursor = Cursor::new(data);
        match exif::Reader::new().read_from_container(&mut cursor) {
            Ok(exif) => exif
                .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
                .map(|value| value as u8)
                .unwrap_or(1),
            Err(_) => 1,
        }
    }

    /// Get rotation and flip operations needed for a given EXIF orientation
    /// Returns (rotate_angle, flip_horizontal, flip_vertical)
    pub fn get_orientation_transforms(orientation: u8) -> (Option<u16>, bool, bool) {
        match orientation {
            1 => (None, false, false),      // Normal
            2 => (None, true, false),       // Mirror horizontal
            3 => (Some(180), false, false), // Rotate 180
            4 => (None, false, true),       // Mirror vertical
            5 => (Some(270), true, false),  // Mirror horizontal + Rotate 270 CW
            6 => (Some(90), false, false),  // Rotate 90 CW
            7 => (Some(90), true, false),   // Mirror horizontal + Rotate 90 CW
            8 => (Some(270), false, false), // Rotate 270 CW
            _ => (None, false, false),      // Invalid, treat as normal
        }
    }

    /// Rotate image by specified angle (90, 180, or 270 degrees clockwise)
    pub fn rotate_by_angle(img: DynamicImage, angle: u16) -> DynamicImage {
        match angle {
            90 => DynamicImage::ImageRgba8(imageops::rotate90(&img.to_rgba8())),
            180 => DynamicImage::ImageRgba8(imageops::rotate180(&img.to_rgba8())),
            270 => DynamicImage::ImageRgba8(imageops::rotate270(&img.to_rgba8())),
            _ => img,
        }
    }

    /// Apply horizontal flip (mirror)
    pub fn apply_flip_horizontal(img: DynamicImage) -> DynamicImage {
        DynamicImage::ImageRgba8(imageops::flip_horizontal(&img.to_rgba8()))
    }

    /// Apply vertical flip
    pub fn apply_flip_vertical(img: DynamicImage) -> DynamicImage {
        DynamicImage::ImageRgba8(imageops::flip_vertical(&img.to_rgba8()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    #[test]
    fn test_get_orientation_transforms_all_values() {
        assert_eq!(
            ImageOrientation::get_orientation_transforms(1),
            (None, false, false)
        );
        assert_eq!(
            ImageOrientation::get_orientation_transforms(3),
            (Some(180), false, false)
        );
        assert_eq!(
            ImageOrientation::get_orientation_transforms(6),
            (Some(90), false, false)
        );
        assert_eq!(
            ImageOrientation::get_orientation_transforms(8),
            (Some(270), false, false)
        );

        for orientation in 1..=8u8 {
            let (rotate, _, _) = ImageOrientation::get_orientation_transforms(orientation);
            if let Some(angle) = rotate {
                assert!([90, 180, 270].contains(&angle));
            }
        }
    }

    #[test]
    fn test_get_orientation_transforms_invalid() {
        assert_eq!(
            ImageOrientation::get_orientation_transforms(0),
            (None, false, false)
        );
        assert_eq!(
            ImageOrientation::get_orientation_transforms(9),
            (None, false, false)
        );
    }

    #[test]
    fn test_rotation_dimension_changes() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 2, Rgba([0, 0, 255, 255])));
        assert_eq!(img.dimensions(), (4, 2));

        let rotated = ImageOrientation::rotate_by_angle(img.clone(), 90);
        assert_eq!(rotated.dimensions(), (2, 4));

        let rotated = ImageOrientation::rotate_by_angle(img.clone(), 180);
        assert_eq!(rotated.dimensions(), (4, 2));

        let rotated = ImageOrientation::rotate_by_angle(img, 270);
        assert_eq!(rotated.dimensions(), (2, 4));
    }

    #[test]
    fn test_read_orientation_without_exif() {
        let img = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let mut buffer = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut buffer),
            image::ImageFormat::Png,
        )
        .unwrap();

        assert_eq!(ImageOrientation::read_exif_orientation(&buffer), 1);
        assert_eq!(ImageOrientation::read_exif_orientation(b"not an image"), 1);
    }
}
