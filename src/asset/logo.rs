//! Logo validation and normalization.
//!
//! Logos must be square. Anything larger than 336x336 is resampled
//! down to exactly that size; the index never stores a larger image.

use crate::error::ApiError;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use log::debug;
use std::io::Cursor;

/// Maximum stored logo edge length in pixels.
const MAX_LOGO_EDGE: u32 = 336;

/// Validate a `logo.png` payload and optionally return the normalized
/// PNG bytes.
///
/// With `return_bytes` false the image is still fully decoded and
/// checked, but the result is an empty vector; callers use this to
/// validate without paying for storage.
pub fn validate_logo(bytes: &[u8], return_bytes: bool) -> Result<Vec<u8>, ApiError> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| ApiError::InvalidLogo(e.to_string()))?;

    let (width, height) = (image.width(), image.height());
    if width != height {
        return Err(ApiError::AspectRatio { width, height });
    }

    let image = if width > MAX_LOGO_EDGE {
        debug!("resizing logo from {}x{} to {}x{}", width, height, MAX_LOGO_EDGE, MAX_LOGO_EDGE);
        image.resize_exact(MAX_LOGO_EDGE, MAX_LOGO_EDGE, FilterType::Lanczos3)
    } else {
        image
    };

    if !return_bytes {
        return Ok(Vec::new());
    }

    encode_png(&image)
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, ApiError> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| ApiError::InvalidLogo(e.to_string()))?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn png_of(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            image::Rgba([120, 40, 200, 255]),
        ));
        encode_png(&img).unwrap()
    }

    #[test]
    fn small_square_logo_passes_unchanged_in_size() {
        let bytes = validate_logo(&png_of(200, 200), true).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 200));
    }

    #[test]
    fn oversized_logo_resizes_to_canonical_edge() {
        let bytes = validate_logo(&png_of(400, 400), true).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (336, 336));
    }

    #[test]
    fn exactly_canonical_size_is_not_resized() {
        let bytes = validate_logo(&png_of(336, 336), true).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (336, 336));
    }

    #[test]
    fn non_square_logo_rejected() {
        let err = validate_logo(&png_of(300, 200), true).unwrap_err();
        assert_eq!(err.kind(), "AspectRatioError");
        assert!(err.to_string().contains("300x200"));
    }

    #[test]
    fn undecodable_bytes_rejected() {
        let err = validate_logo(b"definitely not a png", true).unwrap_err();
        assert_eq!(err.kind(), "InvalidLogo");
    }

    #[test]
    fn validate_only_returns_empty_bytes() {
        let bytes = validate_logo(&png_of(128, 128), false).unwrap();
        assert!(bytes.is_empty());
    }

    #[test]
    fn validate_only_still_rejects_bad_logos() {
        assert!(validate_logo(&png_of(10, 20), false).is_err());
        assert!(validate_logo(b"junk", false).is_err());
    }
}
