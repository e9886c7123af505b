//! Image resizing functions used by the compression pipeline.
//!
//! Provides resize operations using the `image` crate's algorithms.
//! All functions return new `RasterImage` instances without modifying the input.

use super::{DecodeError, FilterType, RasterImage};

/// Resize an image to exact dimensions.
///
/// # Arguments
///
/// * `image` - The source image to resize
/// * `width` - Target width in pixels
/// * `height` - Target height in pixels
/// * `filter` - Interpolation filter to use
///
/// # Errors
///
/// Returns `DecodeError::InvalidDimensions` for a zero target dimension and
/// `DecodeError::CorruptedData` if the source pixel buffer does not match its
/// dimensions.
pub fn resize(
    image: &RasterImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<RasterImage, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidDimensions { width, height });
    }

    // Fast path: if dimensions match, just clone
    if image.width == width && image.height == height {
        return Ok(image.clone());
    }

    let rgb_image = image
        .to_rgb_image()
        .ok_or_else(|| DecodeError::CorruptedData("Failed to create RgbImage".to_string()))?;

    let resized = image::imageops::resize(&rgb_image, width, height, filter.to_image_filter());

    Ok(RasterImage::from_rgb_image(resized))
}

/// Scale both dimensions by `factor`, rounding to the nearest pixel.
///
/// Each result is at least 1 pixel.
pub fn scale_dimensions(width: u32, height: u32, factor: f64) -> (u32, u32) {
    let scale = |value: u32| ((value as f64 * factor).round() as u32).max(1);
    (scale(width), scale(height))
}

/// Dimensions that bring `width * height` down to at most `max_pixels`
/// while preserving aspect ratio.
///
/// Returns `None` when the image is already within budget. Each side is
/// scaled by `s = sqrt(max_pixels / (width * height))` and truncated, so the
/// pixel count always drops and stays within `max_pixels` while both scaled
/// sides are at least 1.
///
/// Thin images are the exception: a side that scales below 1 is clamped up
/// to 1, and the result is then `floor(max(width, height) * s)` pixels, which
/// can be far above `max_pixels` (5000x1 with a budget of 10 becomes 223x1).
pub fn fit_pixel_budget(width: u32, height: u32, max_pixels: u64) -> Option<(u32, u32)> {
    let total = width as u64 * height as u64;
    if total <= max_pixels || total == 0 {
        return None;
    }

    let scale_factor = (max_pixels as f64 / total as f64).sqrt();
    let scale = |value: u32| ((value as f64 * scale_factor).floor() as u32).max(1);
    Some((scale(width), scale(height)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_image(width: u32, height: u32) -> RasterImage {
        // Create a simple gradient image for testing
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(((x * 255) / width.max(1)) as u8); // R
                pixels.push(((y * 255) / height.max(1)) as u8); // G
                pixels.push(128); // B
            }
        }
        RasterImage::new(width, height, pixels)
    }

    #[test]
    fn test_resize_basic() {
        let img = create_test_image(100, 50);
        let resized = resize(&img, 50, 25, FilterType::Bilinear).unwrap();

        assert_eq!(resized.width, 50);
        assert_eq!(resized.height, 25);
        assert_eq!(resized.pixels.len(), 50 * 25 * 3);
    }

    #[test]
    fn test_resize_same_dimensions() {
        let img = create_test_image(100, 50);
        let resized = resize(&img, 100, 50, FilterType::Bilinear).unwrap();

        assert_eq!(resized, img);
    }

    #[test]
    fn test_resize_does_not_touch_source() {
        let img = create_test_image(40, 40);
        let before = img.clone();
        let _ = resize(&img, 20, 20, FilterType::Lanczos3).unwrap();
        assert_eq!(img, before);
    }

    #[test]
    fn test_resize_zero_dimensions_error() {
        let img = create_test_image(100, 50);

        assert!(matches!(
            resize(&img, 0, 50, FilterType::Bilinear),
            Err(DecodeError::InvalidDimensions { .. })
        ));
        assert!(resize(&img, 50, 0, FilterType::Bilinear).is_err());
    }

    #[test]
    fn test_resize_mismatched_buffer_error() {
        let img = RasterImage {
            width: 10,
            height: 10,
            pixels: vec![0u8; 5],
        };
        assert!(matches!(
            resize(&img, 5, 5, FilterType::Nearest),
            Err(DecodeError::CorruptedData(_))
        ));
    }

    #[test]
    fn test_scale_dimensions_rounds_to_nearest() {
        assert_eq!(scale_dimensions(100, 50, 0.9), (90, 45));
        // 15 * 0.9 = 13.5 rounds up, 11 * 0.9 = 9.9 rounds up
        assert_eq!(scale_dimensions(15, 11, 0.9), (14, 10));
    }

    #[test]
    fn test_scale_dimensions_never_reaches_zero() {
        assert_eq!(scale_dimensions(1, 1, 0.1), (1, 1));
    }

    #[test]
    fn test_fit_pixel_budget_within_budget() {
        assert_eq!(fit_pixel_budget(1000, 1000, 1_000_000), None);
        assert_eq!(fit_pixel_budget(10, 10, 1_000_000), None);
    }

    #[test]
    fn test_fit_pixel_budget_square() {
        assert_eq!(fit_pixel_budget(2000, 2000, 1_000_000), Some((1000, 1000)));
    }

    #[test]
    fn test_fit_pixel_budget_preserves_aspect_ratio() {
        let (w, h) = fit_pixel_budget(3000, 1500, 1_000_000).unwrap();
        // sqrt(1e6 / 4.5e6) = 0.4714
        assert_eq!((w, h), (1414, 707));
        assert!((w as f64 / h as f64 - 2.0).abs() < 0.01);
    }

    #[test]
    fn test_fit_pixel_budget_never_exceeds_ceiling_near_boundary() {
        // sqrt(4095 / 4096) rounds back to 64 per side; truncation must not.
        let (w, h) = fit_pixel_budget(64, 64, 4095).unwrap();
        assert_eq!((w, h), (63, 63));
        assert!(w as u64 * h as u64 <= 4095);
    }

    #[test]
    fn test_fit_pixel_budget_clamps_thin_images() {
        assert_eq!(fit_pixel_budget(1, 64, 1), Some((1, 8)));
        // The clamped side leaves the long side at floor(5000 * sqrt(10 / 5000)).
        assert_eq!(fit_pixel_budget(5000, 1, 10), Some((223, 1)));
    }

    #[test]
    fn test_all_filter_types() {
        let img = create_test_image(100, 50);

        for filter in [
            FilterType::Nearest,
            FilterType::Bilinear,
            FilterType::Lanczos3,
        ] {
            let resized = resize(&img, 50, 25, filter).unwrap();
            assert_eq!(resized.width, 50);
            assert_eq!(resized.height, 25);
        }
    }
}
