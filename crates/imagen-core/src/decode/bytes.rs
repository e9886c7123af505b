//! Decoding of encoded image bytes (PNG or JPEG) into RGB rasters.

use std::io::Cursor;

use image::ImageReader;

use super::{DecodeError, RasterImage};

/// Decode an encoded image from bytes.
///
/// The container format is guessed from the leading magic bytes. The result
/// is always converted to RGB8; alpha is discarded.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the format cannot be recognized and
/// `DecodeError::CorruptedData` if decoding fails.
pub fn decode_image(bytes: &[u8]) -> Result<RasterImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::InvalidFormat);
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedData(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedData(e.to_string()))?;

    Ok(RasterImage::from_rgb_image(img.into_rgb8()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 100, 50, 128]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_png_drops_alpha() {
        let decoded = decode_image(&png_bytes(7, 3)).unwrap();

        assert_eq!(decoded.width, 7);
        assert_eq!(decoded.height, 3);
        assert_eq!(decoded.pixels.len(), 7 * 3 * 3);
        assert_eq!(&decoded.pixels[0..3], &[200, 100, 50]);
    }

    #[test]
    fn test_decode_jpeg() {
        let pixels = vec![128u8; 16 * 8 * 3];
        let jpeg = crate::encode::encode_jpeg(&pixels, 16, 8, 90).unwrap();

        let decoded = decode_image(&jpeg).unwrap();
        assert_eq!((decoded.width, decoded.height), (16, 8));
    }

    #[test]
    fn test_decode_empty_bytes() {
        assert!(matches!(decode_image(&[]), Err(DecodeError::InvalidFormat)));
    }

    #[test]
    fn test_decode_garbage_bytes() {
        let result = decode_image(b"definitely not an image");
        assert!(matches!(result, Err(DecodeError::InvalidFormat)));
    }

    #[test]
    fn test_decode_truncated_png() {
        let bytes = png_bytes(32, 32);
        let result = decode_image(&bytes[..bytes.len() / 2]);
        assert!(matches!(result, Err(DecodeError::CorruptedData(_))));
    }
}
