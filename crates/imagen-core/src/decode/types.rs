//! Core types for raster images.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures while turning bytes into pixels, or pixels into other pixels.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The bytes are not in a recognized or supported image format.
    #[error("Unrecognized image format")]
    InvalidFormat,

    /// The image data is corrupted or incomplete.
    #[error("Corrupted or incomplete image data: {0}")]
    CorruptedData(String),

    /// Target dimensions for a resize were zero.
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Resampling filter used when an image is resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    /// Pixel replication. Only useful for tests and thumbnails.
    Nearest,
    /// Triangle filter.
    Bilinear,
    /// Matches the LANCZOS resampling generated images were tuned for.
    #[default]
    Lanczos3,
}

impl FilterType {
    /// The equivalent `image::imageops` filter.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// A decoded RGB8 image. Resizing always produces a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    /// Row-major RGB triples; `width * height * 3` bytes.
    pub pixels: Vec<u8>,
}

impl RasterImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            (width as usize) * (height as usize) * 3,
            "pixel buffer does not match {width}x{height}"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Create a single-color image.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let count = (width as usize) * (height as usize);
        let mut pixels = Vec::with_capacity(count * 3);
        for _ in 0..count {
            pixels.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn from_rgb_image(rgb: image::RgbImage) -> Self {
        Self {
            width: rgb.width(),
            height: rgb.height(),
            pixels: rgb.into_raw(),
        }
    }

    /// Copy into an `image::RgbImage`; `None` if the buffer length is wrong.
    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// Total number of pixels, computed without overflow.
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Expected length of the pixel buffer for the current dimensions.
    pub fn expected_byte_size(&self) -> usize {
        (self.width as usize) * (self.height as usize) * 3
    }
}
