//! Size-bounded JPEG compression.
//!
//! The search first brings the image under the pixel ceiling, then alternates
//! "encode, and if too large lower the quality and shrink by
//! `downscale_factor`" until the encoding fits `max_bytes`. The search is
//! bounded by `max_iterations` and `min_dimension`; when a bound is hit the
//! smallest encoding seen so far is returned instead of an error.

use std::borrow::Cow;

use tracing::{debug, warn};

use super::{CompressError, CompressionParams};
use crate::decode::{decode_image, fit_pixel_budget, resize, scale_dimensions, RasterImage};
use crate::encode::encode_raster;

/// One encode attempt of the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub quality: u8,
    pub width: u32,
    pub height: u32,
    pub encoded_len: usize,
}

/// Result of [`compress_image`].
#[derive(Debug, Clone)]
pub struct CompressionOutcome {
    /// JPEG bytes of the chosen attempt.
    pub bytes: Vec<u8>,
    /// Quality the chosen attempt was encoded at.
    pub quality: u8,
    /// Dimensions of the chosen attempt.
    pub width: u32,
    pub height: u32,
    /// Whether the pixel-ceiling resize ran.
    pub pre_resized: bool,
    /// Whether `bytes` fits within `max_bytes`.
    pub fits: bool,
    /// Every attempt in order.
    pub attempts: Vec<Attempt>,
}

impl CompressionOutcome {
    fn from_attempt(
        bytes: Vec<u8>,
        attempt: Attempt,
        pre_resized: bool,
        fits: bool,
        attempts: Vec<Attempt>,
    ) -> Self {
        Self {
            bytes,
            quality: attempt.quality,
            width: attempt.width,
            height: attempt.height,
            pre_resized,
            fits,
            attempts,
        }
    }
}

/// Compress `image` into a JPEG no larger than `params.max_bytes` if
/// possible.
///
/// # Errors
///
/// Returns `CompressError::InvalidInput` for a zero-area image, a pixel buffer
/// that doesn't match the dimensions, or parameters that fail
/// [`CompressionParams::validate`]. Failing to meet the byte ceiling is not
/// an error; check [`CompressionOutcome::fits`].
pub fn compress_image(
    image: &RasterImage,
    params: &CompressionParams,
) -> Result<CompressionOutcome, CompressError> {
    params.validate()?;
    validate_image(image)?;

    let mut current = Cow::Borrowed(image);
    let pre_resized = match fit_pixel_budget(image.width, image.height, params.max_pixels) {
        Some((width, height)) => {
            debug!(
                from_width = image.width,
                from_height = image.height,
                width,
                height,
                "pre-resizing to pixel ceiling"
            );
            current = Cow::Owned(resize(image, width, height, params.filter)?);
            true
        }
        None => false,
    };

    let mut quality = params.initial_quality;
    let mut attempts: Vec<Attempt> = Vec::new();
    let mut best: Option<(Vec<u8>, Attempt)> = None;

    loop {
        let bytes = encode_raster(&current, quality)?;
        let attempt = Attempt {
            quality,
            width: current.width,
            height: current.height,
            encoded_len: bytes.len(),
        };
        attempts.push(attempt);
        debug!(
            quality,
            width = attempt.width,
            height = attempt.height,
            encoded_len = attempt.encoded_len,
            max_bytes = params.max_bytes,
            "compression attempt"
        );

        if bytes.len() as u64 <= params.max_bytes {
            return Ok(CompressionOutcome::from_attempt(
                bytes,
                attempt,
                pre_resized,
                true,
                attempts,
            ));
        }

        if best
            .as_ref()
            .map_or(true, |(_, prev)| attempt.encoded_len < prev.encoded_len)
        {
            best = Some((bytes, attempt));
        }

        if attempts.len() as u64 >= params.max_iterations as u64 {
            break;
        }

        let (next_width, next_height) =
            scale_dimensions(current.width, current.height, params.downscale_factor);
        let can_shrink = next_width >= params.min_dimension
            && next_height >= params.min_dimension
            && (next_width, next_height) != (current.width, current.height);

        // At the floor with no room to shrink, another attempt would repeat the last one.
        if !can_shrink && quality == params.quality_floor {
            break;
        }

        quality = quality
            .saturating_sub(params.quality_step)
            .max(params.quality_floor);
        if can_shrink {
            current = Cow::Owned(resize(&current, next_width, next_height, params.filter)?);
        }
    }

    let (bytes, attempt) = best.ok_or_else(|| {
        CompressError::InvalidInput("no compression attempt was made".to_string())
    })?;
    warn!(
        encoded_len = attempt.encoded_len,
        max_bytes = params.max_bytes,
        quality = attempt.quality,
        width = attempt.width,
        height = attempt.height,
        attempts = attempts.len(),
        "byte ceiling not reached; returning smallest attempt"
    );
    Ok(CompressionOutcome::from_attempt(
        bytes,
        attempt,
        pre_resized,
        false,
        attempts,
    ))
}

/// Compress with the given parameters and return only the JPEG bytes.
pub fn compress(image: &RasterImage, params: &CompressionParams) -> Result<Vec<u8>, CompressError> {
    compress_image(image, params).map(|outcome| outcome.bytes)
}

/// Decode encoded image bytes and compress the result.
///
/// Unreadable bytes are reported as `CompressError::InvalidInput`.
pub fn compress_encoded(
    bytes: &[u8],
    params: &CompressionParams,
) -> Result<CompressionOutcome, CompressError> {
    let image = decode_image(bytes)
        .map_err(|e| CompressError::InvalidInput(format!("unreadable image: {e}")))?;
    compress_image(&image, params)
}

fn validate_image(image: &RasterImage) -> Result<(), CompressError> {
    if image.pixel_count() == 0 {
        return Err(CompressError::InvalidInput(format!(
            "image has zero area ({}x{})",
            image.width, image.height
        )));
    }
    if image.pixels.len() != image.expected_byte_size() {
        return Err(CompressError::InvalidInput(format!(
            "pixel buffer holds {} bytes, expected {} for {}x{} RGB",
            image.pixels.len(),
            image.expected_byte_size(),
            image.width,
            image.height
        )));
    }
    Ok(())
}
