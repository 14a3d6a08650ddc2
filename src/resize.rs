//! Aspect-preserving watermark resize with a Lanczos-3 kernel.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use tracing::debug;

use crate::error::{Error, RasterInput, Result};
use crate::generator::MAX_SIZE;
use crate::raster::{Png, RasterCodec};

/// Resampling filter used for every watermark resize.
pub const RESIZE_FILTER: FilterType = FilterType::Lanczos3;

/// Height that keeps the `width x height` aspect ratio at `target_width`.
///
/// Rounds with a +0.7 bias before truncating, never returning less than 1.
#[must_use]
pub fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    if width == 0 {
        return 1;
    }
    let scaled = f64::from(target_width) * f64::from(height) / f64::from(width);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let h = (scaled + 0.7).min(f64::from(u32::MAX)) as u32;
    h.max(1)
}

/// Resize a watermark to `target_width`, preserving its aspect ratio.
///
/// # Errors
///
/// Returns [`Error::InvalidDimensions`] if `target_width` is zero or either
/// target side exceeds [`MAX_SIZE`].
pub fn resize_watermark(watermark: &RgbaImage, target_width: u32) -> Result<RgbaImage> {
    let (w, h) = watermark.dimensions();
    let target_height = scaled_height(w, h, target_width);
    if target_width == 0 || target_width > MAX_SIZE || target_height > MAX_SIZE {
        return Err(Error::InvalidDimensions {
            width: target_width,
            height: target_height,
            max: MAX_SIZE,
        });
    }
    debug!(
        from_width = w,
        from_height = h,
        target_width,
        target_height,
        "Resizing watermark"
    );
    Ok(imageops::resize(
        watermark,
        target_width,
        target_height,
        RESIZE_FILTER,
    ))
}

/// Decode PNG watermark bytes, resize them, and re-encode as PNG.
///
/// # Errors
///
/// Returns [`Error::DecodeFailed`] for bytes that are not a valid PNG,
/// [`Error::InvalidDimensions`] for a zero or oversized target, and
/// [`Error::EncodeFailed`] if the result cannot be encoded.
pub fn resize_watermark_png(watermark: &[u8], target_width: u32) -> Result<Vec<u8>> {
    let decoded = Png
        .decode(watermark)
        .map_err(|source| Error::DecodeFailed {
            input: RasterInput::Watermark,
            source,
        })?;
    let resized = resize_watermark(&decoded, target_width)?;
    Png.encode(&resized).map_err(Error::EncodeFailed)
}
