//! Request-level pipeline: generate, then optionally resize and composite.

use image::RgbaImage;
use tracing::debug;

use crate::compositor;
use crate::error::{Error, RasterInput, Result};
use crate::generator;
use crate::raster::{Png, RasterCodec};
use crate::resize;

/// The watermark is resized to `size / WATERMARK_SCALE_DIVISOR` pixels wide.
pub const WATERMARK_SCALE_DIVISOR: u32 = 4;

/// Largest watermark upload accepted by front ends, in bytes.
pub const MAX_WATERMARK_BYTES: u64 = 1024 * 1024;

/// Check a watermark's byte length against [`MAX_WATERMARK_BYTES`].
///
/// # Errors
///
/// Returns [`Error::WatermarkTooLarge`] if `len` exceeds the limit.
pub fn check_watermark_len(len: u64) -> Result<()> {
    if len > MAX_WATERMARK_BYTES {
        return Err(Error::WatermarkTooLarge {
            len,
            max: MAX_WATERMARK_BYTES,
        });
    }
    Ok(())
}

/// Parse a decimal pixel size such as `"256"`.
///
/// # Errors
///
/// Returns [`Error::InvalidSize`] for empty, non-numeric, zero, negative or
/// oversized input.
pub fn parse_size(raw: &str) -> Result<u32> {
    let trimmed = raw.trim();
    let size: i64 = trimmed
        .parse()
        .map_err(|_| Error::InvalidSize(raw.to_string()))?;
    generator::checked_size(size).map_err(|_| Error::InvalidSize(raw.to_string()))
}

/// A validated QR code request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrSpec {
    content: String,
    size: u32,
}

impl QrSpec {
    /// Validate `content` and `size` into a request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyContent`] for an empty string and
    /// [`Error::InvalidSize`] if `size` is outside `1..=MAX_SIZE`.
    pub fn new(content: impl Into<String>, size: i64) -> Result<Self> {
        let content = content.into();
        if content.is_empty() {
            return Err(Error::EmptyContent);
        }
        let size = generator::checked_size(size)?;
        Ok(Self { content, size })
    }

    /// Content to encode.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Output edge length in pixels.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Width the watermark is resized to before compositing.
    #[must_use]
    pub fn watermark_width(&self) -> u32 {
        self.size / WATERMARK_SCALE_DIVISOR
    }

    /// Render the bare QR code raster.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EncodingFailed`] if the content exceeds QR capacity.
    pub fn render(&self) -> Result<RgbaImage> {
        generator::generate(&self.content, i64::from(self.size))
    }

    /// Render the QR code with a watermark decoded from PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DecodeFailed`] for an invalid watermark,
    /// [`Error::InvalidDimensions`] when the code is too small to give the
    /// watermark a non-zero width or the resized watermark would be too tall, and [`Error::EncodingFailed`] as for
    /// [`QrSpec::render`].
    pub fn render_with_watermark(&self, watermark: &[u8]) -> Result<RgbaImage> {
        let watermark = Png.decode(watermark).map_err(|source| Error::DecodeFailed {
            input: RasterInput::Watermark,
            source,
        })?;
        let overlay = resize::resize_watermark(&watermark, self.watermark_width())?;
        let base = self.render()?;
        Ok(compositor::composite(&base, &overlay, i64::from(self.size)))
    }

    /// Generate the QR code as PNG bytes.
    ///
    /// # Errors
    ///
    /// See [`QrSpec::render`]; also [`Error::EncodeFailed`].
    pub fn generate(&self) -> Result<Vec<u8>> {
        encode(&self.render()?)
    }

    /// Generate the watermarked QR code as PNG bytes.
    ///
    /// # Errors
    ///
    /// See [`QrSpec::render_with_watermark`]; also [`Error::EncodeFailed`].
    pub fn generate_with_watermark(&self, watermark: &[u8]) -> Result<Vec<u8>> {
        encode(&self.render_with_watermark(watermark)?)
    }
}

/// Build a PNG for `content`, watermarking it when `watermark` is present.
///
/// # Errors
///
/// Any error from [`QrSpec::new`], [`QrSpec::generate`] or
/// [`QrSpec::generate_with_watermark`].
pub fn build_qr_png(content: &str, size: i64, watermark: Option<&[u8]>) -> Result<Vec<u8>> {
    let spec = QrSpec::new(content, size)?;
    let png = match watermark {
        Some(bytes) => spec.generate_with_watermark(bytes)?,
        None => spec.generate()?,
    };
    debug!(
        size = spec.size(),
        watermarked = watermark.is_some(),
        bytes = png.len(),
        "Built QR code PNG"
    );
    Ok(png)
}

fn encode(image: &RgbaImage) -> Result<Vec<u8>> {
    Png.encode(image).map_err(Error::EncodeFailed)
}
