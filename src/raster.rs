//! Raster encode/decode capability.
//!
//! Every raster handled by this crate is an [`RgbaImage`]. The binary format
//! used on the way in and out is abstracted behind [`RasterCodec`] so the
//! composition logic never touches a concrete codec.

use std::io::Cursor;

use image::{ImageFormat, ImageResult, RgbaImage};

/// MIME type of the bytes produced by [`Png`].
pub const PNG_CONTENT_TYPE: &str = "image/png";

/// Decode bytes into an RGBA raster and encode it back.
pub trait RasterCodec {
    /// Decode raw bytes into an RGBA raster.
    ///
    /// # Errors
    ///
    /// Returns the decoder error if `bytes` is not a valid image in this format.
    fn decode(&self, bytes: &[u8]) -> ImageResult<RgbaImage>;

    /// Encode an RGBA raster into raw bytes.
    ///
    /// # Errors
    ///
    /// Returns the encoder error if the raster cannot be serialized.
    fn encode(&self, image: &RgbaImage) -> ImageResult<Vec<u8>>;

    /// MIME type of the encoded bytes.
    fn content_type(&self) -> &'static str;
}

/// The PNG codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct Png;

impl RasterCodec for Png {
    fn decode(&self, bytes: &[u8]) -> ImageResult<RgbaImage> {
        Ok(image::load_from_memory_with_format(bytes, ImageFormat::Png)?.to_rgba8())
    }

    fn encode(&self, image: &RgbaImage) -> ImageResult<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, ImageFormat::Png)?;
        Ok(buf.into_inner())
    }

    fn content_type(&self) -> &'static str {
        PNG_CONTENT_TYPE
    }
}
