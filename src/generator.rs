//! QR code rasterization.
//!
//! Content is encoded at medium error correction and drawn as opaque black
//! modules on an opaque white canvas of exactly `size x size` pixels.

use image::{Rgba, RgbaImage};
use qrcode::{Color, EcLevel, QrCode};
use tracing::debug;

use crate::error::{Error, Result};
use crate::raster::{Png, RasterCodec};

/// Width of the light border around the symbol, in modules.
pub const QUIET_ZONE_MODULES: u32 = 4;

/// Error-correction level used for every generated code.
pub const EC_LEVEL: EcLevel = EcLevel::M;

/// Largest accepted edge length, in pixels, for any raster this crate allocates.
pub const MAX_SIZE: u32 = 8192;

const DARK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const LIGHT: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Validate a signed pixel size and narrow it to `u32`.
///
/// # Errors
///
/// Returns [`Error::InvalidSize`] if `size <= 0` or `size > MAX_SIZE`.
pub fn checked_size(size: i64) -> Result<u32> {
    match u32::try_from(size) {
        Ok(size) if (1..=MAX_SIZE).contains(&size) => Ok(size),
        _ => Err(Error::InvalidSize(size.to_string())),
    }
}

/// Generate a `size x size` QR code raster for `content`.
///
/// # Errors
///
/// Returns [`Error::InvalidSize`] for sizes outside `1..=MAX_SIZE` and
/// [`Error::EncodingFailed`] if the content exceeds QR capacity.
pub fn generate(content: &str, size: i64) -> Result<RgbaImage> {
    let size = checked_size(size)?;
    let code = QrCode::with_error_correction_level(content, EC_LEVEL)
        .map_err(Error::EncodingFailed)?;
    debug!(modules = code.width(), size, "Encoded QR symbol");
    Ok(rasterize(&code, size))
}

/// Generate a QR code and encode it as PNG.
///
/// # Errors
///
/// Same as [`generate`], plus [`Error::EncodeFailed`] if PNG encoding fails.
pub fn generate_png(content: &str, size: i64) -> Result<Vec<u8>> {
    let img = generate(content, size)?;
    Png.encode(&img).map_err(Error::EncodeFailed)
}

/// Draw the symbol plus quiet zone into a `size x size` canvas.
///
/// With room for at least one pixel per module, modules are scaled by an
/// integer factor and the leftover pixels become extra border split evenly.
/// Otherwise modules are sampled nearest-neighbour.
fn rasterize(code: &QrCode, size: u32) -> RgbaImage {
    #[allow(clippy::cast_possible_truncation)]
    let symbol = code.width() as u32;
    let total = symbol + 2 * QUIET_ZONE_MODULES;
    let colors = code.to_colors();

    let module_at = |px: u32| -> Option<u32> {
        let m = if size >= total {
            let scale = size / total;
            let offset = (size - total * scale) / 2;
            if px < offset || px >= offset + total * scale {
                return None;
            }
            (px - offset) / scale
        } else {
            u32::try_from(u64::from(px) * u64::from(total) / u64::from(size)).ok()?
        };
        m.checked_sub(QUIET_ZONE_MODULES).filter(|&m| m < symbol)
    };

    RgbaImage::from_fn(size, size, |x, y| match (module_at(x), module_at(y)) {
        (Some(mx), Some(my)) if colors[(my * symbol + mx) as usize] == Color::Dark => DARK,
        _ => LIGHT,
    })
}
