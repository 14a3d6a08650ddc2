//! Centering and source-over compositing of a watermark onto a QR code.
//!
//! The overlay is placed with its top-left corner at
//! `(size/2 - 32, size/2 - 32)`, i.e. the offset of a 64x64 footprint centered
//! on the code. The offset does not look at the overlay's real dimensions.
//!
//! Blending uses the non-premultiplied "over" operator:
//! `out_a = src_a + dst_a * (1 - src_a)`
//! `out_c = (src_c * src_a + dst_c * dst_a * (1 - src_a)) / out_a`

use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::error::{Error, RasterInput, Result};
use crate::raster::{Png, RasterCodec};

/// Half of the assumed overlay footprint, in pixels.
pub const OVERLAY_HALF_FOOTPRINT: i64 = 32;

/// Top-left corner for the overlay on a code of `base_size` pixels.
#[must_use]
pub fn overlay_offset(base_size: i64) -> (i64, i64) {
    let c = base_size / 2 - OVERLAY_HALF_FOOTPRINT;
    (c, c)
}

/// Blend `src` over `dst` in place.
///
/// Fully transparent sources leave `dst` untouched and fully opaque sources
/// replace it.
pub fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    match src[3] {
        0 => {}
        255 => *dst = src,
        sa => {
            let sa = f32::from(sa) / 255.0;
            let da = f32::from(dst[3]) / 255.0;
            let out_a = sa + da * (1.0 - sa);
            for ch in 0..3 {
                let c = (f32::from(src[ch]) * sa + f32::from(dst[ch]) * da * (1.0 - sa)) / out_a;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                {
                    dst[ch] = c.round().clamp(0.0, 255.0) as u8;
                }
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

/// Draw `overlay` over `canvas` with its top-left corner at `(x, y)`.
///
/// Parts of the overlay falling outside the canvas are clipped.
pub fn draw_over(canvas: &mut RgbaImage, overlay: &RgbaImage, x: i64, y: i64) {
    let (cw, ch) = (i64::from(canvas.width()), i64::from(canvas.height()));
    let (ow, oh) = (i64::from(overlay.width()), i64::from(overlay.height()));

    // Clip to canvas bounds
    let x1 = x.max(0);
    let y1 = y.max(0);
    let x2 = (x + ow).min(cw);
    let y2 = (y + oh).min(ch);
    if x1 >= x2 || y1 >= y2 {
        return;
    }

    for cy in y1..y2 {
        for cx in x1..x2 {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let (src_x, src_y, dst_x, dst_y) =
                ((cx - x) as u32, (cy - y) as u32, cx as u32, cy as u32);
            let src = *overlay.get_pixel(src_x, src_y);
            blend_over(canvas.get_pixel_mut(dst_x, dst_y), src);
        }
    }
}

/// Composite an already resized `overlay` onto `base`.
///
/// Returns a fresh canvas with `base`'s bounds; neither input is modified.
#[must_use]
pub fn composite(base: &RgbaImage, overlay: &RgbaImage, base_size: i64) -> RgbaImage {
    let (x, y) = overlay_offset(base_size);
    debug!(
        base_width = base.width(),
        base_height = base.height(),
        overlay_width = overlay.width(),
        overlay_height = overlay.height(),
        x,
        y,
        "Compositing watermark"
    );
    let mut canvas = base.clone();
    draw_over(&mut canvas, overlay, x, y);
    canvas
}

/// Decode both rasters with `codec`, composite, and re-encode.
///
/// # Errors
///
/// Returns [`Error::DecodeFailed`] naming the input that could not be decoded,
/// or [`Error::EncodeFailed`] if the result cannot be encoded.
pub fn composite_encoded<C: RasterCodec>(
    codec: &C,
    base: &[u8],
    overlay: &[u8],
    base_size: i64,
) -> Result<Vec<u8>> {
    let base = codec.decode(base).map_err(|source| Error::DecodeFailed {
        input: RasterInput::QrCode,
        source,
    })?;
    let overlay = codec.decode(overlay).map_err(|source| Error::DecodeFailed {
        input: RasterInput::Watermark,
        source,
    })?;
    codec
        .encode(&composite(&base, &overlay, base_size))
        .map_err(Error::EncodeFailed)
}

/// [`composite_encoded`] with the PNG codec.
///
/// # Errors
///
/// See [`composite_encoded`].
pub fn composite_png(base: &[u8], overlay: &[u8], base_size: i64) -> Result<Vec<u8>> {
    composite_encoded(&Png, base, overlay, base_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn striped_base(size: u32) -> RgbaImage {
        RgbaImage::from_fn(size, size, |x, _| {
            if x % 3 == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                WHITE
            }
        })
    }

    #[test]
    fn offset_assumes_64px_footprint() {
        assert_eq!(overlay_offset(256), (96, 96));
        assert_eq!(overlay_offset(257), (96, 96));
        assert_eq!(overlay_offset(64), (0, 0));
        assert_eq!(overlay_offset(10), (-27, -27));
    }

    #[test]
    fn opaque_overlay_is_centered() {
        let base = RgbaImage::from_pixel(256, 256, WHITE);
        let overlay = RgbaImage::from_pixel(64, 64, RED);
        let out = composite(&base, &overlay, 256);

        assert_eq!(*out.get_pixel(128, 128), RED);
        assert_eq!(*out.get_pixel(96, 96), RED);
        assert_eq!(*out.get_pixel(159, 159), RED);
        assert_eq!(*out.get_pixel(95, 128), WHITE);
        assert_eq!(*out.get_pixel(160, 128), WHITE);
        assert_eq!(*out.get_pixel(128, 95), WHITE);
        assert_eq!(*out.get_pixel(128, 160), WHITE);
    }

    #[test]
    fn offset_ignores_actual_overlay_size() {
        let base = RgbaImage::from_pixel(256, 256, WHITE);
        let overlay = RgbaImage::from_pixel(16, 8, RED);
        let out = composite(&base, &overlay, 256);
        assert_eq!(*out.get_pixel(96, 96), RED);
        assert_eq!(*out.get_pixel(111, 103), RED);
        assert_eq!(*out.get_pixel(112, 96), WHITE);
        assert_eq!(*out.get_pixel(128, 128), WHITE);
    }

    #[test]
    fn transparent_overlay_leaves_base_unchanged() {
        let base = striped_base(128);
        let overlay = RgbaImage::from_pixel(64, 64, Rgba([12, 34, 56, 0]));
        let out = composite(&base, &overlay, 128);
        assert_eq!(out, base);
    }

    #[test]
    fn partial_alpha_blends() {
        let mut dst = WHITE;
        blend_over(&mut dst, Rgba([0, 0, 0, 128]));
        assert_eq!(dst[3], 255);
        for ch in 0..3 {
            assert!((126..=128).contains(&dst[ch]), "channel {ch} = {}", dst[ch]);
        }

        let mut clear = Rgba([0, 0, 0, 0]);
        blend_over(&mut clear, Rgba([200, 100, 50, 51]));
        assert_eq!(clear, Rgba([200, 100, 50, 51]));
    }

    #[test]
    fn overlay_is_clipped_at_canvas_edges() {
        let base = RgbaImage::from_pixel(40, 40, WHITE);
        let overlay = RgbaImage::from_pixel(64, 64, RED);
        // offset (-12, -12): overlay covers the whole canvas
        let out = composite(&base, &overlay, 40);
        assert!(out.pixels().all(|p| *p == RED));

        let mut canvas = RgbaImage::from_pixel(10, 10, WHITE);
        draw_over(&mut canvas, &overlay, 100, 100);
        assert!(canvas.pixels().all(|p| *p == WHITE));
        draw_over(&mut canvas, &overlay, -70, 0);
        assert!(canvas.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn encoded_composite_rejects_bad_inputs() {
        let good = Png.encode(&striped_base(64)).unwrap();

        let err = composite_png(b"junk", &good, 64).unwrap_err();
        assert!(matches!(
            err,
            Error::DecodeFailed {
                input: RasterInput::QrCode,
                ..
            }
        ));

        let err = composite_png(&good, &good[..good.len() / 2], 64).unwrap_err();
        assert!(matches!(
            err,
            Error::DecodeFailed {
                input: RasterInput::Watermark,
                ..
            }
        ));
    }

    #[test]
    fn encoded_composite_roundtrips() {
        let base = Png.encode(&striped_base(128)).unwrap();
        let overlay = Png
            .encode(&RgbaImage::from_pixel(32, 32, Rgba([0, 255, 0, 200])))
            .unwrap();
        let out = composite_png(&base, &overlay, 128).unwrap();
        let decoded = Png.decode(&out).unwrap();
        assert_eq!(decoded.dimensions(), (128, 128));
        assert_eq!(Png.encode(&decoded).unwrap(), out);
    }
}
