//! Generate QR code PNGs with an optional watermark centered over the code.
//!
//! Content is encoded at medium error correction and drawn into an exact
//! `size x size` raster. A watermark, if given, is resized with a Lanczos-3
//! filter to a quarter of the code's width and alpha-composited near the center.
//!
//! # Quick Start
//!
//! ```no_run
//! use qr_watermark::QrSpec;
//!
//! let spec = QrSpec::new("https://example.com", 256).expect("valid request");
//! let png = spec.generate().expect("failed to generate");
//! std::fs::write("qr.png", png).unwrap();
//! ```
//!
//! # Watermarks
//!
//! The watermark must be a PNG. Its top-left corner lands at
//! `(size/2 - 32, size/2 - 32)`, which centers it exactly only when it ends up
//! 64x64 after resizing (a 256px code).
//!
//! ```no_run
//! use qr_watermark::QrSpec;
//!
//! let logo = std::fs::read("logo.png").unwrap();
//! let spec = QrSpec::new("https://example.com", 256).expect("valid request");
//! let png = spec.generate_with_watermark(&logo).expect("failed to watermark");
//! std::fs::write("qr-logo.png", png).unwrap();
//! ```

#![deny(missing_docs)]

pub mod compositor;
pub mod error;
pub mod generator;
mod pipeline;
pub mod raster;
pub mod resize;

pub use error::{Error, ErrorKind, RasterInput, Result};
pub use generator::MAX_SIZE;
pub use pipeline::{
    build_qr_png, check_watermark_len, parse_size, QrSpec, MAX_WATERMARK_BYTES,
    WATERMARK_SCALE_DIVISOR,
};
pub use raster::{Png, RasterCodec, PNG_CONTENT_TYPE};
