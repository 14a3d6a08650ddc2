//! Error types for the qr-watermark crate.

use std::fmt;

use serde_json::{Map, Value};

/// Which raster input failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterInput {
    /// The generated QR code raster.
    QrCode,
    /// The user-supplied watermark raster.
    Watermark,
}

impl fmt::Display for RasterInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QrCode => f.write_str("QR code"),
            Self::Watermark => f.write_str("watermark"),
        }
    }
}

/// Coarse classification of an [`Error`], stable across message changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Size was non-positive, out of range, or not a number.
    InvalidSize,
    /// QR content was empty.
    EmptyContent,
    /// The QR encoder rejected the content.
    EncodingFailed,
    /// Raster bytes were not a valid image of the expected format.
    DecodeFailed,
    /// A resize target was zero or too large.
    InvalidDimensions,
    /// The watermark upload exceeded the size limit.
    WatermarkTooLarge,
    /// The result raster could not be serialized.
    EncodeFailed,
    /// Reading or writing a file failed.
    Io,
}

/// Errors that can occur while generating or watermarking a QR code.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested size is not a positive pixel count.
    #[error("invalid QR code size `{0}`: expected a positive integer number of pixels")]
    InvalidSize(String),

    /// The QR content is empty.
    #[error("QR code content must not be empty")]
    EmptyContent,

    /// The content cannot be encoded at the fixed error-correction level.
    #[error("could not generate a QR code: {0}")]
    EncodingFailed(qrcode::types::QrError),

    /// Input bytes could not be decoded as a raster of the expected format.
    #[error("could not decode {input}: {source}")]
    DecodeFailed {
        /// Which input was being decoded.
        input: RasterInput,
        /// Underlying decoder error.
        #[source]
        source: image::ImageError,
    },

    /// A resize target was zero or exceeded the pixel limit.
    #[error("invalid watermark dimensions {width}x{height}: each side must be between 1 and {max}")]
    InvalidDimensions {
        /// Requested target width in pixels.
        width: u32,
        /// Target height derived from the aspect ratio.
        height: u32,
        /// Largest accepted side.
        max: u32,
    },

    /// The watermark bytes exceed the upload limit.
    #[error("watermark is {len} bytes, larger than the {max} byte limit")]
    WatermarkTooLarge {
        /// Size of the watermark in bytes.
        len: u64,
        /// Largest accepted size in bytes.
        max: u64,
    },

    /// The resulting raster could not be encoded.
    #[error("could not encode image: {0}")]
    EncodeFailed(#[source] image::ImageError),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSize(_) => ErrorKind::InvalidSize,
            Self::EmptyContent => ErrorKind::EmptyContent,
            Self::EncodingFailed(_) => ErrorKind::EncodingFailed,
            Self::DecodeFailed { .. } => ErrorKind::DecodeFailed,
            Self::InvalidDimensions { .. } => ErrorKind::InvalidDimensions,
            Self::WatermarkTooLarge { .. } => ErrorKind::WatermarkTooLarge,
            Self::EncodeFailed(_) => ErrorKind::EncodeFailed,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Short headline naming the step that failed.
    #[must_use]
    pub fn context(&self) -> &'static str {
        match self {
            Self::InvalidSize(_) => "Could not determine the desired QR code size.",
            Self::EmptyContent => "Could not determine the desired QR code content.",
            Self::EncodingFailed(_) => "Could not generate QR code.",
            Self::DecodeFailed {
                input: RasterInput::Watermark,
                ..
            } => "Could not read the watermark image.",
            Self::DecodeFailed {
                input: RasterInput::QrCode,
                ..
            } => "Could not add watermark to QR code.",
            Self::InvalidDimensions { .. } => "Could not resize the watermark image.",
            Self::WatermarkTooLarge { .. } => "Could not upload the watermark image.",
            Self::EncodeFailed(_) => "Could not encode the QR code image.",
            Self::Io(_) => "Could not access the file system.",
        }
    }

    /// JSON body of the form `{"<context>": "<message>"}`.
    #[must_use]
    pub fn response_body(&self) -> Value {
        let mut body = Map::new();
        body.insert(self.context().to_owned(), Value::String(self.to_string()));
        Value::Object(body)
    }
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_error() -> image::ImageError {
        image::load_from_memory_with_format(b"not a png", image::ImageFormat::Png).unwrap_err()
    }

    #[test]
    fn error_display_messages() {
        let io_err = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(io_err.to_string().contains("gone"));

        let size = Error::InvalidSize("abc".to_string());
        assert!(size.to_string().contains("`abc`"));

        let dims = Error::InvalidDimensions {
            width: 0,
            height: 1,
            max: 8192,
        };
        assert!(dims.to_string().contains("0x1"));

        let big = Error::WatermarkTooLarge {
            len: 1_048_577,
            max: 1_048_576,
        };
        assert!(big.to_string().contains("1048577 bytes"));

        let decode = Error::DecodeFailed {
            input: RasterInput::Watermark,
            source: decode_error(),
        };
        assert!(decode.to_string().starts_with("could not decode watermark"));
    }

    #[test]
    fn kinds_match_variants() {
        assert_eq!(Error::EmptyContent.kind(), ErrorKind::EmptyContent);
        assert_eq!(
            Error::InvalidSize(String::new()).kind(),
            ErrorKind::InvalidSize
        );
        assert_eq!(
            Error::EncodeFailed(decode_error()).kind(),
            ErrorKind::EncodeFailed
        );
        assert_eq!(
            Error::DecodeFailed {
                input: RasterInput::QrCode,
                source: decode_error(),
            }
            .kind(),
            ErrorKind::DecodeFailed
        );
    }

    #[test]
    fn oversized_watermark_has_upload_context() {
        let err = Error::WatermarkTooLarge { len: 2, max: 1 };
        assert_eq!(err.kind(), ErrorKind::WatermarkTooLarge);
        let body = err.response_body();
        assert!(body
            .as_object()
            .unwrap()
            .contains_key("Could not upload the watermark image."));
    }

    #[test]
    fn response_body_is_single_context_key() {
        let err = Error::InvalidSize("-3".to_string());
        let body = err.response_body();
        let obj = body.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(
            obj["Could not determine the desired QR code size."],
            Value::String(err.to_string())
        );
    }
}
