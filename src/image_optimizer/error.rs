//! Failures of the decode, resize and encode stages

use thiserror::Error;

/// Errors raised while transforming a fetched image
#[derive(Debug, Clone, Error)]
pub enum ImageError {
    /// Bytes are not an image in any compiled-in format
    #[error("decode failed: {message}")]
    DecodeFailed { message: String },

    /// Decoded, but the output policy has no encoder for the detected format
    #[error("unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// Header dimensions exceed the source pixel limit; nothing was decoded
    #[error("source is {width}x{height} ({pixels} pixels), limit is {max_pixels} pixels")]
    ImageTooLarge {
        width: u32,
        height: u32,
        pixels: u64,
        max_pixels: u64,
    },

    #[error("resize failed: {message}")]
    ResizeFailed { message: String },

    #[error("{format} encode failed: {message}")]
    EncodeFailed { format: String, message: String },
}

impl ImageError {
    /// Status written to the caller
    ///
    /// Only `ImageTooLarge` is the caller's fault; everything else is 500.
    pub fn to_http_status(&self) -> u16 {
        match self {
            ImageError::ImageTooLarge { .. } => 400,
            ImageError::DecodeFailed { .. }
            | ImageError::UnsupportedFormat { .. }
            | ImageError::ResizeFailed { .. }
            | ImageError::EncodeFailed { .. } => 500,
        }
    }

    pub fn unsupported_format(format: impl Into<String>) -> Self {
        ImageError::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub fn decode_failed(message: impl Into<String>) -> Self {
        ImageError::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn resize_failed(message: impl Into<String>) -> Self {
        ImageError::ResizeFailed {
            message: message.into(),
        }
    }

    pub fn encode_failed(format: impl Into<String>, message: impl Into<String>) -> Self {
        ImageError::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn image_too_large(width: u32, height: u32, max_pixels: u64) -> Self {
        ImageError::ImageTooLarge {
            width,
            height,
            pixels: u64::from(width) * u64::from(height),
            max_pixels,
        }
    }
}
