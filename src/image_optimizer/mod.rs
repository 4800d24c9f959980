//! Image transformation module
//!
//! Provides the CPU-bound half of the proxy pipeline:
//! - Query parameter validation (source URL, width, height)
//! - Format sniffing decode (JPEG, PNG, GIF; WebP decodes but has no encoder)
//! - Fit-within-bounds resize centered on a fixed-size canvas
//! - Re-encoding by output policy (mirror the source, or always JPEG)
//!
//! # URL Format
//!
//! ```text
//! /?url=https://example.com/image.png&w=800&h=600
//! ```
//!
//! Parameter names are configurable; the defaults are `url`, `w` and `h`.

// Core modules
pub mod config;
pub mod encoder;
pub mod error;
pub mod params;
pub mod processor;
pub mod security;

// Re-export commonly used types
pub use config::ImageConfig;
pub use encoder::{EncodeSettings, EncoderFactory, ImageEncoder};
pub use error::ImageError;
pub use params::{OutputFormat, OutputPolicy, RequestParams, ResizeTarget, SourceFormat};
pub use processor::{decode_image, fit_to_canvas, DecodedImage, ImageProcessor, ProcessedImage};
pub use security::{validate_dimensions, validate_target, ImageLimits};
