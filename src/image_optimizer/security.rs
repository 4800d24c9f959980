//! Resource limits for untrusted images
//!
//! Provides:
//! - Image bomb protection (source dimension validation before decode)
//! - Target canvas bounds

use super::config::ImageConfig;
use super::error::ImageError;
use super::params::ResizeTarget;
use crate::error::ProxyError;

/// Limits applied to every request
#[derive(Debug, Clone, Copy)]
pub struct ImageLimits {
    /// Maximum allowed total source pixels (width * height)
    pub max_source_pixels: u64,
    /// Maximum allowed target width
    pub max_target_width: u32,
    /// Maximum allowed target height
    pub max_target_height: u32,
}

impl Default for ImageLimits {
    fn default() -> Self {
        Self::from_config(&ImageConfig::default())
    }
}

impl ImageLimits {
    pub fn from_config(config: &ImageConfig) -> Self {
        Self {
            max_source_pixels: config.max_source_pixels,
            max_target_width: config.max_width,
            max_target_height: config.max_height,
        }
    }
}

/// Validate source dimensions against the pixel limit
///
/// This should be called BEFORE fully decoding the image to protect
/// against "image bomb" attacks where a small file decompresses to
/// huge dimensions.
pub fn validate_dimensions(width: u32, height: u32, limits: &ImageLimits) -> Result<(), ImageError> {
    let pixels = width as u64 * height as u64;
    if pixels > limits.max_source_pixels {
        return Err(ImageError::image_too_large(
            width,
            height,
            limits.max_source_pixels,
        ));
    }
    Ok(())
}

/// Validate a requested canvas against the target bounds
pub fn validate_target(target: &ResizeTarget, limits: &ImageLimits) -> Result<(), ProxyError> {
    let (width, height) = (target.width.get(), target.height.get());
    if width > limits.max_target_width || height > limits.max_target_height {
        return Err(ProxyError::invalid_request(format!(
            "requested size {}x{} exceeds maximum {}x{}",
            width, height, limits.max_target_width, limits.max_target_height
        )));
    }
    Ok(())
}
