use serde::{Deserialize, Serialize};

use super::params::{parse_hex_color, OutputPolicy};
use crate::constants::{
    DEFAULT_BACKGROUND, DEFAULT_JPEG_QUALITY, DEFAULT_MAX_HEIGHT, DEFAULT_MAX_SOURCE_BYTES,
    DEFAULT_MAX_SOURCE_PIXELS, DEFAULT_MAX_WIDTH,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Output format selection (mirror the source, or always JPEG)
    #[serde(default)]
    pub output: OutputPolicy,

    /// Quality used for every JPEG output
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Canvas fill behind letterboxed images, as hex RGB
    #[serde(default = "default_background")]
    pub background: String,

    /// Maximum allowed target width (to prevent abuse)
    #[serde(default = "default_max_width")]
    pub max_width: u32,

    /// Maximum allowed target height
    #[serde(default = "default_max_height")]
    pub max_height: u32,

    /// Maximum size of a fetched source body in bytes
    #[serde(default = "default_max_source_bytes")]
    pub max_source_bytes: usize,

    /// Maximum decoded source pixels (image bomb protection)
    #[serde(default = "default_max_source_pixels")]
    pub max_source_pixels: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            output: OutputPolicy::default(),
            jpeg_quality: default_jpeg_quality(),
            background: default_background(),
            max_width: default_max_width(),
            max_height: default_max_height(),
            max_source_bytes: default_max_source_bytes(),
            max_source_pixels: default_max_source_pixels(),
        }
    }
}

impl ImageConfig {
    /// Background as RGB channels
    pub fn background_rgb(&self) -> Result<[u8; 3], String> {
        parse_hex_color(&self.background).ok_or_else(|| {
            format!(
                "image.background '{}' is not a 6-digit hex color",
                self.background
            )
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(format!(
                "image.jpeg_quality must be 1-100, got {}",
                self.jpeg_quality
            ));
        }
        self.background_rgb()?;
        if self.max_width == 0 || self.max_height == 0 {
            return Err("image.max_width and image.max_height must be positive".to_string());
        }
        if self.max_source_bytes == 0 {
            return Err("image.max_source_bytes must be positive".to_string());
        }
        if self.max_source_pixels == 0 {
            return Err("image.max_source_pixels must be positive".to_string());
        }
        Ok(())
    }
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

fn default_background() -> String {
    DEFAULT_BACKGROUND.to_string()
}

fn default_max_width() -> u32 {
    DEFAULT_MAX_WIDTH
}

fn default_max_height() -> u32 {
    DEFAULT_MAX_HEIGHT
}

fn default_max_source_bytes() -> usize {
    DEFAULT_MAX_SOURCE_BYTES
}

fn default_max_source_pixels() -> u64 {
    DEFAULT_MAX_SOURCE_PIXELS
}
