//! Output encoders
//!
//! Every encoder consumes the RGBA canvas produced by the processor.
//! [`EncoderFactory::create`] matches the closed [`OutputFormat`] enum, so
//! adding a format forces a decision here.

use image::codecs::gif::GifEncoder as GifWriter;
use image::codecs::jpeg::JpegEncoder as JpegWriter;
use image::codecs::png::PngEncoder as PngWriter;
use image::{ColorType, ImageEncoder as _, RgbImage, RgbaImage};

use super::error::ImageError;
use super::params::OutputFormat;

/// Settings shared by the encoders of one processor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSettings {
    /// JPEG quality, 1-100
    pub jpeg_quality: u8,
    /// Color translucent pixels are flattened onto for JPEG output
    pub background: [u8; 3],
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            jpeg_quality: crate::constants::DEFAULT_JPEG_QUALITY,
            background: [255, 255, 255],
        }
    }
}

/// Serializes an RGBA canvas into one container format
pub trait ImageEncoder: Send + Sync {
    fn format(&self) -> OutputFormat;

    fn encode(&self, canvas: &RgbaImage) -> Result<Vec<u8>, ImageError>;
}

/// Baseline JPEG; alpha is composited over the background first
pub struct JpegEncoder {
    pub quality: u8,
    pub background: [u8; 3],
}

impl ImageEncoder for JpegEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Jpeg
    }

    fn encode(&self, canvas: &RgbaImage) -> Result<Vec<u8>, ImageError> {
        let flat = flatten_alpha(canvas, self.background);
        let mut out = Vec::new();
        JpegWriter::new_with_quality(&mut out, self.quality.clamp(1, 100))
            .write_image(flat.as_raw(), flat.width(), flat.height(), ColorType::Rgb8)
            .map_err(|e| ImageError::encode_failed(self.format().as_str(), e.to_string()))?;
        Ok(out)
    }
}

pub struct PngEncoder;

impl ImageEncoder for PngEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Png
    }

    fn encode(&self, canvas: &RgbaImage) -> Result<Vec<u8>, ImageError> {
        let mut out = Vec::new();
        PngWriter::new(&mut out)
            .write_image(canvas.as_raw(), canvas.width(), canvas.height(), ColorType::Rgba8)
            .map_err(|e| ImageError::encode_failed(self.format().as_str(), e.to_string()))?;
        Ok(out)
    }
}

/// Single-frame GIF with a NeuQuant palette
pub struct GifEncoder {
    /// Palette sampling speed, 1 (best) to 30 (fastest)
    pub speed: i32,
}

impl Default for GifEncoder {
    fn default() -> Self {
        Self { speed: 10 }
    }
}

impl ImageEncoder for GifEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Gif
    }

    fn encode(&self, canvas: &RgbaImage) -> Result<Vec<u8>, ImageError> {
        let mut out = Vec::new();
        // The writer emits the GIF trailer on drop, so it must go out of scope first
        {
            let mut writer = GifWriter::new_with_speed(&mut out, self.speed);
            writer
                .encode(canvas.as_raw(), canvas.width(), canvas.height(), ColorType::Rgba8)
                .map_err(|e| ImageError::encode_failed(self.format().as_str(), e.to_string()))?;
        }
        Ok(out)
    }
}

pub struct EncoderFactory;

impl EncoderFactory {
    pub fn create(format: OutputFormat, settings: EncodeSettings) -> Box<dyn ImageEncoder> {
        match format {
            OutputFormat::Jpeg => Box::new(JpegEncoder {
                quality: settings.jpeg_quality,
                background: settings.background,
            }),
            OutputFormat::Png => Box::new(PngEncoder),
            OutputFormat::Gif => Box::new(GifEncoder::default()),
        }
    }
}

/// Composite every pixel over `background`, dropping the alpha channel
fn flatten_alpha(canvas: &RgbaImage, background: [u8; 3]) -> RgbImage {
    RgbImage::from_fn(canvas.width(), canvas.height(), |x, y| {
        let [r, g, b, a] = canvas.get_pixel(x, y).0;
        let a = a as u32;
        let blend = |fg: u8, bg: u8| ((fg as u32 * a + bg as u32 * (255 - a) + 127) / 255) as u8;
        image::Rgb([
            blend(r, background[0]),
            blend(g, background[1]),
            blend(b, background[2]),
        ])
    })
}
