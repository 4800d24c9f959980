//! Image processing implementation
//!
//! Handles the actual image transformation: decode → [fit onto canvas] → encode

use fast_image_resize::{FilterType, Image, MulDiv, PixelType, ResizeAlg, Resizer};
use image::io::Reader as ImageReader;
use image::{imageops, DynamicImage, GenericImageView, Rgba, RgbaImage};
use std::io::Cursor;
use std::num::NonZeroU32;

use super::config::ImageConfig;
use super::encoder::{EncodeSettings, EncoderFactory};
use super::error::ImageError;
use super::params::{OutputFormat, OutputPolicy, ResizeTarget, SourceFormat};
use super::security::{validate_dimensions, ImageLimits};

/// Result of image processing
#[derive(Debug)]
pub struct ProcessedImage {
    /// The encoded image data
    pub data: Vec<u8>,
    /// Content-Type header value
    pub content_type: &'static str,
    /// Format the data is encoded in
    pub format: OutputFormat,
    /// Format sniffed from the source bytes
    pub source_format: SourceFormat,
    /// Original dimensions (width, height)
    pub original_size: (u32, u32),
    /// Output dimensions (width, height)
    pub output_size: (u32, u32),
}

/// A decoded raster and the format it was sniffed as
pub struct DecodedImage {
    pub image: DynamicImage,
    pub format: SourceFormat,
}

/// Decode/resize/encode settings shared by every request
#[derive(Debug, Clone)]
pub struct ImageProcessor {
    policy: OutputPolicy,
    encode: EncodeSettings,
    limits: ImageLimits,
}

impl ImageProcessor {
    pub fn from_config(config: &ImageConfig) -> Result<Self, String> {
        Ok(Self {
            policy: config.output,
            encode: EncodeSettings {
                jpeg_quality: config.jpeg_quality,
                background: config.background_rgb()?,
            },
            limits: ImageLimits::from_config(config),
        })
    }

    pub fn limits(&self) -> &ImageLimits {
        &self.limits
    }

    /// Transform fetched bytes into the output image
    ///
    /// # Errors
    ///
    /// - `DecodeFailed` if the bytes are not a decodable image
    /// - `ImageTooLarge` if the source exceeds the pixel limit
    /// - `UnsupportedFormat` if the policy mirrors a format with no encoder
    /// - `ResizeFailed` / `EncodeFailed` for processing failures
    pub fn process(
        &self,
        data: &[u8],
        target: Option<ResizeTarget>,
    ) -> Result<ProcessedImage, ImageError> {
        let decoded = decode_image(data, &self.limits)?;
        let original_size = decoded.image.dimensions();

        let output_format = self
            .policy
            .output_for(&decoded.format)
            .ok_or_else(|| ImageError::unsupported_format(decoded.format.as_str()))?;

        let canvas = match target {
            Some(target) => fit_to_canvas(&decoded.image, target, self.encode.background)?,
            None => decoded.image.to_rgba8(),
        };

        let data = EncoderFactory::create(output_format, self.encode).encode(&canvas)?;

        Ok(ProcessedImage {
            data,
            content_type: output_format.content_type(),
            format: output_format,
            source_format: decoded.format,
            original_size,
            output_size: canvas.dimensions(),
        })
    }
}

/// Decode image data, sniffing the format from its content
///
/// The header is read first so oversized sources are rejected before the
/// pixel buffer is allocated.
pub fn decode_image(data: &[u8], limits: &ImageLimits) -> Result<DecodedImage, ImageError> {
    let format = image::guess_format(data).map_err(|e| ImageError::decode_failed(e.to_string()))?;

    let (width, height) = ImageReader::with_format(Cursor::new(data), format)
        .into_dimensions()
        .map_err(|e| ImageError::decode_failed(e.to_string()))?;
    validate_dimensions(width, height, limits)?;

    let image = ImageReader::with_format(Cursor::new(data), format)
        .decode()
        .map_err(|e| ImageError::decode_failed(e.to_string()))?;

    Ok(DecodedImage {
        image,
        format: SourceFormat::from_image_format(format),
    })
}

/// Largest size that fits within the bounds while keeping the aspect ratio
///
/// Each side is at least one pixel and never exceeds its bound.
pub fn fit_dimensions(src_w: u32, src_h: u32, bound_w: u32, bound_h: u32) -> (u32, u32) {
    let scale = f64::min(
        bound_w as f64 / src_w as f64,
        bound_h as f64 / src_h as f64,
    );
    let width = ((src_w as f64 * scale).round() as u32).clamp(1, bound_w);
    let height = ((src_h as f64 * scale).round() as u32).clamp(1, bound_h);
    (width, height)
}

/// Fit the image inside the target and center it on a background canvas
///
/// The returned canvas is always exactly `target` in size.
pub fn fit_to_canvas(
    img: &DynamicImage,
    target: ResizeTarget,
    background: [u8; 3],
) -> Result<RgbaImage, ImageError> {
    let (canvas_w, canvas_h) = (target.width.get(), target.height.get());
    let (src_w, src_h) = img.dimensions();
    let (fit_w, fit_h) = fit_dimensions(src_w, src_h, canvas_w, canvas_h);

    let fitted = if (fit_w, fit_h) == (src_w, src_h) {
        img.to_rgba8()
    } else {
        resize_image(img, fit_w, fit_h)?
    };

    let [r, g, b] = background;
    let mut canvas = RgbaImage::from_pixel(canvas_w, canvas_h, Rgba([r, g, b, 255]));
    let x = (canvas_w - fit_w) / 2;
    let y = (canvas_h - fit_h) / 2;
    imageops::overlay(&mut canvas, &fitted, x as i64, y as i64);

    tracing::debug!(
        source = %format!("{}x{}", src_w, src_h),
        fitted = %format!("{}x{}", fit_w, fit_h),
        canvas = %format!("{}x{}", canvas_w, canvas_h),
        "Image fitted onto canvas"
    );

    Ok(canvas)
}

/// Resize image using fast-image-resize with Lanczos3 filter
fn resize_image(img: &DynamicImage, target_w: u32, target_h: u32) -> Result<RgbaImage, ImageError> {
    let src_w = img.width();
    let src_h = img.height();

    let src_width =
        NonZeroU32::new(src_w).ok_or_else(|| ImageError::resize_failed("Source width is 0"))?;
    let src_height =
        NonZeroU32::new(src_h).ok_or_else(|| ImageError::resize_failed("Source height is 0"))?;
    let dst_width =
        NonZeroU32::new(target_w).ok_or_else(|| ImageError::resize_failed("Target width is 0"))?;
    let dst_height =
        NonZeroU32::new(target_h).ok_or_else(|| ImageError::resize_failed("Target height is 0"))?;

    let mut src_image = Image::from_vec_u8(
        src_width,
        src_height,
        img.to_rgba8().into_raw(),
        PixelType::U8x4,
    )
    .map_err(|e| ImageError::resize_failed(format!("Failed to create source image: {:?}", e)))?;

    // Premultiply so transparent pixels don't bleed color into their neighbours
    let has_alpha = img.color().has_alpha();
    let mul_div = MulDiv::default();
    if has_alpha {
        mul_div
            .multiply_alpha_inplace(&mut src_image.view_mut())
            .map_err(|e| ImageError::resize_failed(format!("Alpha multiply failed: {:?}", e)))?;
    }

    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);

    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));

    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| ImageError::resize_failed(format!("Resize operation failed: {:?}", e)))?;

    if has_alpha {
        mul_div
            .divide_alpha_inplace(&mut dst_image.view_mut())
            .map_err(|e| ImageError::resize_failed(format!("Alpha divide failed: {:?}", e)))?;
    }

    RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or_else(|| ImageError::resize_failed("Failed to create output image buffer"))
}
