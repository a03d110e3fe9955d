//! Preview operations.
//!
//! [`render_preview`] combines a rasterizer with the pure pixel steps:
//! proportional resize, flattening onto white, and JPEG encoding.

use super::backend::{PdfRasterizer, RasterError};
use super::calculations::preview_dimensions;
use super::params::{PreviewParams, Quality, RasterParams};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageEncoder, Rgb, RgbImage};

/// Result type for imaging operations.
pub type Result<T> = std::result::Result<T, RasterError>;

/// Rasterize page 1 of a PDF and encode it as a preview JPEG.
pub fn render_preview(
    rasterizer: &(impl PdfRasterizer + ?Sized),
    raster: &RasterParams,
    preview: &PreviewParams,
) -> Result<Vec<u8>> {
    let page = rasterizer.rasterize(raster)?;
    let (width, height) = preview_dimensions((page.width(), page.height()), preview.width);
    log::debug!(
        "resizing {}x{} page to {width}x{height}",
        page.width(),
        page.height()
    );
    let resized = page.resize_exact(width, height, FilterType::Lanczos3);
    encode_jpeg(&flatten_on_white(&resized), preview.quality)
}

/// Composite the image over an opaque white background.
pub fn flatten_on_white(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (src, dst) in rgba.pixels().zip(out.pixels_mut()) {
        let [r, g, b, a] = src.0;
        let a = a as u32;
        let blend = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
        *dst = Rgb([blend(r), blend(g), blend(b)]);
    }
    out
}

pub fn encode_jpeg(img: &RgbImage, quality: Quality) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality.value()).write_image(
        img.as_raw(),
        img.width(),
        img.height(),
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(bytes)
}
