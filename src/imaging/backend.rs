//! Rasterizer backend trait and shared error type.
//!
//! The [`PdfRasterizer`] trait turns page 1 of a PDF into pixels. The
//! production implementation is
//! [`PopplerRasterizer`](super::poppler::PopplerRasterizer), which shells out
//! to `pdftoppm`. Tests use a mock that records calls and returns a blank
//! page of a fixed size.

use super::params::RasterParams;
use image::DynamicImage;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RasterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Rasterizer `{}` not found; install poppler-utils or set [rasterizer] pdftoppm", program.display())]
    ToolMissing { program: PathBuf },
    #[error("{program} failed ({status}): {stderr}")]
    ToolFailed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// Trait for PDF rasterization backends.
pub trait PdfRasterizer: Sync {
    /// Render the first page of `params.source` at `params.dpi`.
    fn rasterize(&self, params: &RasterParams) -> Result<DynamicImage, RasterError>;
}
