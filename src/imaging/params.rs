//! Parameter types for imaging operations.
//!
//! These structs describe *what* to produce. The [`backend`](super::backend)
//! decides how a page becomes pixels, and [`operations`](super::operations)
//! turns those pixels into a preview, so either side can be swapped (e.g.
//! for testing with a mock rasterizer) without touching the other.

use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Rasterize page 1 of `source` at `dpi`.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterParams {
    pub source: PathBuf,
    pub dpi: u32,
}

/// Output shape of a preview thumbnail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewParams {
    /// Target width in pixels; height follows the page's aspect ratio.
    pub width: u32,
    pub quality: Quality,
}
