//! Preview imaging: PDF rasterization and thumbnail encoding.
//!
//! | Step | Crate / tool |
//! |---|---|
//! | **Rasterize** | `pdftoppm` (poppler), PNG output read with `image::open` |
//! | **Resize** | `image::DynamicImage::resize_exact` with `Lanczos3` |
//! | **Flatten** | alpha composited onto white, pure Rust |
//! | **Encode** | `image::codecs::jpeg::JpegEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing raster and preview jobs
//! - **Backend**: [`PdfRasterizer`] trait + [`PopplerRasterizer`]
//! - **Operations**: Preview pipeline combining a rasterizer with the pixel work

pub mod backend;
pub mod calculations;
pub mod operations;
mod params;
pub mod poppler;

pub use backend::{PdfRasterizer, RasterError};
pub use calculations::{preview_dimensions, raster_dimensions};
pub use operations::{encode_jpeg, flatten_on_white, render_preview};
pub use params::{PreviewParams, Quality, RasterParams};
pub use poppler::PopplerRasterizer;
