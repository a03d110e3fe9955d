//! `pdftoppm` rasterizer.
//!
//! Invoked as `pdftoppm -r <dpi> -f 1 -l 1 -singlefile -png <in.pdf> <prefix>`
//! into a scratch directory; the resulting `<prefix>.png` is decoded with the
//! `image` crate and the directory is removed on drop.

use super::backend::{PdfRasterizer, RasterError};
use super::params::RasterParams;
use image::DynamicImage;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Command;

pub const DEFAULT_PROGRAM: &str = "pdftoppm";

/// Rasterizer backed by poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PopplerRasterizer {
    program: PathBuf,
}

impl PopplerRasterizer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for PopplerRasterizer {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl PdfRasterizer for PopplerRasterizer {
    fn rasterize(&self, params: &RasterParams) -> Result<DynamicImage, RasterError> {
        let scratch = tempfile::TempDir::new()?;
        let prefix = scratch.path().join("page");

        log::debug!(
            "rasterizing {} at {} dpi",
            params.source.display(),
            params.dpi
        );
        let output = Command::new(&self.program)
            .arg("-r")
            .arg(params.dpi.to_string())
            .args(["-f", "1", "-l", "1", "-singlefile", "-png"])
            .arg(&params.source)
            .arg(&prefix)
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => RasterError::ToolMissing {
                    program: self.program.clone(),
                },
                _ => RasterError::Io(e),
            })?;

        if !output.status.success() {
            return Err(RasterError::ToolFailed {
                program: self.program.display().to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(image::open(prefix.with_extension("png"))?)
    }
}
