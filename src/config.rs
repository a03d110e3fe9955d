//! Flyer configuration module.
//!
//! Handles loading and validating `flyer.toml`. Every key is optional: a
//! missing file, or a file that sets only a few keys, falls back to the stock
//! defaults for the rest.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! template_dir = "flyer-templates"  # Background PDFs, one page each
//! preview_dir = "previews"          # Cached preview JPEGs
//!
//! [page]
//! side_margin = 36.0     # Left/right margin in points (0.5in)
//! bottom_margin = 36.0   # Space below the content in points
//!
//! [preview]
//! width = 300            # Thumbnail width in pixels
//! dpi = 100              # Rasterization resolution
//! quality = 90           # JPEG quality (1-100)
//! placeholder_events = 40
//!
//! [rasterizer]
//! pdftoppm = "pdftoppm"  # Path or name of poppler's pdftoppm
//!
//! [two_up]
//! rsvp_line = "Please RSVP at map.berniesanders.com"
//!
//! [fonts]
//! # regular = "fonts/NotoSans-Regular.ttf"  # TrueType faces to embed; unset
//! # bold = "fonts/NotoSans-Bold.ttf"        # faces use the built-in
//! # italic = "fonts/NotoSans-Italic.ttf"    # Helvetica (WinAnsi only)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{PreviewParams, Quality};
use crate::layout::{
    DEFAULT_MARGIN, DEFAULT_RSVP_LINE, Font, FontBook, FontError, RenderOptions, StyleSheet,
    TrueTypeFont,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "flyer.toml";

/// Flyer configuration loaded from `flyer.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlyerConfig {
    /// Directory of background template PDFs.
    pub template_dir: PathBuf,
    /// Directory of cached preview JPEGs.
    pub preview_dir: PathBuf,
    pub page: PageConfig,
    pub preview: PreviewConfig,
    pub rasterizer: RasterizerConfig,
    pub two_up: TwoUpConfig,
    pub fonts: FontsConfig,
}

impl Default for FlyerConfig {
    fn default() -> Self {
        Self {
            template_dir: PathBuf::from("flyer-templates"),
            preview_dir: PathBuf::from("previews"),
            page: PageConfig::default(),
            preview: PreviewConfig::default(),
            rasterizer: RasterizerConfig::default(),
            two_up: TwoUpConfig::default(),
            fonts: FontsConfig::default(),
        }
    }
}

impl FlyerConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("page.side_margin", self.page.side_margin),
            ("page.bottom_margin", self.page.bottom_margin),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "{key} must be a non-negative number of points"
                )));
            }
        }
        if self.preview.width == 0 {
            return Err(ConfigError::Validation(
                "preview.width must be at least 1".into(),
            ));
        }
        if !(1..=1200).contains(&self.preview.dpi) {
            return Err(ConfigError::Validation(
                "preview.dpi must be 1-1200".into(),
            ));
        }
        if !(1..=100).contains(&self.preview.quality) {
            return Err(ConfigError::Validation(
                "preview.quality must be 1-100".into(),
            ));
        }
        if self.preview.placeholder_events == 0 {
            return Err(ConfigError::Validation(
                "preview.placeholder_events must be at least 1".into(),
            ));
        }
        if self.rasterizer.pdftoppm.trim().is_empty() {
            return Err(ConfigError::Validation(
                "rasterizer.pdftoppm must not be empty".into(),
            ));
        }
        for (key, path) in self.fonts.faces() {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "fonts.{key} must not be empty"
                )));
            }
        }
        Ok(())
    }

    /// Rendering inputs for the layouts, loading any configured fonts.
    pub fn render_options(&self) -> Result<RenderOptions, FontError> {
        Ok(RenderOptions {
            styles: StyleSheet::standard(),
            fonts: self.fonts.load()?,
            rsvp_line: self.two_up.rsvp_line.clone(),
        })
    }

    pub fn preview_params(&self) -> PreviewParams {
        PreviewParams {
            width: self.preview.width,
            quality: Quality::new(self.preview.quality),
        }
    }
}

/// Page spacing around the generated content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageConfig {
    /// Left and right margin in points.
    pub side_margin: f32,
    /// Space below the content in points. The space above is always a third
    /// of the page height.
    pub bottom_margin: f32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            side_margin: DEFAULT_MARGIN,
            bottom_margin: DEFAULT_MARGIN,
        }
    }
}

/// Preview thumbnail settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewConfig {
    /// Thumbnail width in pixels.
    pub width: u32,
    /// Rasterization resolution.
    pub dpi: u32,
    /// JPEG quality (1 = worst, 100 = best).
    pub quality: u32,
    /// Number of placeholder events poured into a preview flyer.
    pub placeholder_events: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            width: 300,
            dpi: 100,
            quality: 90,
            placeholder_events: 40,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RasterizerConfig {
    /// Name or path of the `pdftoppm` executable.
    pub pdftoppm: String,
}

impl Default for RasterizerConfig {
    fn default() -> Self {
        Self {
            pdftoppm: crate::imaging::poppler::DEFAULT_PROGRAM.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TwoUpConfig {
    /// Instruction line printed under each half of a two-up sheet.
    pub rsvp_line: String,
}

impl Default for TwoUpConfig {
    fn default() -> Self {
        Self {
            rsvp_line: DEFAULT_RSVP_LINE.to_string(),
        }
    }
}

/// TrueType fonts to embed in place of the built-in Helvetica faces.
///
/// Helvetica only covers WinAnsi (Western European) text; event names or
/// descriptions in other scripts need a font file here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regular: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<PathBuf>,
}

impl FontsConfig {
    /// Configured faces with their key names.
    fn faces(&self) -> impl Iterator<Item = (&'static str, &PathBuf)> {
        [
            ("regular", &self.regular),
            ("bold", &self.bold),
            ("italic", &self.italic),
        ]
        .into_iter()
        .filter_map(|(key, path)| path.as_ref().map(|p| (key, p)))
    }

    /// Read every configured font file into a [`FontBook`].
    pub fn load(&self) -> Result<FontBook, FontError> {
        let mut book = FontBook::default();
        for (font, path) in [
            (Font::Regular, &self.regular),
            (Font::Bold, &self.bold),
            (Font::Italic, &self.italic),
        ] {
            if let Some(path) = path {
                book = book.with_embedded(font, TrueTypeFont::from_file(path)?);
            }
        }
        Ok(book)
    }
}

/// Parse and validate config from TOML text.
pub fn parse_config(content: &str) -> Result<FlyerConfig, ConfigError> {
    let config: FlyerConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`.
///
/// A missing file yields the stock defaults. A file that exists must parse,
/// contain no unknown keys, and pass validation.
pub fn load_config(path: &Path) -> Result<FlyerConfig, ConfigError> {
    if !path.exists() {
        log::debug!("no config at {}, using defaults", path.display());
        return Ok(FlyerConfig::default());
    }
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Returns a fully-commented stock `flyer.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Flyer Factory Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# Directory of background template PDFs. A template named "rally" is read
# from <template_dir>/rally.pdf; only its first page is used.
template_dir = "flyer-templates"

# Directory where preview thumbnails are cached as <template>_<layout>.jpg.
# Previews are written once and never regenerated; delete a file to refresh it.
preview_dir = "previews"

# ---------------------------------------------------------------------------
# Page spacing (points; 72 points = 1 inch)
# ---------------------------------------------------------------------------
[page]
# Left and right margin.
side_margin = 36.0
# Space below the content. The top third of the page is always left to the
# template artwork.
bottom_margin = 36.0

# ---------------------------------------------------------------------------
# Preview thumbnails
# ---------------------------------------------------------------------------
[preview]
# Thumbnail width in pixels. Height follows the template's aspect ratio.
width = 300
# Resolution the flyer is rasterized at before resizing.
dpi = 100
# JPEG quality (1 = worst, 100 = best).
quality = 90
# Number of placeholder events poured into the preview flyer.
placeholder_events = 40

# ---------------------------------------------------------------------------
# Rasterizer
# ---------------------------------------------------------------------------
[rasterizer]
# Name or path of poppler's pdftoppm executable.
pdftoppm = "pdftoppm"

# ---------------------------------------------------------------------------
# Two-up layout
# ---------------------------------------------------------------------------
[two_up]
# Instruction line printed under each half of the sheet.
rsvp_line = "Please RSVP at map.berniesanders.com"

# ---------------------------------------------------------------------------
# Fonts
# ---------------------------------------------------------------------------
[fonts]
# TrueType files embedded in place of the built-in Helvetica faces. The
# built-in faces only cover Western European (WinAnsi) text; a flyer with
# characters outside it fails to build until a font that has them is set.
# regular = "fonts/NotoSans-Regular.ttf"
# bold = "fonts/NotoSans-Bold.ttf"
# italic = "fonts/NotoSans-Italic.ttf"
"##
}
