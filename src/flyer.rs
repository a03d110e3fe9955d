//! Flyer builder: template + layout + events → one merged PDF page.
//!
//! ```text
//! flyer-templates/rally.pdf ──► page size (W, H)
//!                                   │
//! events ──► layout.fill(W, H, top = H/3) ──► content.pdf (scratch)
//!                                   │
//!                 overlay content onto template page 1
//!                                   │
//!                  temp file next to destination ──► rename
//! ```
//!
//! Nothing is written to the destination unless every step succeeds. The
//! scratch content PDF and the pre-rename output are `tempfile` handles, so
//! they are removed on every exit path.

use crate::compose::{self, ComposeError, PageSize};
use crate::config::FlyerConfig;
use crate::event::EventRecord;
use crate::imaging::{PdfRasterizer, PopplerRasterizer, RasterError};
use crate::layout::{self, FontError, Layout, LayoutError, PageSpec};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlyerError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),
    #[error("Layout not found: {0}")]
    LayoutNotFound(String),
    #[error("Content page is {content} but template page is {template}")]
    GeometryMismatch { template: PageSize, content: PageSize },
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),
    #[error("Compose error: {0}")]
    Compose(#[from] ComposeError),
    #[error("Font error: {0}")]
    Font(#[from] FontError),
    #[error("Raster error: {0}")]
    Raster(#[from] RasterError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to move output into place: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Page sizes closer than this are treated as equal.
const GEOMETRY_TOLERANCE: f32 = 0.01;

/// Builds flyers and previews from a config and a rasterizer.
pub struct FlyerBuilder<R = PopplerRasterizer> {
    pub(crate) config: FlyerConfig,
    pub(crate) rasterizer: R,
}

impl FlyerBuilder<PopplerRasterizer> {
    /// Builder using the `pdftoppm` named in the config.
    pub fn new(config: FlyerConfig) -> Self {
        let rasterizer = PopplerRasterizer::new(&config.rasterizer.pdftoppm);
        Self { config, rasterizer }
    }
}

impl<R: PdfRasterizer> FlyerBuilder<R> {
    pub fn with_rasterizer(config: FlyerConfig, rasterizer: R) -> Self {
        Self { config, rasterizer }
    }

    pub fn config(&self) -> &FlyerConfig {
        &self.config
    }

    /// Build a flyer for `events` and write it to `destination`.
    pub fn build_flyer(
        &self,
        template_name: &str,
        layout_name: &str,
        events: &[EventRecord],
        destination: &Path,
    ) -> Result<(), FlyerError> {
        let template_path = self.template_path(template_name)?;
        let layout = resolve_layout(layout_name)?;

        let mut template = compose::load(&template_path)?;
        compose::keep_first_page(&mut template);
        let template_page = compose::first_page(&template)?;
        let size = compose::page_size(&template, template_page)?;
        log::debug!("template {template_name} is {size}");

        let spec = PageSpec::new(
            size,
            size.height / 3.0,
            self.config.page.bottom_margin,
            self.config.page.side_margin,
        );
        let scratch = tempfile::Builder::new()
            .prefix("flyer-content-")
            .suffix(".pdf")
            .tempfile()?;
        let options = self.config.render_options()?;
        layout.fill(scratch.path(), &spec, events, &options)?;

        let content = compose::load(scratch.path())?;
        let content_page = compose::first_page(&content)?;
        check_geometry(size, compose::page_size(&content, content_page)?)?;
        compose::overlay_page(&mut template, template_page, &content, content_page)?;

        write_atomically(&mut template, destination)?;
        log::info!(
            "wrote {} ({} on {}, {} events)",
            destination.display(),
            layout.key(),
            template_name,
            events.len()
        );
        Ok(())
    }

    /// Names of the available templates, sorted.
    pub fn list_templates(&self) -> Result<Vec<String>, FlyerError> {
        let dir = &self.config.template_dir;
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("template directory {} does not exist", dir.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_pdf = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
            if !is_pdf || !path.is_file() {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Path of a template by name. Names that could escape the template
    /// directory are treated as unknown.
    pub(crate) fn template_path(&self, name: &str) -> Result<PathBuf, FlyerError> {
        if !is_plain_name(name) {
            return Err(FlyerError::TemplateNotFound(name.to_string()));
        }
        let path = self.config.template_dir.join(format!("{name}.pdf"));
        if !path.is_file() {
            return Err(FlyerError::TemplateNotFound(name.to_string()));
        }
        Ok(path)
    }
}

pub(crate) fn resolve_layout(name: &str) -> Result<&'static dyn Layout, FlyerError> {
    layout::find_layout(name).ok_or_else(|| FlyerError::LayoutNotFound(name.to_string()))
}

/// A single path component with no separators or parent references.
pub(crate) fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(['/', '\\', '\0'])
        && !name.contains("..")
}

fn check_geometry(template: PageSize, content: PageSize) -> Result<(), FlyerError> {
    if template.matches(&content, GEOMETRY_TOLERANCE) {
        Ok(())
    } else {
        Err(FlyerError::GeometryMismatch { template, content })
    }
}

/// Save `doc` to a temp file in the destination's directory, then rename it
/// over `destination`.
fn write_atomically(doc: &mut lopdf::Document, destination: &Path) -> Result<(), FlyerError> {
    let dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        doc.save_to(&mut writer).map_err(ComposeError::from)?;
        writer.flush()?;
    }
    tmp.persist(destination)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockRasterizer;
    use crate::test_helpers::*;

    fn builder(root: &Path) -> FlyerBuilder<MockRasterizer> {
        FlyerBuilder::with_rasterizer(config_for(root), MockRasterizer::new(850, 1100))
    }

    #[test]
    fn plain_names() {
        assert!(is_plain_name("rally"));
        assert!(is_plain_name("rally-2016_v2"));
        assert!(!is_plain_name(""));
        assert!(!is_plain_name("../secret"));
        assert!(!is_plain_name("a/b"));
        assert!(!is_plain_name("a\\b"));
    }

    #[test]
    fn build_two_column_on_letter_template() {
        let tmp = setup_templates();
        let out = tmp.path().join("out.pdf");
        builder(tmp.path())
            .build_flyer("rally", "TwoColumnLayout", &sample_events(12), &out)
            .unwrap();
        assert_single_page(&out, 612.0, 792.0);
    }

    #[test]
    fn every_layout_keeps_template_size() {
        let tmp = setup_templates();
        let b = builder(tmp.path());
        for layout in layout::layouts() {
            let n = layout.expected_events().unwrap_or(10);
            let out = tmp.path().join(format!("{}.pdf", layout.key()));
            b.build_flyer("banner", layout.key(), &sample_events(n), &out)
                .unwrap();
            assert_single_page(&out, 1224.0, 792.0);
        }
    }

    #[test]
    fn merged_page_keeps_template_background() {
        let tmp = setup_templates();
        let out = tmp.path().join("out.pdf");
        builder(tmp.path())
            .build_flyer("rally", "LargeLayout", &sample_events(3), &out)
            .unwrap();
        let doc = lopdf::Document::load(&out).unwrap();
        let page = compose::first_page(&doc).unwrap();
        let content = String::from_utf8_lossy(&doc.get_page_content(page).unwrap()).to_string();
        assert!(content.contains(" re"));
        assert!(content.contains("Do"));
    }

    #[test]
    fn unknown_template_is_not_found() {
        let tmp = setup_templates();
        let out = tmp.path().join("out.pdf");
        let err = builder(tmp.path())
            .build_flyer("missing", "TwoColumnLayout", &sample_events(2), &out)
            .unwrap_err();
        assert!(matches!(err, FlyerError::TemplateNotFound(name) if name == "missing"));
        assert!(!out.exists());
    }

    #[test]
    fn traversal_template_name_is_not_found() {
        let tmp = setup_templates();
        let err = builder(tmp.path())
            .build_flyer(
                "../templates/rally",
                "TwoColumnLayout",
                &sample_events(2),
                &tmp.path().join("out.pdf"),
            )
            .unwrap_err();
        assert!(matches!(err, FlyerError::TemplateNotFound(_)));
    }

    #[test]
    fn unknown_layout_is_not_found() {
        let tmp = setup_templates();
        let out = tmp.path().join("out.pdf");
        let err = builder(tmp.path())
            .build_flyer("rally", "FourColumnLayout", &sample_events(2), &out)
            .unwrap_err();
        assert!(matches!(err, FlyerError::LayoutNotFound(name) if name == "FourColumnLayout"));
        assert!(!out.exists());
    }

    #[test]
    fn malformed_event_writes_nothing() {
        let tmp = setup_templates();
        let out = tmp.path().join("out.pdf");
        let mut events = sample_events(3);
        events[1].description = None;
        let err = builder(tmp.path())
            .build_flyer("rally", "TwoColumnLayout", &events, &out)
            .unwrap_err();
        assert!(matches!(
            err,
            FlyerError::Layout(LayoutError::MissingField {
                field: "description"
            })
        ));
        assert!(!out.exists());
    }

    #[test]
    fn non_latin_title_without_fonts_writes_nothing() {
        let tmp = setup_templates();
        let out = tmp.path().join("out.pdf");
        let mut events = sample_events(2);
        events[0].name = Some("Nguyễn Đức rally 集会".into());
        let err = builder(tmp.path())
            .build_flyer("rally", "TwoColumnLayout", &events, &out)
            .unwrap_err();
        assert!(matches!(
            err,
            FlyerError::Layout(LayoutError::UnsupportedCharacter { ch: 'ễ', .. })
        ));
        assert!(!out.exists());
    }

    #[test]
    fn unreadable_font_fails_before_writing() {
        let tmp = setup_templates();
        let out = tmp.path().join("out.pdf");
        let mut config = config_for(tmp.path());
        config.fonts.bold = Some(tmp.path().join("missing.ttf"));
        let err = FlyerBuilder::with_rasterizer(config, MockRasterizer::new(850, 1100))
            .build_flyer("rally", "TwoColumnLayout", &sample_events(2), &out)
            .unwrap_err();
        assert!(matches!(err, FlyerError::Font(FontError::Read { .. })));
        assert!(!out.exists());
    }

    #[test]
    fn failed_build_keeps_previous_output() {
        let tmp = setup_templates();
        let out = tmp.path().join("out.pdf");
        std::fs::write(&out, b"previous").unwrap();
        let mut events = sample_events(1);
        events[0].start_dt = Some("soon".into());
        assert!(
            builder(tmp.path())
                .build_flyer("rally", "LargeLayout", &events, &out)
                .is_err()
        );
        assert_eq!(std::fs::read(&out).unwrap(), b"previous");
    }

    #[test]
    fn geometry_check() {
        let letter = PageSize::new(612.0, 792.0);
        assert!(check_geometry(letter, PageSize::new(612.0, 792.0)).is_ok());
        assert!(matches!(
            check_geometry(letter, PageSize::new(606.0, 792.0)),
            Err(FlyerError::GeometryMismatch { .. })
        ));
    }

    #[test]
    fn list_templates_is_sorted_pdf_stems() {
        let tmp = setup_templates();
        std::fs::write(tmp.path().join("templates/notes.txt"), "x").unwrap();
        let names = builder(tmp.path()).list_templates().unwrap();
        assert_eq!(names, vec!["banner", "rally"]);
    }

    #[test]
    fn list_templates_missing_dir_is_empty() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(builder(tmp.path()).list_templates().unwrap().is_empty());
    }
}
