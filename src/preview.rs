//! Write-once preview cache.
//!
//! A preview is a flyer built from placeholder events, rasterized, scaled to
//! the configured width and saved as a JPEG at
//! `{preview_dir}/{template}_{layout}.jpg`. Once that file exists it is
//! returned as is; there is no invalidation. Delete the file to rebuild it.
//!
//! The JPEG is written to a temp file in the cache directory and linked into
//! place without clobbering, so readers never see a partial file. Two
//! concurrent first requests may both render; the second one to finish keeps
//! the file already there.

use crate::event::EventRecord;
use crate::flyer::{FlyerBuilder, FlyerError, is_plain_name, resolve_layout};
use crate::imaging::{PdfRasterizer, RasterParams, render_preview};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

impl<R: PdfRasterizer> FlyerBuilder<R> {
    /// Cache path of the preview for a template and layout.
    pub fn preview_path(&self, template_name: &str, layout_name: &str) -> PathBuf {
        self.config
            .preview_dir
            .join(format!("{template_name}_{layout_name}.jpg"))
    }

    /// Return the cached preview, rendering it first if it does not exist.
    pub fn get_preview(
        &self,
        template_name: &str,
        layout_name: &str,
    ) -> Result<PathBuf, FlyerError> {
        if !is_plain_name(template_name) {
            return Err(FlyerError::TemplateNotFound(template_name.to_string()));
        }
        let layout = resolve_layout(layout_name)?;

        let path = self.preview_path(template_name, layout.key());
        if path.is_file() {
            log::debug!("preview cache hit: {}", path.display());
            return Ok(path);
        }

        let scratch = tempfile::TempDir::new()?;
        let pdf = scratch.path().join("preview.pdf");
        let events = vec![EventRecord::placeholder(); self.config.preview.placeholder_events];
        self.build_flyer(template_name, layout.key(), &events, &pdf)?;

        let jpeg = render_preview(
            &self.rasterizer,
            &RasterParams {
                source: pdf,
                dpi: self.config.preview.dpi,
            },
            &self.config.preview_params(),
        )?;

        std::fs::create_dir_all(&self.config.preview_dir)?;
        let mut tmp = NamedTempFile::new_in(&self.config.preview_dir)?;
        tmp.write_all(&jpeg)?;
        tmp.flush()?;
        match tmp.persist_noclobber(&path) {
            Ok(_) => log::info!("wrote preview {}", path.display()),
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
                log::debug!("preview {} appeared while rendering; keeping it", path.display());
            }
            Err(e) => return Err(e.into()),
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockRasterizer;
    use crate::test_helpers::*;
    use std::path::Path;

    fn builder(root: &Path) -> FlyerBuilder<MockRasterizer> {
        FlyerBuilder::with_rasterizer(config_for(root), MockRasterizer::new(850, 1100))
    }

    #[test]
    fn preview_path_is_template_underscore_layout() {
        let tmp = setup_templates();
        assert_eq!(
            builder(tmp.path()).preview_path("rally", "LargeLayout"),
            tmp.path().join("previews/rally_LargeLayout.jpg")
        );
    }

    #[test]
    fn first_request_renders_jpeg() {
        let tmp = setup_templates();
        let b = builder(tmp.path());
        let path = b.get_preview("rally", "LargeLayout").unwrap();
        assert_eq!(path, tmp.path().join("previews/rally_LargeLayout.jpg"));

        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (300, 388));
        assert!(!img.color().has_alpha());

        let calls = b.rasterizer.get_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].dpi, 100);
    }

    #[test]
    fn second_request_is_a_cache_hit() {
        let tmp = setup_templates();
        let b = builder(tmp.path());
        let first = b.get_preview("rally", "TwoColumnLayout").unwrap();
        let bytes = std::fs::read(&first).unwrap();

        let second = b.get_preview("rally", "TwoColumnLayout").unwrap();
        assert_eq!(first, second);
        assert_eq!(std::fs::read(&second).unwrap(), bytes);
        assert_eq!(b.rasterizer.get_calls().len(), 1);
    }

    #[test]
    fn existing_file_is_never_regenerated() {
        let tmp = setup_templates();
        let b = builder(tmp.path());
        let path = b.preview_path("rally", "LargeLayout");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"stale").unwrap();

        assert_eq!(b.get_preview("rally", "LargeLayout").unwrap(), path);
        assert_eq!(std::fs::read(&path).unwrap(), b"stale");
        assert!(b.rasterizer.get_calls().is_empty());
    }

    #[test]
    fn unknown_layout_writes_nothing() {
        let tmp = setup_templates();
        let b = builder(tmp.path());
        let err = b.get_preview("rally", "Nope").unwrap_err();
        assert!(matches!(err, FlyerError::LayoutNotFound(_)));
        assert!(!tmp.path().join("previews").exists());
    }

    #[test]
    fn unknown_template_writes_nothing() {
        let tmp = setup_templates();
        let err = builder(tmp.path())
            .get_preview("flyer", "LargeLayout")
            .unwrap_err();
        assert!(matches!(err, FlyerError::TemplateNotFound(_)));
        assert!(!tmp.path().join("previews").exists());
    }

    #[test]
    fn single_event_layouts_preview_too() {
        let tmp = setup_templates();
        let path = builder(tmp.path())
            .get_preview("banner", "PhonebankLayout")
            .unwrap();
        assert!(path.ends_with("banner_PhonebankLayout.jpg"));
    }
}
