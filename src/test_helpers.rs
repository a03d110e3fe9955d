//! Shared test utilities for the flyer-factory test suite.
//!
//! Provides template fixtures (small one-page PDFs written with lopdf),
//! event records, and assertions on generated documents.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_templates();
//! let config = config_for(tmp.path());
//! let builder = FlyerBuilder::with_rasterizer(config, MockRasterizer::new(850, 1100));
//! builder.build_flyer("rally", "TwoColumnLayout", &sample_events(12), &out).unwrap();
//! assert_single_page(&out, 612.0, 792.0);
//! ```

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::compose::{self, PageSize};
use crate::config::FlyerConfig;
use crate::event::EventRecord;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

// =========================================================================
// Fixture setup
// =========================================================================

/// A temp directory with `templates/rally.pdf` (letter) and
/// `templates/banner.pdf` (tabloid landscape).
pub fn setup_templates() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let templates = tmp.path().join("templates");
    std::fs::create_dir_all(&templates).unwrap();
    write_template(&templates, "rally", 612.0, 792.0);
    write_template(&templates, "banner", 1224.0, 792.0);
    tmp
}

/// Config pointing at `root/templates` and `root/previews`.
pub fn config_for(root: &Path) -> FlyerConfig {
    FlyerConfig {
        template_dir: root.join("templates"),
        preview_dir: root.join("previews"),
        ..FlyerConfig::default()
    }
}

/// Write a one-page template PDF whose background is a filled rectangle.
pub fn write_template(dir: &Path, name: &str, width: f32, height: f32) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content = Content {
        operations: vec![
            Operation::new("rg", vec![0.1.into(), 0.2.into(), 0.6.into()]),
            Operation::new(
                "re",
                vec![0.into(), (height * 2.0 / 3.0).into(), width.into(), (height / 3.0).into()],
            ),
            Operation::new("f", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => Object::Integer(1),
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join(format!("{name}.pdf"));
    doc.save(&path).unwrap();
    path
}

// =========================================================================
// Events
// =========================================================================

pub fn sample_event(i: usize) -> EventRecord {
    EventRecord {
        name: Some(format!("Neighborhood canvass #{i}")),
        start_dt: Some("2016-03-26 10:00:00".into()),
        timezone: Some("PDT".into()),
        description: Some("Knock doors with us. Training provided on site.".into()),
        venue_name: Some("Community center".into()),
        venue_addr1: Some(format!("{} Pine St", 100 + i)),
        venue_city: Some("Seattle".into()),
    }
}

pub fn sample_events(n: usize) -> Vec<EventRecord> {
    (0..n).map(sample_event).collect()
}

// =========================================================================
// Assertions
// =========================================================================

/// Assert `path` is a one-page PDF of the given size.
pub fn assert_single_page(path: &Path, width: f32, height: f32) {
    let doc = Document::load(path).unwrap();
    assert_eq!(doc.get_pages().len(), 1, "{} pages", path.display());
    let page = compose::first_page(&doc).unwrap();
    let size = compose::page_size(&doc, page).unwrap();
    assert!(
        size.matches(&PageSize::new(width, height), 0.01),
        "expected {width}x{height}, got {size}"
    );
}
