//! End-to-end flyer and preview generation through the public API.
//!
//! Templates are written on the fly with lopdf. Previews use a stub
//! rasterizer so these tests run without poppler; the real `pdftoppm` path is
//! covered by the ignored test at the bottom.

use flyer_factory::compose::{self, PageSize};
use flyer_factory::config::FlyerConfig;
use flyer_factory::event::EventRecord;
use flyer_factory::flyer::{FlyerBuilder, FlyerError};
use flyer_factory::imaging::{PdfRasterizer, RasterError, RasterParams};
use flyer_factory::layout::{self, CardStyle, Layout, PageSpec, RenderOptions};
use image::{DynamicImage, Rgba, RgbaImage};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Rasterizer stub: a transparent page at the requested DPI.
#[derive(Clone)]
struct StubRasterizer {
    calls: Arc<AtomicUsize>,
}

impl StubRasterizer {
    fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PdfRasterizer for StubRasterizer {
    fn rasterize(&self, params: &RasterParams) -> Result<DynamicImage, RasterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let doc = Document::load(&params.source).expect("rasterizer input must be a PDF");
        let page = compose::first_page(&doc).unwrap();
        let size = compose::page_size(&doc, page).unwrap();
        let (w, h) =
            flyer_factory::imaging::raster_dimensions(size.width, size.height, params.dpi);
        Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            w,
            h,
            Rgba([0, 0, 0, 0]),
        )))
    }
}

fn write_template(dir: &Path, name: &str, width: f32, height: f32) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content = Content {
        operations: vec![
            Operation::new("rg", vec![0.9.into(), 0.1.into(), 0.1.into()]),
            Operation::new("re", vec![0.into(), 0.into(), width.into(), 40.into()]),
            Operation::new("f", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => Object::Integer(1),
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);

    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(format!("{name}.pdf"));
    doc.save(&path).unwrap();
    path
}

fn event(i: usize) -> EventRecord {
    serde_json::from_value(serde_json::json!({
        "name": format!("Volunteer meetup {i}"),
        "start_dt": "2016-02-14 19:00:00",
        "timezone": "PST",
        "description": "Plan the next canvass &amp; phonebank. Pizza provided.",
        "venue_name": "Union hall",
        "venue_addr1": "500 Elm St",
        "venue_city": "Portland",
        "venue_zip": "97201"
    }))
    .unwrap()
}

fn events(n: usize) -> Vec<EventRecord> {
    (0..n).map(event).collect()
}

fn setup() -> (TempDir, FlyerConfig) {
    let tmp = TempDir::new().unwrap();
    let templates = tmp.path().join("flyer-templates");
    write_template(&templates, "rally", 612.0, 792.0);
    write_template(&templates, "poster", 792.0, 1224.0);
    let config = FlyerConfig {
        template_dir: templates,
        preview_dir: tmp.path().join("previews"),
        ..FlyerConfig::default()
    };
    (tmp, config)
}

fn page_size(path: &Path) -> (usize, PageSize) {
    let doc = Document::load(path).unwrap();
    let page = compose::first_page(&doc).unwrap();
    (doc.get_pages().len(), compose::page_size(&doc, page).unwrap())
}

#[test]
fn rally_two_column_twelve_events() {
    let (tmp, config) = setup();
    let builder = FlyerBuilder::with_rasterizer(config, StubRasterizer::new());
    let out = tmp.path().join("rally.pdf");

    builder
        .build_flyer("rally", "TwoColumnLayout", &events(12), &out)
        .unwrap();

    let (pages, size) = page_size(&out);
    assert_eq!(pages, 1);
    assert_eq!(size, PageSize::new(612.0, 792.0));

    // Same geometry the builder uses: all twelve cards placed, left first.
    let spec = PageSpec::new(size, 264.0, 36.0, 36.0);
    let composed = layout::TwoColumnLayout
        .compose(&spec, &events(12), &RenderOptions::default())
        .unwrap();
    assert_eq!(composed.card_count(CardStyle::Normal), 12);
    let frames: Vec<usize> = composed.blocks.iter().map(|b| b.frame).collect();
    assert!(frames.windows(2).all(|w| w[0] <= w[1]));
    assert!(frames.contains(&0) && frames.contains(&1));
}

#[test]
fn every_layout_matches_template_size() {
    let (tmp, config) = setup();
    let builder = FlyerBuilder::with_rasterizer(config, StubRasterizer::new());
    for template in ["rally", "poster"] {
        for l in layout::layouts() {
            let n = l.expected_events().unwrap_or(6);
            let out = tmp.path().join(format!("{template}-{}.pdf", l.key()));
            builder.build_flyer(template, l.key(), &events(n), &out).unwrap();
            let (pages, size) = page_size(&out);
            let (_, expected) = page_size(
                &builder
                    .config()
                    .template_dir
                    .join(format!("{template}.pdf")),
            );
            assert_eq!(pages, 1, "{template} {}", l.key());
            assert!(size.matches(&expected, 0.01), "{template} {}: {size}", l.key());
        }
    }
}

#[test]
fn missing_template_and_layout_are_reported() {
    let (tmp, config) = setup();
    let builder = FlyerBuilder::with_rasterizer(config, StubRasterizer::new());
    let out = tmp.path().join("never.pdf");

    assert!(matches!(
        builder.build_flyer("gala", "LargeLayout", &events(2), &out),
        Err(FlyerError::TemplateNotFound(_))
    ));
    assert!(matches!(
        builder.build_flyer("rally", "Layout", &events(2), &out),
        Err(FlyerError::LayoutNotFound(_))
    ));
    assert!(!out.exists());
}

#[test]
fn templates_are_listed_by_name() {
    let (_tmp, config) = setup();
    let builder = FlyerBuilder::with_rasterizer(config, StubRasterizer::new());
    assert_eq!(builder.list_templates().unwrap(), vec!["poster", "rally"]);
}

#[test]
fn rally_large_preview_is_cached() {
    let (tmp, config) = setup();
    let stub = StubRasterizer::new();
    let builder = FlyerBuilder::with_rasterizer(config, stub.clone());

    let path = builder.get_preview("rally", "LargeLayout").unwrap();
    assert_eq!(path, tmp.path().join("previews/rally_LargeLayout.jpg"));
    let img = image::open(&path).unwrap();
    // 850x1100 at 100 DPI, scaled to 300 wide.
    assert_eq!((img.width(), img.height()), (300, 388));
    assert!(!img.color().has_alpha());
    let first = std::fs::read(&path).unwrap();

    let again = builder.get_preview("rally", "LargeLayout").unwrap();
    assert_eq!(again, path);
    assert_eq!(std::fs::read(&again).unwrap(), first);
    assert_eq!(stub.calls(), 1);

    // Only the preview is left behind.
    let entries: Vec<_> = std::fs::read_dir(tmp.path().join("previews"))
        .unwrap()
        .collect();
    assert_eq!(entries.len(), 1);
}

#[test]
#[ignore] // Requires pdftoppm on PATH
fn poppler_preview_end_to_end() {
    let (tmp, config) = setup();
    let builder = FlyerBuilder::new(config);
    let path = builder.get_preview("poster", "ThreeColumnLayout").unwrap();
    let img = image::open(&path).unwrap();
    assert_eq!(img.width(), 300);
    assert_eq!(img.height(), 464);
    assert!(path.starts_with(tmp.path()));
}
