//! PDF page composition: template geometry, overlays, and two-up duplication.
//!
//! Everything here works on whole pages. A source page is turned into a form
//! XObject (its content stream plus a deep copy of its resources) inside the
//! target document, and then painted with `Do`, optionally translated. This
//! one primitive covers both operations the flyer pipeline needs:
//!
//! - [`overlay_page`]: paint the generated content page over a template page
//!   in the same coordinate space.
//! - [`duplicate_side_by_side`]: paint a half-width page twice, at `x = 0`
//!   and `x = width`, onto a page twice as wide.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("Document has no pages")]
    NoPages,
    #[error("Page {0:?} has no usable MediaBox")]
    MissingMediaBox(ObjectId),
}

/// Page trees deeper than this are treated as cyclic.
const MAX_TREE_DEPTH: usize = 64;

/// Width and height of a page in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Equal within `tolerance` points on both axes.
    pub fn matches(&self, other: &PageSize, tolerance: f32) -> bool {
        (self.width - other.width).abs() <= tolerance
            && (self.height - other.height).abs() <= tolerance
    }
}

impl std::fmt::Display for PageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}pt", self.width, self.height)
    }
}

pub fn load(path: &Path) -> Result<Document, ComposeError> {
    Ok(Document::load(path)?)
}

/// Object id of page 1.
pub fn first_page(doc: &Document) -> Result<ObjectId, ComposeError> {
    doc.get_pages()
        .into_iter()
        .next()
        .map(|(_, id)| id)
        .ok_or(ComposeError::NoPages)
}

/// Size of a page from its MediaBox, following inheritance up the page tree.
pub fn page_size(doc: &Document, page_id: ObjectId) -> Result<PageSize, ComposeError> {
    let [x1, y1, x2, y2] = media_box(doc, page_id)?;
    Ok(PageSize::new((x2 - x1).abs(), (y2 - y1).abs()))
}

/// Drop every page after the first.
pub fn keep_first_page(doc: &mut Document) {
    let extra: Vec<u32> = doc.get_pages().keys().copied().filter(|n| *n > 1).collect();
    if !extra.is_empty() {
        log::debug!("dropping {} extra template page(s)", extra.len());
        doc.delete_pages(&extra);
    }
}

/// Paint `source_page` of `source` over `target_page` of `target`.
///
/// The existing page content is wrapped in `q`/`Q` so graphics state it leaves
/// behind cannot leak into the overlay.
pub fn overlay_page(
    target: &mut Document,
    target_page: ObjectId,
    source: &Document,
    source_page: ObjectId,
) -> Result<(), ComposeError> {
    let form_id = page_as_form(target, source, source_page)?;

    let mut resources = resolved_resources(target, target_page)?;
    let mut xobjects = match resources.get(b"XObject") {
        Ok(Object::Reference(id)) => target.get_dictionary(*id)?.clone(),
        Ok(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };
    let name = unused_name(&xobjects, "FlyerContent");
    xobjects.set(name.as_str(), form_id);
    resources.set("XObject", xobjects);

    let existing = content_streams(target, target_page)?;
    let save_id = add_content(target, vec![Operation::new("q", vec![])])?;
    let restore_id = add_content(target, vec![Operation::new("Q", vec![])])?;
    let overlay_id = add_content(target, paint_form(&name, 0.0, 0.0))?;

    let mut contents = Vec::with_capacity(existing.len() + 3);
    contents.push(Object::Reference(save_id));
    contents.extend(existing);
    contents.push(Object::Reference(restore_id));
    contents.push(Object::Reference(overlay_id));

    let page = target.get_dictionary_mut(target_page)?;
    page.set("Resources", resources);
    page.set("Contents", Object::Array(contents));
    Ok(())
}

/// Build a page twice as wide as page 1 of `source`, with that page painted
/// on both halves.
pub fn duplicate_side_by_side(source: &Document) -> Result<Document, ComposeError> {
    let source_page = first_page(source)?;
    let half = page_size(source, source_page)?;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let form_id = page_as_form(&mut doc, source, source_page)?;

    let name = "Half";
    let mut operations = paint_form(name, 0.0, 0.0);
    operations.extend(paint_form(name, half.width, 0.0));
    let content_id = add_content(&mut doc, operations)?;

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.0f32.into(), 0.0f32.into(), (2.0 * half.width).into(), half.height.into()],
        "Contents" => content_id,
        "Resources" => dictionary! { "XObject" => dictionary! { name => form_id } },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => Object::Integer(1),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    Ok(doc)
}

/// References to the page's content streams. `/Contents` may be a stream
/// reference, an array, or a reference to an array.
fn content_streams(doc: &Document, page_id: ObjectId) -> Result<Vec<Object>, ComposeError> {
    let contents = match doc.get_dictionary(page_id)?.get(b"Contents") {
        Ok(contents) => contents,
        Err(_) => return Ok(Vec::new()),
    };
    let items = match contents {
        Object::Reference(id) => match doc.get_object(*id)? {
            Object::Array(items) => items.clone(),
            _ => vec![contents.clone()],
        },
        Object::Array(items) => items.clone(),
        _ => Vec::new(),
    };
    Ok(items
        .into_iter()
        .filter(|item| matches!(item, Object::Reference(_)))
        .collect())
}

fn paint_form(name: &str, dx: f32, dy: f32) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                1.0f32.into(),
                0.0f32.into(),
                0.0f32.into(),
                1.0f32.into(),
                dx.into(),
                dy.into(),
            ],
        ),
        Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}

fn add_content(doc: &mut Document, operations: Vec<Operation>) -> Result<ObjectId, ComposeError> {
    let bytes = Content { operations }.encode()?;
    Ok(doc.add_object(Stream::new(dictionary! {}, bytes)))
}

fn unused_name(dict: &Dictionary, base: &str) -> String {
    let mut name = base.to_string();
    let mut n = 1;
    while dict.has(name.as_bytes()) {
        name = format!("{base}{n}");
        n += 1;
    }
    name
}

/// Copy a page of `source` into `target` as a form XObject.
fn page_as_form(
    target: &mut Document,
    source: &Document,
    page_id: ObjectId,
) -> Result<ObjectId, ComposeError> {
    let bbox = media_box(source, page_id)?;
    let content = source.get_page_content(page_id)?;
    let resources = resolved_resources(source, page_id)?;

    let mut copier = ObjectCopier::new(source, target);
    let resources = copier.remap_references(Object::Dictionary(resources))?;

    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Form",
        "BBox" => bbox.iter().map(|v| Object::from(*v)).collect::<Vec<_>>(),
        "Resources" => resources,
    };
    Ok(target.add_object(Stream::new(dict, content)))
}

/// Look up a page attribute, walking `/Parent` links for inherited values.
fn inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>, ComposeError> {
    let mut current = Some(page_id);
    for _ in 0..MAX_TREE_DEPTH {
        let Some(id) = current else { break };
        let dict = doc.get_dictionary(id)?;
        if let Ok(value) = dict.get(key) {
            return Ok(Some(resolve(doc, value)?));
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    Ok(None)
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object, ComposeError> {
    match obj {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

fn media_box(doc: &Document, page_id: ObjectId) -> Result<[f32; 4], ComposeError> {
    let missing = || ComposeError::MissingMediaBox(page_id);
    let values = inherited(doc, page_id, b"MediaBox")?
        .and_then(|obj| obj.as_array().ok())
        .ok_or_else(missing)?;
    if values.len() != 4 {
        return Err(missing());
    }
    let mut out = [0.0f32; 4];
    for (slot, value) in out.iter_mut().zip(values) {
        *slot = resolve(doc, value)?.as_float().map_err(|_| missing())?;
    }
    Ok(out)
}

/// The page's resource dictionary with the top level resolved to a value.
fn resolved_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary, ComposeError> {
    Ok(inherited(doc, page_id, b"Resources")?
        .and_then(|obj| obj.as_dict().ok())
        .cloned()
        .unwrap_or_default())
}

/// Deep-copies objects between documents, remapping references.
struct ObjectCopier<'a> {
    source: &'a Document,
    target: &'a mut Document,
    id_map: HashMap<ObjectId, ObjectId>,
}

impl<'a> ObjectCopier<'a> {
    fn new(source: &'a Document, target: &'a mut Document) -> Self {
        Self {
            source,
            target,
            id_map: HashMap::new(),
        }
    }

    fn copy_object(&mut self, source_id: ObjectId) -> Result<ObjectId, lopdf::Error> {
        if let Some(target_id) = self.id_map.get(&source_id) {
            return Ok(*target_id);
        }
        // Reserve the id before recursing so reference cycles terminate.
        let new_id = self.target.add_object(Object::Null);
        self.id_map.insert(source_id, new_id);

        let obj = self.source.get_object(source_id)?.clone();
        let obj = self.remap_references(obj)?;
        self.target.objects.insert(new_id, obj);
        Ok(new_id)
    }

    fn remap_references(&mut self, obj: Object) -> Result<Object, lopdf::Error> {
        match obj {
            Object::Reference(id) => Ok(Object::Reference(self.copy_object(id)?)),
            Object::Array(items) => Ok(Object::Array(
                items
                    .into_iter()
                    .map(|o| self.remap_references(o))
                    .collect::<Result<_, _>>()?,
            )),
            Object::Dictionary(mut dict) => {
                for (_, value) in dict.iter_mut() {
                    *value = self.remap_references(std::mem::replace(value, Object::Null))?;
                }
                Ok(Object::Dictionary(dict))
            }
            Object::Stream(mut stream) => {
                for (_, value) in stream.dict.iter_mut() {
                    *value = self.remap_references(std::mem::replace(value, Object::Null))?;
                }
                Ok(Object::Stream(stream))
            }
            other => Ok(other),
        }
    }
}
