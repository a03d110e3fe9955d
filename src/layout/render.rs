//! Paint a [`ComposedPage`] into a one-page lopdf [`Document`].
//!
//! Standard faces become plain Type1 font dictionaries. A face embedded
//! through the [`FontBook`] becomes a Type0 font over a CIDFontType2
//! descendant with Identity-H encoding, so text is written as two-byte glyph
//! ids. Only glyphs the page uses get widths and ToUnicode entries; the font
//! program itself is embedded whole.

use super::LayoutError;
use super::flow::{ComposedPage, DrawOp};
use super::fonts::{Font, FontBook, TrueTypeFont};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use std::collections::BTreeMap;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Glyphs an embedded font has drawn, by glyph id.
type GlyphUse = BTreeMap<Font, BTreeMap<u16, char>>;

/// Build a standalone one-page document for `page`.
pub fn to_document(page: &ComposedPage, fonts: &FontBook) -> Result<Document, LayoutError> {
    let mut used = GlyphUse::new();
    let content = Content {
        operations: operations(&page.ops, fonts, &mut used)?,
    };

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut font_resources = Dictionary::new();
    for font in Font::ALL {
        let font_id = match fonts.embedded(font) {
            Some(face) => {
                let glyphs = used.get(&font).cloned().unwrap_or_default();
                add_embedded_font(&mut doc, font, face, &glyphs)
            }
            None => add_standard_font(&mut doc, font),
        };
        font_resources.set(font.resource_name(), font_id);
    }
    let resources_id = doc.add_object(dictionary! { "Font" => font_resources });

    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.0f32.into(), 0.0f32.into(), page.width.into(), page.height.into()],
        "Contents" => content_id,
        "Resources" => resources_id,
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

/// Save a document to `destination`.
pub fn save(doc: &mut Document, destination: &Path) -> Result<(), LayoutError> {
    let file = std::fs::File::create(destination)?;
    let mut writer = BufWriter::new(file);
    doc.save_to(&mut writer)?;
    writer.flush()?;
    Ok(())
}

fn add_standard_font(doc: &mut Document, font: Font) -> ObjectId {
    let mut dict = dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => font.base_font(),
    };
    if font.uses_win_ansi() {
        dict.set("Encoding", "WinAnsiEncoding");
    }
    doc.add_object(dict)
}

fn add_embedded_font(
    doc: &mut Document,
    font: Font,
    face: &TrueTypeFont,
    glyphs: &BTreeMap<u16, char>,
) -> ObjectId {
    let data = face.data().to_vec();
    let file_id = doc.add_object(Stream::new(
        dictionary! { "Length1" => Object::Integer(data.len() as i64) },
        data,
    ));

    let [x_min, y_min, x_max, y_max] = face.bbox();
    let italic_angle = if font == Font::Italic { -12 } else { 0 };
    // Nonsymbolic, plus Italic when set as the italic face.
    let flags = if font == Font::Italic { 32 | 64 } else { 32 };
    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => Object::Name(face.name().as_bytes().to_vec()),
        "Flags" => Object::Integer(flags),
        "FontBBox" => vec![
            Object::Integer(x_min),
            Object::Integer(y_min),
            Object::Integer(x_max),
            Object::Integer(y_max),
        ],
        "ItalicAngle" => Object::Integer(italic_angle),
        "Ascent" => Object::Integer(face.ascent()),
        "Descent" => Object::Integer(face.descent()),
        "CapHeight" => Object::Integer(face.ascent()),
        "StemV" => Object::Integer(80),
        "FontFile2" => file_id,
    });

    let mut widths = Vec::with_capacity(glyphs.len() * 2);
    for c in glyphs.values() {
        if let Some(glyph) = face.glyph(*c) {
            widths.push(Object::Integer(glyph.id.into()));
            widths.push(Object::Array(vec![Object::Integer(
                face.scale(glyph.advance.into()),
            )]));
        }
    }
    let cid_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => Object::Name(face.name().as_bytes().to_vec()),
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => Object::Integer(0),
        },
        "FontDescriptor" => descriptor_id,
        "W" => widths,
        "CIDToGIDMap" => "Identity",
    });

    let to_unicode_id = doc.add_object(Stream::new(
        dictionary! {},
        to_unicode_cmap(glyphs).into_bytes(),
    ));

    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => Object::Name(face.name().as_bytes().to_vec()),
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![Object::Reference(cid_font_id)],
        "ToUnicode" => to_unicode_id,
    })
}

/// CMap from glyph ids back to Unicode, so embedded text stays searchable.
fn to_unicode_cmap(glyphs: &BTreeMap<u16, char>) -> String {
    let mut out = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (Identity) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );
    let entries: Vec<(&u16, &char)> = glyphs.iter().collect();
    // At most 100 entries per bfchar block.
    for chunk in entries.chunks(100) {
        out.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (id, c) in chunk {
            let mut units = [0u16; 2];
            let hex: String = c
                .encode_utf16(&mut units)
                .iter()
                .map(|u| format!("{u:04X}"))
                .collect();
            out.push_str(&format!("<{id:04X}> <{hex}>\n"));
        }
        out.push_str("endbfchar\n");
    }
    out.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    out
}

fn operations(
    ops: &[DrawOp],
    fonts: &FontBook,
    used: &mut GlyphUse,
) -> Result<Vec<Operation>, LayoutError> {
    let mut out = vec![Operation::new("g", vec![0.0f32.into()])];
    for op in ops {
        match op {
            DrawOp::Text {
                x,
                y,
                font,
                size,
                text,
            } => {
                let bytes = fonts
                    .encode(*font, text)
                    .map_err(|ch| LayoutError::UnsupportedCharacter {
                        ch,
                        font: fonts.name(*font).to_string(),
                    })?;
                let string = match fonts.embedded(*font) {
                    Some(face) => {
                        let glyphs = used.entry(*font).or_default();
                        for c in text.chars() {
                            let c = if c.is_ascii_whitespace() { ' ' } else { c };
                            if let Some(glyph) = face.glyph(c) {
                                glyphs.entry(glyph.id).or_insert(c);
                            }
                        }
                        Object::String(bytes, StringFormat::Hexadecimal)
                    }
                    None => Object::string_literal(bytes),
                };
                out.push(Operation::new("BT", vec![]));
                out.push(Operation::new(
                    "Tf",
                    vec![Object::Name(font.resource_name().as_bytes().to_vec()), (*size).into()],
                ));
                out.push(Operation::new("Td", vec![(*x).into(), (*y).into()]));
                out.push(Operation::new("Tj", vec![string]));
                out.push(Operation::new("ET", vec![]));
            }
            DrawOp::Line { from, to, width } => {
                out.push(Operation::new("q", vec![]));
                out.push(Operation::new("w", vec![(*width).into()]));
                out.push(Operation::new("m", vec![from.0.into(), from.1.into()]));
                out.push(Operation::new("l", vec![to.0.into(), to.1.into()]));
                out.push(Operation::new("S", vec![]));
                out.push(Operation::new("Q", vec![]));
            }
        }
    }
    Ok(out)
}
