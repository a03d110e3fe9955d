//! Fonts used by the card renderers.
//!
//! By default nothing is embedded: every PDF viewer ships Helvetica and
//! ZapfDingbats, so the generated content pages stay small and need no font
//! files at runtime. Widths come from the Adobe AFM metrics (units per 1000
//! em) and are only used for line breaking and centering. The standard fonts
//! only cover WinAnsi; for other scripts a TrueType file can stand in for the
//! regular, bold, or italic face through a [`FontBook`]. Embedded faces are
//! written as Type0 fonts with Identity-H encoding and a ToUnicode map.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FontError {
    #[error("Failed to read font {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid TrueType font {path}: {source}")]
    Parse {
        path: PathBuf,
        source: ttf_parser::FaceParsingError,
    },
}

/// A font face available to paragraphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Font {
    Regular,
    Bold,
    Italic,
    Dingbats,
}

impl Font {
    pub const ALL: [Font; 4] = [Font::Regular, Font::Bold, Font::Italic, Font::Dingbats];

    /// Resource name inside the page's `/Font` dictionary.
    pub fn resource_name(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Italic => "F3",
            Font::Dingbats => "F4",
        }
    }

    pub fn base_font(self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
            Font::Italic => "Helvetica-Oblique",
            Font::Dingbats => "ZapfDingbats",
        }
    }

    /// Symbolic fonts use their built-in encoding; text fonts use WinAnsi.
    pub fn uses_win_ansi(self) -> bool {
        !matches!(self, Font::Dingbats)
    }

    /// Advance width of `text` at `size` points.
    pub fn text_width(self, text: &str, size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| self.char_units(c)).sum();
        units as f32 * size / 1000.0
    }

    pub(crate) fn char_width(self, c: char, size: f32) -> f32 {
        self.char_units(c) as f32 * size / 1000.0
    }

    fn char_units(self, c: char) -> u32 {
        match self {
            Font::Regular | Font::Italic => ascii_units(c, &HELVETICA),
            Font::Bold => ascii_units(c, &HELVETICA_BOLD),
            Font::Dingbats => match c {
                icons::STAR => 816,
                icons::CLOCK => 791,
                icons::PIN => 776,
                _ => 788,
            },
        }
    }
}

/// ZapfDingbats code points for the card icons.
pub mod icons {
    /// Filled circle marking the time row.
    pub const CLOCK: char = 'l';
    /// Filled diamond marking the venue row.
    pub const PIN: char = 'u';
    /// Star in the middle of separator lines.
    pub const STAR: char = 'H';
}

fn ascii_units(c: char, table: &[u16; 95]) -> u32 {
    match c {
        ' '..='~' => table[(c as usize) - 0x20] as u32,
        '\u{a0}' => table[0] as u32,
        _ => 556,
    }
}

/// Encode text for a WinAnsi-encoded simple font.
///
/// Latin-1 maps straight through and the typographic punctuation WinAnsi
/// keeps in 0x80..0x9F is remapped. Any other character is returned as the
/// error.
pub fn encode_win_ansi(text: &str) -> Result<Vec<u8>, char> {
    text.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(c: char) -> Result<u8, char> {
    Ok(match c {
        '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{ff}' => c as u8,
        '\u{20ac}' => 0x80,
        '\u{2026}' => 0x85,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201c}' => 0x93,
        '\u{201d}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\t' | '\n' | '\r' => b' ',
        _ => return Err(c),
    })
}

/// A glyph of an embedded font: its id and advance in font units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub id: u16,
    pub advance: u16,
}

/// A TrueType font program with the metrics needed to set and embed it.
#[derive(Clone)]
pub struct TrueTypeFont {
    name: String,
    data: Vec<u8>,
    units_per_em: u16,
    ascent: i16,
    descent: i16,
    bbox: [i16; 4],
    glyphs: HashMap<char, Glyph>,
}

impl fmt::Debug for TrueTypeFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrueTypeFont")
            .field("name", &self.name)
            .field("bytes", &self.data.len())
            .field("glyphs", &self.glyphs.len())
            .finish()
    }
}

impl TrueTypeFont {
    pub fn from_file(path: &Path) -> Result<Self, FontError> {
        let data = std::fs::read(path).map_err(|source| FontError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let fallback = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("EmbeddedFont");
        let font = Self::from_bytes(data, fallback).map_err(|source| FontError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!(
            "loaded {} from {} ({} glyphs)",
            font.name,
            path.display(),
            font.glyphs.len()
        );
        Ok(font)
    }

    /// Parse a font program. `fallback_name` is used when the font has no
    /// usable PostScript name.
    pub fn from_bytes(
        data: Vec<u8>,
        fallback_name: &str,
    ) -> Result<Self, ttf_parser::FaceParsingError> {
        let (name, units_per_em, ascent, descent, bbox, glyphs) = {
            let face = ttf_parser::Face::parse(&data, 0)?;
            let mut glyphs = HashMap::new();
            if let Some(cmap) = face.tables().cmap {
                for subtable in cmap.subtables {
                    if !subtable.is_unicode() {
                        continue;
                    }
                    subtable.codepoints(|code| {
                        let (Some(c), Some(id)) = (char::from_u32(code), subtable.glyph_index(code))
                        else {
                            return;
                        };
                        let advance = face.glyph_hor_advance(id).unwrap_or(0);
                        glyphs.entry(c).or_insert(Glyph { id: id.0, advance });
                    });
                }
            }
            let name = face
                .names()
                .into_iter()
                .find(|n| n.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
                .and_then(|n| n.to_string())
                .unwrap_or_else(|| fallback_name.to_string());
            let rect = face.global_bounding_box();
            (
                name,
                face.units_per_em().max(1),
                face.ascender(),
                face.descender(),
                [rect.x_min, rect.y_min, rect.x_max, rect.y_max],
                glyphs,
            )
        };
        Ok(Self {
            name: pdf_name(&name),
            data,
            units_per_em,
            ascent,
            descent,
            bbox,
            glyphs,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn glyph(&self, c: char) -> Option<Glyph> {
        self.glyphs.get(&c).copied()
    }

    /// Convert font units to PDF glyph space (1000 per em).
    pub fn scale(&self, units: i32) -> i64 {
        i64::from(units) * 1000 / i64::from(self.units_per_em)
    }

    pub fn ascent(&self) -> i64 {
        self.scale(self.ascent.into())
    }

    pub fn descent(&self) -> i64 {
        self.scale(self.descent.into())
    }

    pub fn bbox(&self) -> [i64; 4] {
        self.bbox.map(|v| self.scale(v.into()))
    }

    fn char_units(&self, c: char) -> u32 {
        let c = if c.is_ascii_whitespace() { ' ' } else { c };
        match self.glyph(c) {
            Some(glyph) => self.scale(glyph.advance.into()).max(0) as u32,
            None => 500,
        }
    }
}

/// Keep only characters allowed in a PDF name without escaping.
fn pdf_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+'))
        .collect();
    if cleaned.is_empty() {
        "EmbeddedFont".to_string()
    } else {
        cleaned
    }
}

/// The faces text is set in.
///
/// Every [`Font`] is the standard-14 face unless a TrueType font has been
/// registered for it. ZapfDingbats always stays standard, since the icons
/// are addressed by its built-in codes.
#[derive(Debug, Clone, Default)]
pub struct FontBook {
    embedded: BTreeMap<Font, Arc<TrueTypeFont>>,
}

impl FontBook {
    /// Set `font` in `face` instead of the standard font.
    pub fn with_embedded(mut self, font: Font, face: TrueTypeFont) -> Self {
        if font == Font::Dingbats {
            log::warn!("ignoring {} for the icon font", face.name());
            return self;
        }
        self.embedded.insert(font, Arc::new(face));
        self
    }

    pub fn embedded(&self, font: Font) -> Option<&TrueTypeFont> {
        self.embedded.get(&font).map(Arc::as_ref)
    }

    /// Name used in error messages and the PDF.
    pub fn name(&self, font: Font) -> &str {
        match self.embedded(font) {
            Some(face) => face.name(),
            None => font.base_font(),
        }
    }

    /// Advance width of `text` at `size` points.
    pub fn text_width(&self, font: Font, text: &str, size: f32) -> f32 {
        match self.embedded(font) {
            Some(face) => {
                let units: u32 = text.chars().map(|c| face.char_units(c)).sum();
                units as f32 * size / 1000.0
            }
            None => font.text_width(text, size),
        }
    }

    pub fn char_width(&self, font: Font, c: char, size: f32) -> f32 {
        match self.embedded(font) {
            Some(face) => face.char_units(c) as f32 * size / 1000.0,
            None => font.char_width(c, size),
        }
    }

    /// Encode `text` as the bytes of a `Tj` string in `font`. The first
    /// character the font cannot show is returned as the error.
    pub fn encode(&self, font: Font, text: &str) -> Result<Vec<u8>, char> {
        match self.embedded(font) {
            Some(face) => {
                let mut bytes = Vec::with_capacity(text.len() * 2);
                for c in text.chars() {
                    let c = if c.is_ascii_whitespace() { ' ' } else { c };
                    let glyph = face.glyph(c).filter(|g| g.id != 0).ok_or(c)?;
                    bytes.extend_from_slice(&glyph.id.to_be_bytes());
                }
                Ok(bytes)
            }
            None if font.uses_win_ansi() => encode_win_ansi(text),
            None => text
                .chars()
                .map(|c| if c.is_ascii() { Ok(c as u8) } else { Err(c) })
                .collect(),
        }
    }
}

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];
