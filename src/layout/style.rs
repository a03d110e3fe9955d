//! Paragraph styles for the card renderers.

use super::fonts::Font;
use std::sync::LazyLock;

/// Points per inch.
pub const INCH: f32 = 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParagraphStyle {
    pub font: Font,
    pub size: f32,
    /// Baseline-to-baseline distance.
    pub leading: f32,
    pub align: Align,
    pub space_after: f32,
}

impl ParagraphStyle {
    pub(crate) const fn new(font: Font, size: f32, leading: f32) -> Self {
        Self {
            font,
            size,
            leading,
            align: Align::Left,
            space_after: 0.0,
        }
    }

    const fn centered(self) -> Self {
        Self {
            align: Align::Center,
            ..self
        }
    }

    const fn space_after(self, space_after: f32) -> Self {
        Self {
            space_after,
            ..self
        }
    }

    /// Same metrics in another face, for inline bold runs.
    pub fn with_font(self, font: Font) -> Self {
        Self { font, ..self }
    }
}

/// Every style a card renderer may ask for.
#[derive(Debug, Clone)]
pub struct StyleSheet {
    pub default: ParagraphStyle,
    pub small: ParagraphStyle,

    pub event_title: ParagraphStyle,
    pub event_time: ParagraphStyle,
    pub event_description: ParagraphStyle,

    pub xl_title: ParagraphStyle,
    pub xl_venue: ParagraphStyle,
    pub xl_address: ParagraphStyle,
    pub xl_description: ParagraphStyle,

    pub pb_title: ParagraphStyle,
    pub pb_venue: ParagraphStyle,
    pub pb_address: ParagraphStyle,
    pub pb_description: ParagraphStyle,

    pub xs_title: ParagraphStyle,
    pub xs_text: ParagraphStyle,
}

static STANDARD: LazyLock<StyleSheet> = LazyLock::new(|| StyleSheet {
    default: ParagraphStyle::new(Font::Regular, 10.0, 12.0),
    small: ParagraphStyle::new(Font::Regular, 8.0, 8.0),

    event_title: ParagraphStyle::new(Font::Bold, 10.0, 12.0),
    event_time: ParagraphStyle::new(Font::Italic, 8.0, 8.0),
    event_description: ParagraphStyle::new(Font::Italic, 7.0, 7.0).space_after(0.2 * INCH),

    xl_title: ParagraphStyle::new(Font::Bold, 12.0, 14.4)
        .centered()
        .space_after(0.1 * INCH),
    xl_venue: ParagraphStyle::new(Font::Bold, 8.0, 9.6).centered(),
    xl_address: ParagraphStyle::new(Font::Regular, 7.0, 8.4).centered(),
    xl_description: ParagraphStyle::new(Font::Regular, 9.0, 10.8).centered(),

    pb_title: ParagraphStyle::new(Font::Bold, 18.0, 21.6)
        .centered()
        .space_after(0.2 * INCH),
    pb_venue: ParagraphStyle::new(Font::Bold, 12.0, 14.4).centered(),
    pb_address: ParagraphStyle::new(Font::Regular, 12.0, 14.4)
        .centered()
        .space_after(0.1 * INCH),
    pb_description: ParagraphStyle::new(Font::Regular, 10.0, 12.0).centered(),

    xs_title: ParagraphStyle::new(Font::Bold, 6.0, 6.0),
    xs_text: ParagraphStyle::new(Font::Regular, 6.0, 6.0),
});

impl StyleSheet {
    /// The built-in style set shared by all layouts.
    pub fn standard() -> &'static StyleSheet {
        &STANDARD
    }
}
