//! Layout catalog: named strategies for arranging event cards on a page.
//!
//! A layout variant is a [`Layout`] implementation that contributes two
//! things: the [`Frame`]s its page is divided into, and the story (a list of
//! [`Flowable`]s built from event cards) poured into them. Everything else is
//! shared: card construction, flow composition, and painting the result into
//! a one-page PDF all happen in the trait's provided methods.
//!
//! ## Variants
//!
//! | Key | Frames | Cards |
//! |---|---|---|
//! | `TwoColumnLayout` | two columns | normal |
//! | `LargeLayout` | one full-width column | extra-large, star separators between |
//! | `ThreeColumnLayout` | three columns | extra-small |
//! | `FeaturedLayout` | top-third feature over two columns | first extra-large, rest normal |
//! | `PhonebankLayout` | top quarter, fixed 0.5in margins | one phonebank card |
//! | `TwoUpLayout` | half-width page, painted twice | RSVP line and normal cards |
//!
//! The registry is a static table; [`layouts`] iterates it in declaration
//! order and [`find_layout`] looks a variant up by key.
//!
//! ## Page geometry
//!
//! A [`PageSpec`] carries the page size, the space reserved at the top and
//! bottom, and the side margins. The content area is what remains:
//!
//! ```text
//! +----------------------------+
//! |         top_space          |
//! |   +--------------------+   |
//! | m |    content area    | m |
//! |   +--------------------+   |
//! |        bottom_space        |
//! +----------------------------+
//! ```

pub mod cards;
pub mod flow;
pub mod fonts;
pub mod render;
pub mod style;
mod variants;

pub use cards::CardStyle;
pub use flow::{ComposedPage, Flowable, Frame, SeparatorRole};
pub use fonts::{Font, FontBook, FontError, TrueTypeFont};
pub use style::{INCH, StyleSheet};
pub use variants::{
    FeaturedLayout, LargeLayout, PhonebankLayout, ThreeColumnLayout, TwoColumnLayout,
    TwoUpLayout,
};

use crate::compose::{ComposeError, PageSize};
use crate::event::{EventCard, EventRecord};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Event is missing required field `{field}`")]
    MissingField { field: &'static str },
    #[error("Invalid start_dt `{value}` (expected YYYY-MM-DD HH:MM:SS)")]
    InvalidDate { value: String },
    #[error("{layout} needs at least {expected} event(s), got {got}")]
    NotEnoughEvents {
        layout: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Compose error: {0}")]
    Compose(#[from] ComposeError),
    #[error("Character {ch:?} cannot be drawn with {font}; configure a TrueType font under [fonts]")]
    UnsupportedCharacter { ch: char, font: String },
}

/// Default side and bottom margin.
pub const DEFAULT_MARGIN: f32 = 0.5 * INCH;

/// Page size plus the space around the content area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSpec {
    pub size: PageSize,
    pub top_space: f32,
    pub bottom_space: f32,
    /// Left and right margin.
    pub margins: f32,
}

impl PageSpec {
    pub fn new(size: PageSize, top_space: f32, bottom_space: f32, margins: f32) -> Self {
        Self {
            size,
            top_space,
            bottom_space,
            margins,
        }
    }

    /// The same margin on every side.
    pub fn uniform(size: PageSize, margin: f32) -> Self {
        Self::new(size, margin, margin, margin)
    }

    pub fn content_area(&self) -> ContentArea {
        ContentArea {
            left: self.margins,
            bottom: self.bottom_space,
            width: (self.size.width - 2.0 * self.margins).max(0.0),
            height: (self.size.height - self.top_space - self.bottom_space).max(0.0),
        }
    }
}

/// The rectangle left for frames once margins are taken off.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentArea {
    pub left: f32,
    pub bottom: f32,
    pub width: f32,
    pub height: f32,
}

/// Per-call rendering inputs that are not events.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub styles: &'static StyleSheet,
    /// Fonts used to measure and draw text.
    pub fonts: FontBook,
    /// Instruction line printed under each half of a two-up sheet.
    pub rsvp_line: String,
}

pub const DEFAULT_RSVP_LINE: &str = "Please RSVP at map.berniesanders.com";

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            styles: StyleSheet::standard(),
            fonts: FontBook::default(),
            rsvp_line: DEFAULT_RSVP_LINE.to_string(),
        }
    }
}

/// A named arrangement of event cards on a page.
pub trait Layout: Sync {
    /// Registry key, e.g. `TwoColumnLayout`.
    fn key(&self) -> &'static str;

    /// Human-readable name for selection lists.
    fn title(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Number of events the variant is designed for, if fixed.
    fn expected_events(&self) -> Option<usize> {
        None
    }

    /// Geometry actually used for the requested page. Most variants take the
    /// caller's spec as is.
    fn page_spec(&self, requested: &PageSpec) -> PageSpec {
        *requested
    }

    /// Frames in fill order.
    fn frames(&self, area: &ContentArea) -> Vec<Frame>;

    fn story(
        &self,
        cards: &[EventCard],
        options: &RenderOptions,
    ) -> Result<Vec<Flowable>, LayoutError>;

    /// Lay the events out without writing anything.
    fn compose(
        &self,
        spec: &PageSpec,
        events: &[EventRecord],
        options: &RenderOptions,
    ) -> Result<ComposedPage, LayoutError> {
        let cards = EventCard::from_records(events)?;
        let spec = self.page_spec(spec);
        let frames = self.frames(&spec.content_area());
        let story = self.story(&cards, options)?;
        let page = flow::compose(
            &options.fonts,
            (spec.size.width, spec.size.height),
            &frames,
            &story,
        );
        if page.dropped > 0 {
            log::debug!(
                "{}: {} of {} block(s) did not fit on the page",
                self.key(),
                page.dropped,
                story.len()
            );
        }
        Ok(page)
    }

    /// Write a one-page PDF of the events to `destination`.
    fn fill(
        &self,
        destination: &Path,
        spec: &PageSpec,
        events: &[EventRecord],
        options: &RenderOptions,
    ) -> Result<(), LayoutError> {
        let page = self.compose(spec, events, options)?;
        let mut doc = render::to_document(&page, &options.fonts)?;
        render::save(&mut doc, destination)
    }
}

impl std::fmt::Debug for dyn Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layout").field("key", &self.key()).finish()
    }
}

static LAYOUTS: [&dyn Layout; 6] = [
    &TwoColumnLayout,
    &LargeLayout,
    &ThreeColumnLayout,
    &FeaturedLayout,
    &PhonebankLayout,
    &TwoUpLayout,
];

static REGISTRY: LazyLock<BTreeMap<&'static str, &'static dyn Layout>> =
    LazyLock::new(|| LAYOUTS.iter().map(|layout| (layout.key(), *layout)).collect());

/// Every registered variant, in declaration order.
pub fn layouts() -> impl Iterator<Item = &'static dyn Layout> {
    LAYOUTS.iter().copied()
}

pub fn find_layout(key: &str) -> Option<&'static dyn Layout> {
    REGISTRY.get(key).copied()
}
