//! The registered layout variants.

use super::cards::{self, CardStyle};
use super::flow::{Flowable, Frame, Paragraph, SeparatorRole};
use super::{ContentArea, INCH, Layout, LayoutError, PageSpec, RenderOptions, render};
use crate::compose::{self, PageSize};
use crate::event::{EventCard, EventRecord};
use std::path::Path;

/// Gap on each side of a column gutter.
const GUTTER: f32 = 6.0;

fn cards_in(style: CardStyle, cards: &[EventCard], options: &RenderOptions) -> Vec<Flowable> {
    cards
        .iter()
        .map(|card| cards::render(card, style, options.styles))
        .collect()
}

/// The lead event of a layout that needs one.
fn lead<'a>(layout: &'static str, cards: &'a [EventCard]) -> Result<&'a EventCard, LayoutError> {
    cards.first().ok_or(LayoutError::NotEnoughEvents {
        layout,
        expected: 1,
        got: 0,
    })
}

fn two_columns(area: &ContentArea, height: f32) -> Vec<Frame> {
    let half = area.width / 2.0;
    vec![
        Frame::new("left", area.left, area.bottom, half - GUTTER, height),
        Frame::new(
            "right",
            area.left + half + GUTTER,
            area.bottom,
            half - GUTTER,
            height,
        ),
    ]
}

pub struct TwoColumnLayout;

impl Layout for TwoColumnLayout {
    fn key(&self) -> &'static str {
        "TwoColumnLayout"
    }

    fn title(&self) -> &'static str {
        "Two Columns (~12 events)"
    }

    fn description(&self) -> &'static str {
        "A simple two-column layout. This is a good fit if you have around 10 events."
    }

    fn frames(&self, area: &ContentArea) -> Vec<Frame> {
        two_columns(area, area.height - 0.4 * INCH)
    }

    fn story(
        &self,
        cards: &[EventCard],
        options: &RenderOptions,
    ) -> Result<Vec<Flowable>, LayoutError> {
        Ok(cards_in(CardStyle::Normal, cards, options))
    }
}

pub struct LargeLayout;

impl Layout for LargeLayout {
    fn key(&self) -> &'static str {
        "LargeLayout"
    }

    fn title(&self) -> &'static str {
        "Large Events (4-5 events)"
    }

    fn description(&self) -> &'static str {
        "A layout that presents a small number of events large and in detail. (3-4 events)"
    }

    fn frames(&self, area: &ContentArea) -> Vec<Frame> {
        vec![Frame::new(
            "large",
            area.left,
            area.bottom,
            area.width - GUTTER,
            area.height,
        )]
    }

    fn story(
        &self,
        cards: &[EventCard],
        options: &RenderOptions,
    ) -> Result<Vec<Flowable>, LayoutError> {
        let mut story = Vec::with_capacity(cards.len() * 2);
        for (i, card) in cards_in(CardStyle::ExtraLarge, cards, options)
            .into_iter()
            .enumerate()
        {
            if i > 0 {
                story.push(cards::separator(SeparatorRole::BetweenCards));
            }
            story.push(card);
        }
        Ok(story)
    }
}

pub struct ThreeColumnLayout;

impl Layout for ThreeColumnLayout {
    fn key(&self) -> &'static str {
        "ThreeColumnLayout"
    }

    fn title(&self) -> &'static str {
        "Three Columns, extra-tiny events (30+ events)"
    }

    fn description(&self) -> &'static str {
        "A three-column layout with extra-tiny events. Useful if you need to pack a lot of them into one flyer."
    }

    fn frames(&self, area: &ContentArea) -> Vec<Frame> {
        let third = area.width / 3.0;
        let width = third - GUTTER;
        vec![
            Frame::new("left", area.left, area.bottom, width, area.height),
            Frame::new(
                "middle",
                area.left + third + GUTTER,
                area.bottom,
                width,
                area.height,
            ),
            Frame::new(
                "right",
                area.left + 2.0 * third + GUTTER,
                area.bottom,
                width,
                area.height,
            ),
        ]
    }

    fn story(
        &self,
        cards: &[EventCard],
        options: &RenderOptions,
    ) -> Result<Vec<Flowable>, LayoutError> {
        Ok(cards_in(CardStyle::ExtraSmall, cards, options))
    }
}

pub struct FeaturedLayout;

impl Layout for FeaturedLayout {
    fn key(&self) -> &'static str {
        "FeaturedLayout"
    }

    fn title(&self) -> &'static str {
        "Feature 1st Event + 2 columns (~10 events)"
    }

    fn description(&self) -> &'static str {
        "One large main event, and 2 columns with further events."
    }

    fn frames(&self, area: &ContentArea) -> Vec<Frame> {
        let columns = 2.0 * area.height / 3.0;
        let mut frames = vec![Frame::new(
            "featured",
            area.left + 0.4 * INCH,
            area.bottom + columns,
            area.width - GUTTER - 0.8 * INCH,
            area.height / 3.0 - 0.4 * INCH,
        )];
        frames.extend(two_columns(area, columns));
        frames
    }

    fn story(
        &self,
        cards: &[EventCard],
        options: &RenderOptions,
    ) -> Result<Vec<Flowable>, LayoutError> {
        let featured = lead(self.key(), cards)?;
        let mut story = vec![
            cards::render(featured, CardStyle::ExtraLarge, options.styles),
            cards::separator(SeparatorRole::SectionEnd),
            Flowable::FrameBreak,
        ];
        story.extend(cards_in(CardStyle::Normal, &cards[1..], options));
        Ok(story)
    }
}

/// Fixed margin on every side of the phonebank sheet.
const PHONEBANK_MARGIN: f32 = 0.5 * INCH;

pub struct PhonebankLayout;

impl Layout for PhonebankLayout {
    fn key(&self) -> &'static str {
        "PhonebankLayout"
    }

    fn title(&self) -> &'static str {
        "Phonebank RSVP Sheet"
    }

    fn description(&self) -> &'static str {
        "RSVP sheet for a phonebank event."
    }

    fn expected_events(&self) -> Option<usize> {
        Some(1)
    }

    fn page_spec(&self, requested: &PageSpec) -> PageSpec {
        PageSpec::uniform(requested.size, PHONEBANK_MARGIN)
    }

    fn frames(&self, area: &ContentArea) -> Vec<Frame> {
        vec![Frame::new(
            "phonebank",
            area.left,
            area.bottom + 3.0 * area.height / 4.0,
            area.width,
            area.height / 4.0,
        )]
    }

    fn story(
        &self,
        cards: &[EventCard],
        options: &RenderOptions,
    ) -> Result<Vec<Flowable>, LayoutError> {
        let event = lead(self.key(), cards)?;
        if cards.len() > 1 {
            log::debug!("{}: using the first of {} events", self.key(), cards.len());
        }
        Ok(vec![
            cards::render(event, CardStyle::Phonebank, options.styles),
            Flowable::FrameBreak,
        ])
    }
}

/// Half-width sheet of three events, printed twice side by side to be cut
/// in half.
pub struct TwoUpLayout;

impl Layout for TwoUpLayout {
    fn key(&self) -> &'static str {
        "TwoUpLayout"
    }

    fn title(&self) -> &'static str {
        "Two-Up Half Sheets (3 events)"
    }

    fn description(&self) -> &'static str {
        "Three events with an RSVP line, printed twice side by side so the sheet can be cut in half."
    }

    fn expected_events(&self) -> Option<usize> {
        Some(3)
    }

    fn page_spec(&self, requested: &PageSpec) -> PageSpec {
        let half = PageSize::new(requested.size.width / 2.0, requested.size.height);
        PageSpec { size: half, ..*requested }
    }

    fn frames(&self, area: &ContentArea) -> Vec<Frame> {
        let left = area.left + GUTTER;
        let width = area.width - GUTTER;
        vec![
            Frame::new("rsvp", left, area.bottom, width, 0.5 * INCH),
            Frame::new("column", left, area.bottom + 0.5 * INCH, width, 3.3 * INCH),
        ]
    }

    fn story(
        &self,
        cards: &[EventCard],
        options: &RenderOptions,
    ) -> Result<Vec<Flowable>, LayoutError> {
        let mut story = vec![
            Flowable::Paragraph(Paragraph::new(
                options.rsvp_line.as_str(),
                options.styles.default,
            )),
            Flowable::FrameBreak,
        ];
        story.extend(cards_in(CardStyle::Normal, cards, options));
        Ok(story)
    }

    fn fill(
        &self,
        destination: &Path,
        spec: &PageSpec,
        events: &[EventRecord],
        options: &RenderOptions,
    ) -> Result<(), LayoutError> {
        let half = self.compose(spec, events, options)?;
        let half = render::to_document(&half, &options.fonts)?;
        let mut sheet = compose::duplicate_side_by_side(&half)?;
        render::save(&mut sheet, destination)
    }
}
