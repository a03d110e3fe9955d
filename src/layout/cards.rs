//! Card renderers: one pure function per [`CardStyle`].
//!
//! Every renderer takes a shared [`EventCard`] and returns a single
//! [`Flowable::Card`], which the flow engine keeps in one frame unless it is
//! taller than the frame itself.

use super::flow::{Flowable, IconRow, IconTable, Paragraph, Run, SeparatorRole};
use super::fonts::{Font, icons};
use super::style::{INCH, ParagraphStyle, StyleSheet};
use crate::event::EventCard;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardStyle {
    /// Title, time, venue, place and the first sentence; fits a half-page column.
    Normal,
    /// Title over a compact icon table, for three narrow columns.
    ExtraSmall,
    /// Centered, with the full description.
    ExtraLarge,
    /// Extra-large proportions scaled up for a single-event RSVP sheet.
    Phonebank,
}

/// Width of the separator rule between large cards.
const SEPARATOR_WIDTH: f32 = 3.0 * INCH;

pub fn render(card: &EventCard, style: CardStyle, styles: &StyleSheet) -> Flowable {
    match style {
        CardStyle::Normal => render_normal(card, styles),
        CardStyle::ExtraSmall => render_extra_small(card, styles),
        CardStyle::ExtraLarge => render_large(
            card,
            style,
            LargeStyles {
                title: styles.xl_title,
                venue: styles.xl_venue,
                address: styles.xl_address,
                description: styles.xl_description,
            },
        ),
        CardStyle::Phonebank => render_large(
            card,
            style,
            LargeStyles {
                title: styles.pb_title,
                venue: styles.pb_venue,
                address: styles.pb_address,
                description: styles.pb_description,
            },
        ),
    }
}

/// A separator rule sized for large cards.
pub fn separator(role: SeparatorRole) -> Flowable {
    Flowable::Separator {
        role,
        width: SEPARATOR_WIDTH,
    }
}

fn render_normal(card: &EventCard, styles: &StyleSheet) -> Flowable {
    Flowable::Card {
        style: CardStyle::Normal,
        items: vec![
            Flowable::Paragraph(Paragraph::new(card.name.as_str(), styles.event_title)),
            Flowable::Spacer(3.0),
            Flowable::Paragraph(Paragraph::new(card.time.as_str(), styles.event_time)),
            Flowable::Paragraph(Paragraph::new(card.venue_name.as_str(), styles.small)),
            Flowable::Paragraph(Paragraph::new(card.place.as_str(), styles.small)),
            Flowable::Spacer(3.0),
            Flowable::Paragraph(Paragraph::new(
                card.first_sentence.as_str(),
                styles.event_description,
            )),
        ],
    }
}

fn render_extra_small(card: &EventCard, styles: &StyleSheet) -> Flowable {
    let table = IconTable {
        rows: vec![
            IconRow {
                icon: Some(icons::CLOCK),
                text: card.time.clone(),
            },
            IconRow {
                icon: Some(icons::PIN),
                text: card.venue_name.clone(),
            },
            IconRow {
                icon: None,
                text: card.place.clone(),
            },
        ],
        style: styles.xs_text,
        icon_width: 8.0,
        space_after: 8.0,
    };
    Flowable::Card {
        style: CardStyle::ExtraSmall,
        items: vec![
            Flowable::Paragraph(Paragraph::new(card.name.as_str(), styles.xs_title)),
            Flowable::IconTable(table),
        ],
    }
}

struct LargeStyles {
    title: ParagraphStyle,
    venue: ParagraphStyle,
    address: ParagraphStyle,
    description: ParagraphStyle,
}

fn render_large(card: &EventCard, style: CardStyle, s: LargeStyles) -> Flowable {
    // "time, <b>venue</b>" in a bold style, so the whole line is bold.
    let venue_line = Paragraph::from_runs(
        vec![
            Run::new(format!("{}, ", card.time), s.venue.font),
            Run::new(card.venue_name.as_str(), Font::Bold),
        ],
        s.venue,
    );

    let mut items = vec![
        Flowable::Paragraph(Paragraph::new(card.name.as_str(), s.title)),
        Flowable::Paragraph(venue_line),
    ];
    if !card.place.is_empty() {
        items.push(Flowable::Paragraph(Paragraph::new(card.place.as_str(), s.address)));
    }
    items.push(Flowable::Paragraph(Paragraph::new(
        card.description.as_str(),
        s.description,
    )));

    Flowable::Card { style, items }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(place: &str) -> EventCard {
        EventCard {
            name: "Phonebank for the primary".into(),
            time: "09/8/2015, 12:00pm PDT".into(),
            description: "Call voters. Snacks provided.".into(),
            first_sentence: "Call voters.".into(),
            venue_name: "Campaign office".into(),
            place: place.into(),
        }
    }

    fn paragraphs(flowable: &Flowable) -> Vec<String> {
        let Flowable::Card { items, .. } = flowable else {
            panic!("renderers must return a card");
        };
        items
            .iter()
            .filter_map(|item| match item {
                Flowable::Paragraph(p) => Some(p.text()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn normal_card_shows_first_sentence_only() {
        let f = render(&card("1 Main St, Seattle"), CardStyle::Normal, StyleSheet::standard());
        assert_eq!(
            paragraphs(&f),
            vec![
                "Phonebank for the primary",
                "09/8/2015, 12:00pm PDT",
                "Campaign office",
                "1 Main St, Seattle",
                "Call voters.",
            ]
        );
    }

    #[test]
    fn large_card_shows_full_description() {
        let f = render(&card("1 Main St, Seattle"), CardStyle::ExtraLarge, StyleSheet::standard());
        let texts = paragraphs(&f);
        assert_eq!(texts[1], "09/8/2015, 12:00pm PDT, Campaign office");
        assert_eq!(texts.last().map(String::as_str), Some("Call voters. Snacks provided."));
    }

    #[test]
    fn large_card_omits_empty_place() {
        let with = paragraphs(&render(&card("1 Main St, Seattle"), CardStyle::ExtraLarge, StyleSheet::standard()));
        let without = paragraphs(&render(&card(""), CardStyle::ExtraLarge, StyleSheet::standard()));
        assert_eq!(with.len(), without.len() + 1);
    }

    #[test]
    fn time_and_venue_line_is_all_bold() {
        for style in [CardStyle::ExtraLarge, CardStyle::Phonebank] {
            let Flowable::Card { items, .. } = render(&card(""), style, StyleSheet::standard())
            else {
                panic!("expected card");
            };
            let Flowable::Paragraph(venue) = &items[1] else {
                panic!("expected venue paragraph");
            };
            assert!(venue.runs.iter().all(|r| r.font == Font::Bold), "{style:?}");
        }
    }

    #[test]
    fn venue_name_is_bold_in_large_cards() {
        let Flowable::Card { items, .. } =
            render(&card(""), CardStyle::Phonebank, StyleSheet::standard())
        else {
            panic!("expected card");
        };
        let Flowable::Paragraph(venue) = &items[1] else {
            panic!("expected venue paragraph");
        };
        assert_eq!(venue.runs[1].font, Font::Bold);
        assert_eq!(venue.style.size, StyleSheet::standard().pb_venue.size);
    }

    #[test]
    fn extra_small_card_uses_icon_table() {
        let Flowable::Card { style, items } =
            render(&card("1 Main St, Seattle"), CardStyle::ExtraSmall, StyleSheet::standard())
        else {
            panic!("expected card");
        };
        assert_eq!(style, CardStyle::ExtraSmall);
        let Flowable::IconTable(table) = &items[1] else {
            panic!("expected icon table");
        };
        let marks: Vec<Option<char>> = table.rows.iter().map(|r| r.icon).collect();
        assert_eq!(marks, vec![Some(icons::CLOCK), Some(icons::PIN), None]);
        assert_eq!(table.rows[2].text, "1 Main St, Seattle");
    }
}
