//! Event records and the card view derived from them.
//!
//! An [`EventRecord`] is what the event source hands us: a loose mapping with
//! every field optional, deserialized straight from JSON. Renderers never read
//! records directly. They work from an [`EventCard`], which is built once per
//! render call and holds the display strings every card style shares:
//!
//! | Card field | Derived from |
//! |---|---|
//! | `time` | `start_dt` as `MM/D/YYYY, h:mma` + `timezone` |
//! | `description` | `description`, tags stripped, HTML entities decoded |
//! | `first_sentence` | `description` up to the first `.`, `:` or `;` |
//! | `place` | `"{venue_addr1}, {venue_city}"`, empty if either is blank |
//!
//! Required fields are checked when the card is built; a missing one is a
//! [`LayoutError::MissingField`] for the whole render call.

use crate::layout::LayoutError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Format of `start_dt` as supplied by the event source.
const START_DT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Display format for event times, e.g. `09/8/2015, 12:00pm`.
const TIME_DISPLAY_FORMAT: &str = "%m/%-d/%Y, %-I:%M%P";

/// One event as supplied by the event source.
///
/// Unknown keys (`venue_zip`, ids, urls...) are ignored so records can be
/// passed through from upstream feeds untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventRecord {
    pub name: Option<String>,
    pub start_dt: Option<String>,
    pub timezone: Option<String>,
    pub description: Option<String>,
    pub venue_name: Option<String>,
    pub venue_addr1: Option<String>,
    pub venue_city: Option<String>,
}

impl EventRecord {
    /// The stand-in event used to render previews.
    pub fn placeholder() -> Self {
        Self {
            name: Some("Placeholder Event for Flyer Factory".into()),
            start_dt: Some("2015-09-08 12:00:00".into()),
            timezone: Some("PDT".into()),
            description: Some(
                "Fremont neighbors are hosting a volunteer from the&nbsp;county organizing \
                 committee to learn more about caucusing in 2016.&nbsp; She will explain how \
                 the caucus works in Washington and how we can get involved before \
                 November!  ..."
                    .into(),
            ),
            venue_name: Some("A venue somewhere".into()),
            venue_addr1: Some("1234 Somestreet NW".into()),
            venue_city: Some("Seattle".into()),
        }
    }
}

/// Display projection of an [`EventRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct EventCard {
    pub name: String,
    pub time: String,
    pub description: String,
    pub first_sentence: String,
    pub venue_name: String,
    pub place: String,
}

impl EventCard {
    pub fn from_record(record: &EventRecord) -> Result<Self, LayoutError> {
        let name = required(&record.name, "name")?;
        let start_dt = required(&record.start_dt, "start_dt")?;
        let timezone = required(&record.timezone, "timezone")?;
        let raw_description = required(&record.description, "description")?;
        let venue_name = required(&record.venue_name, "venue_name")?;

        let description = clean_description(raw_description);
        let first_sentence = first_sentence(&description).to_string();

        Ok(Self {
            name: name.to_string(),
            time: format_time(start_dt, timezone)?,
            first_sentence,
            description,
            venue_name: venue_name.to_string(),
            place: format_place(record.venue_addr1.as_deref(), record.venue_city.as_deref()),
        })
    }

    /// Build cards for every record, failing on the first malformed one.
    pub fn from_records(records: &[EventRecord]) -> Result<Vec<Self>, LayoutError> {
        records.iter().map(Self::from_record).collect()
    }
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, LayoutError> {
    value.as_deref().ok_or(LayoutError::MissingField { field })
}

/// Format `start_dt` plus the timezone label for display.
pub fn format_time(start_dt: &str, timezone: &str) -> Result<String, LayoutError> {
    let parsed = NaiveDateTime::parse_from_str(start_dt.trim(), START_DT_FORMAT).map_err(|_| {
        LayoutError::InvalidDate {
            value: start_dt.to_string(),
        }
    })?;
    Ok(format!("{} {}", parsed.format(TIME_DISPLAY_FORMAT), timezone))
}

/// `"addr, city"` when both parts are non-blank, otherwise empty.
pub fn format_place(addr: Option<&str>, city: Option<&str>) -> String {
    match (addr.map(str::trim), city.map(str::trim)) {
        (Some(addr), Some(city)) if !addr.is_empty() && !city.is_empty() => {
            format!("{addr}, {city}")
        }
        _ => String::new(),
    }
}

/// Text up to and including the first `.`, `:` or `;`.
///
/// At least one other character must come before the delimiter; a
/// description that starts with one, or has none, yields `""`. This is plain
/// truncation, so "Dr. Smith" stops at "Dr.".
pub fn first_sentence(description: &str) -> &str {
    match description.find(['.', ':', ';']) {
        Some(0) | None => "",
        Some(idx) => &description[..=idx],
    }
}

/// Strip markup tags, then decode HTML entities.
///
/// Tags go first so that an escaped `&lt;` in the source survives as a
/// literal `<` in the output. A `<` only opens a tag when a letter or `/`
/// follows it, so "5 < 12" is kept as text.
pub fn clean_description(raw: &str) -> String {
    let mut text = String::with_capacity(raw.len());
    let mut in_tag = false;
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '<' if !in_tag
                && chars
                    .peek()
                    .is_some_and(|next| next.is_ascii_alphabetic() || *next == '/') =>
            {
                in_tag = true
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    html_escape::decode_html_entities(&text).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> EventRecord {
        EventRecord {
            name: Some("Canvass kickoff".into()),
            start_dt: Some("2015-09-08 18:30:00".into()),
            timezone: Some("PDT".into()),
            description: Some("Meet at the park. Bring water.".into()),
            venue_name: Some("Gas Works Park".into()),
            venue_addr1: Some("1234 Main St".into()),
            venue_city: Some("Seattle".into()),
        }
    }

    #[test]
    fn first_sentence_stops_at_period() {
        assert_eq!(first_sentence("Hello world. More text here."), "Hello world.");
    }

    #[test]
    fn first_sentence_without_delimiter_is_empty() {
        assert_eq!(first_sentence("No punctuation at all"), "");
    }

    #[test]
    fn first_sentence_stops_at_colon_or_semicolon() {
        assert_eq!(first_sentence("Agenda: talks, food."), "Agenda:");
        assert_eq!(first_sentence("First part; second part."), "First part;");
    }

    #[test]
    fn first_sentence_truncates_abbreviations() {
        assert_eq!(first_sentence("Dr. Smith will speak."), "Dr.");
    }

    #[test]
    fn first_sentence_leading_delimiter_is_empty() {
        assert_eq!(first_sentence(".hidden"), "");
    }

    #[test]
    fn place_joins_address_and_city() {
        assert_eq!(
            format_place(Some("1234 Main St"), Some("Seattle")),
            "1234 Main St, Seattle"
        );
    }

    #[test]
    fn place_trims_parts() {
        assert_eq!(
            format_place(Some("  1234 Main St "), Some(" Seattle")),
            "1234 Main St, Seattle"
        );
    }

    #[test]
    fn place_empty_when_either_part_blank() {
        assert_eq!(format_place(Some(""), Some("Seattle")), "");
        assert_eq!(format_place(Some("1234 Main St"), Some("   ")), "");
        assert_eq!(format_place(None, Some("Seattle")), "");
        assert_eq!(format_place(Some("1234 Main St"), None), "");
    }

    #[test]
    fn time_uses_short_display_format() {
        assert_eq!(
            format_time("2015-09-08 12:00:00", "PDT").unwrap(),
            "09/8/2015, 12:00pm PDT"
        );
        assert_eq!(
            format_time("2016-01-23 09:05:00", "EST").unwrap(),
            "01/23/2016, 9:05am EST"
        );
    }

    #[test]
    fn time_rejects_malformed_dates() {
        let err = format_time("next tuesday", "PDT").unwrap_err();
        assert!(matches!(err, LayoutError::InvalidDate { value } if value == "next tuesday"));
    }

    #[test]
    fn description_is_unescaped() {
        assert_eq!(
            clean_description("Tom &amp; Jerry&nbsp;show"),
            "Tom & Jerry\u{a0}show"
        );
    }

    #[test]
    fn description_tags_are_stripped_before_unescaping() {
        assert_eq!(
            clean_description("<b>Bold</b> &lt;not a tag&gt;"),
            "Bold <not a tag>"
        );
    }

    #[test]
    fn bare_angle_brackets_are_text() {
        assert_eq!(
            clean_description("Ages 5 < 12 welcome, <i>bring</i> a > 0 snacks"),
            "Ages 5 < 12 welcome, bring a > 0 snacks"
        );
        assert_eq!(clean_description("a <3 b"), "a <3 b");
    }

    #[test]
    fn card_from_complete_record() {
        let card = EventCard::from_record(&record()).unwrap();
        assert_eq!(card.name, "Canvass kickoff");
        assert_eq!(card.time, "09/8/2015, 6:30pm PDT");
        assert_eq!(card.first_sentence, "Meet at the park.");
        assert_eq!(card.place, "1234 Main St, Seattle");
        assert_eq!(card.venue_name, "Gas Works Park");
    }

    #[test]
    fn card_without_address_has_empty_place() {
        let mut rec = record();
        rec.venue_addr1 = None;
        let card = EventCard::from_record(&rec).unwrap();
        assert_eq!(card.place, "");
    }

    #[test]
    fn card_missing_required_field_errors() {
        let mut rec = record();
        rec.venue_name = None;
        let err = EventCard::from_record(&rec).unwrap_err();
        assert!(matches!(err, LayoutError::MissingField { field: "venue_name" }));
    }

    #[test]
    fn from_records_fails_on_first_bad_record() {
        let mut bad = record();
        bad.name = None;
        let err = EventCard::from_records(&[record(), bad]).unwrap_err();
        assert!(matches!(err, LayoutError::MissingField { field: "name" }));
    }

    #[test]
    fn record_ignores_unknown_json_fields() {
        let rec: EventRecord = serde_json::from_str(
            r#"{"name": "A", "venue_zip": "98109", "start_dt": "2015-09-08 12:00:00"}"#,
        )
        .unwrap();
        assert_eq!(rec.name.as_deref(), Some("A"));
        assert_eq!(rec.venue_city, None);
    }

    #[test]
    fn placeholder_builds_a_card() {
        let card = EventCard::from_record(&EventRecord::placeholder()).unwrap();
        assert_eq!(card.place, "1234 Somestreet NW, Seattle");
        assert!(card.first_sentence.ends_with('.'));
    }
}
