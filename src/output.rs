//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Layouts
//!
//! ```text
//! 001 Two Columns (~12 events) → TwoColumnLayout
//!     A simple two-column layout. This is a good fit if you have around 10 events.
//! 005 Phonebank RSVP Sheet → PhonebankLayout
//!     RSVP sheet for a phonebank event.
//!     Events: 1
//! ```
//!
//! ## Templates
//!
//! ```text
//! 001 banner
//! 002 rally
//! ```
//!
//! ## Build
//!
//! ```text
//! rally + TwoColumnLayout (12 events) → out/rally.pdf
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::layout::Layout;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

const MAX_DESCRIPTION: usize = 100;

pub fn format_layouts<'a>(layouts: impl IntoIterator<Item = &'a dyn Layout>) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, layout) in layouts.into_iter().enumerate() {
        lines.push(format!(
            "{} {} \u{2192} {}",
            format_index(i + 1),
            layout.title(),
            layout.key()
        ));
        lines.push(format!(
            "{}{}",
            indent(1),
            truncate_desc(layout.description(), MAX_DESCRIPTION)
        ));
        if let Some(n) = layout.expected_events() {
            lines.push(format!("{}Events: {}", indent(1), n));
        }
    }
    lines
}

pub fn print_layouts<'a>(layouts: impl IntoIterator<Item = &'a dyn Layout>) {
    for line in format_layouts(layouts) {
        println!("{}", line);
    }
}

pub fn format_templates(names: &[String], template_dir: &Path) -> Vec<String> {
    if names.is_empty() {
        return vec![format!("No templates in {}", template_dir.display())];
    }
    names
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{} {}", format_index(i + 1), name))
        .collect()
}

pub fn print_templates(names: &[String], template_dir: &Path) {
    for line in format_templates(names, template_dir) {
        println!("{}", line);
    }
}

pub fn format_build(template: &str, layout: &str, events: usize, destination: &Path) -> String {
    let noun = if events == 1 { "event" } else { "events" };
    format!(
        "{} + {} ({} {}) \u{2192} {}",
        template,
        layout,
        events,
        noun,
        destination.display()
    )
}

pub fn print_build(template: &str, layout: &str, events: usize, destination: &Path) {
    println!("{}", format_build(template, layout, events, destination));
}
