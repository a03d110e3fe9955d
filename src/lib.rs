//! # Flyer Factory
//!
//! Compose event listings into printable flyer PDFs. A designer supplies a
//! background template PDF; the events are laid out in one of a handful of
//! fixed layouts and printed over it.
//!
//! # Architecture
//!
//! ```text
//! events.json ──► EventCard ──► Layout (frames + story) ──► content PDF
//!                                                              │
//! template.pdf ───────────────────────────── overlay ◄─────────┘
//!                                              │
//!                                         flyer PDF ──► pdftoppm ──► preview JPEG
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`event`] | Event records and the display card derived from each |
//! | [`layout`] | Layout catalog: variants, card renderers, flow composition, PDF painting |
//! | [`compose`] | Page geometry, form-XObject overlay, side-by-side duplication |
//! | [`flyer`] | [`FlyerBuilder`](flyer::FlyerBuilder): template + layout + events → flyer |
//! | [`preview`] | Write-once JPEG preview cache on top of the builder |
//! | [`imaging`] | Rasterizer backend trait, `pdftoppm` backend, thumbnail encoding |
//! | [`config`] | `flyer.toml` loading and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Standard-14 Fonts
//!
//! Content pages use Helvetica and ZapfDingbats, which every PDF viewer
//! ships. Nothing is embedded by default, so there are no font files to
//! install and the content pages stay a few kilobytes. Line breaking uses the
//! Adobe AFM widths compiled into [`layout::fonts`]. Helvetica only covers
//! WinAnsi; text outside it is an error unless a TrueType face is configured
//! under `[fonts]`, in which case that face is embedded and measured instead.
//!
//! ## Overlay as a Form XObject
//!
//! The content page is copied into the template document as a form XObject
//! and painted after the template's own content, which is wrapped in `q`/`Q`.
//! The same primitive, painted twice at an offset, produces the two-up sheet.
//!
//! ## Checked Geometry
//!
//! The content page must match the template page size within 0.01pt; a
//! mismatch is a [`FlyerError::GeometryMismatch`](flyer::FlyerError) instead
//! of a silently misaligned flyer.
//!
//! ## Atomic Output
//!
//! Flyers and previews are written to a temp file beside their destination
//! and renamed into place. A failed build leaves any previous file untouched.

pub mod compose;
pub mod config;
pub mod event;
pub mod flyer;
pub mod imaging;
pub mod layout;
pub mod output;
pub mod preview;

#[cfg(test)]
pub(crate) mod test_helpers;
