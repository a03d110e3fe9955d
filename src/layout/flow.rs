//! Frame-based flow layout.
//!
//! A layout variant describes a page as a list of [`Frame`]s and a story: an
//! ordered list of [`Flowable`]s. [`compose`] pours the story into the frames
//! top to bottom, moving to the next frame whenever the next flowable does not
//! fit in what is left of the current one. A card stays in one piece unless it
//! is taller than a whole frame; then it is broken at the frame bottom and the
//! rest continues in the next frame.
//!
//! Coordinates are PDF points with the origin at the bottom-left corner of the
//! page. Only one page is produced; whatever does not fit in the last frame is
//! counted in [`ComposedPage::dropped`] and left out.

use super::cards::CardStyle;
use super::fonts::{Font, FontBook, icons};
use super::style::{Align, INCH, ParagraphStyle};
use std::collections::VecDeque;

/// Inner padding applied on every side of a frame.
pub const FRAME_PADDING: f32 = 6.0;

/// Slack for floating point error in fit checks.
const EPSILON: f32 = 0.01;

/// A rectangular region of the page that receives flowing content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub id: &'static str,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Frame {
    pub fn new(id: &'static str, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            id,
            x,
            y,
            width,
            height,
        }
    }

    fn inner_left(&self) -> f32 {
        self.x + FRAME_PADDING
    }

    fn inner_width(&self) -> f32 {
        (self.width - 2.0 * FRAME_PADDING).max(0.0)
    }

    fn inner_top(&self) -> f32 {
        self.y + self.height - FRAME_PADDING
    }

    fn inner_bottom(&self) -> f32 {
        self.y + FRAME_PADDING
    }
}

/// A span of paragraph text in one font.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub text: String,
    pub font: Font,
}

impl Run {
    pub fn new(text: impl Into<String>, font: Font) -> Self {
        Self {
            text: text.into(),
            font,
        }
    }
}

/// Wrapped text. Size, leading and alignment come from the style; each run
/// carries its own face so a line can mix regular and bold.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub runs: Vec<Run>,
    pub style: ParagraphStyle,
}

impl Paragraph {
    pub fn new(text: impl Into<String>, style: ParagraphStyle) -> Self {
        Self {
            runs: vec![Run::new(text, style.font)],
            style,
        }
    }

    pub fn from_runs(runs: Vec<Run>, style: ParagraphStyle) -> Self {
        Self { runs, style }
    }

    /// Rebuild a paragraph from already broken lines.
    fn from_lines(lines: &[Line], style: ParagraphStyle) -> Self {
        let mut runs: Vec<Run> = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            for (j, piece) in line.pieces.iter().enumerate() {
                let mut text = piece.text.clone();
                if i > 0 && j == 0 {
                    text.insert(0, ' ');
                }
                match runs.last_mut() {
                    Some(run) if run.font == piece.font => run.text.push_str(&text),
                    _ => runs.push(Run::new(text, piece.font)),
                }
            }
        }
        Self { runs, style }
    }

    /// Plain text of all runs, for inspection.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    pub(crate) fn lines(&self, fonts: &FontBook, max_width: f32) -> Vec<Line> {
        break_lines(fonts, &self.runs, self.style.size, max_width)
    }
}

/// One row of an icon table: an optional dingbat and a line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct IconRow {
    pub icon: Option<char>,
    pub text: String,
}

/// Two-column table with a narrow icon column, used by extra-small cards.
#[derive(Debug, Clone, PartialEq)]
pub struct IconTable {
    pub rows: Vec<IconRow>,
    pub style: ParagraphStyle,
    pub icon_width: f32,
    pub space_after: f32,
}

/// Why a separator line is in the story.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeparatorRole {
    /// Sits between two consecutive cards.
    BetweenCards,
    /// Closes a section, such as the featured block.
    SectionEnd,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Flowable {
    Paragraph(Paragraph),
    Spacer(f32),
    IconTable(IconTable),
    /// A thin rule with a star in the middle.
    Separator { role: SeparatorRole, width: f32 },
    /// Continue in the next frame.
    FrameBreak,
    /// One event's block, kept together.
    Card {
        style: CardStyle,
        items: Vec<Flowable>,
    },
    /// The remainder of a card broken across frames.
    Continued {
        style: CardStyle,
        items: Vec<Flowable>,
    },
}

/// What a top-level flowable was, as recorded on the composed page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Card(CardStyle),
    Continued(CardStyle),
    Separator(SeparatorRole),
    Paragraph,
    Spacer,
    Table,
}

/// A top-level flowable after placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedBlock {
    pub frame: usize,
    pub kind: BlockKind,
    pub top: f32,
    pub bottom: f32,
}

/// A primitive painting operation in page coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        font: Font,
        size: f32,
        text: String,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        width: f32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComposedPage {
    pub width: f32,
    pub height: f32,
    pub ops: Vec<DrawOp>,
    pub blocks: Vec<PlacedBlock>,
    /// Top-level flowables that did not fit on the page.
    pub dropped: usize,
}

impl ComposedPage {
    pub fn card_count(&self, style: CardStyle) -> usize {
        self.count(BlockKind::Card(style))
    }

    pub fn separator_count(&self, role: SeparatorRole) -> usize {
        self.count(BlockKind::Separator(role))
    }

    fn count(&self, kind: BlockKind) -> usize {
        self.blocks.iter().filter(|b| b.kind == kind).count()
    }
}

/// Height consumed by a flowable, plus the space it wants below it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Extent {
    height: f32,
    trailing: f32,
}

impl Flowable {
    fn kind(&self) -> BlockKind {
        match self {
            Flowable::Paragraph(_) => BlockKind::Paragraph,
            Flowable::Spacer(_) | Flowable::FrameBreak => BlockKind::Spacer,
            Flowable::IconTable(_) => BlockKind::Table,
            Flowable::Separator { role, .. } => BlockKind::Separator(*role),
            Flowable::Card { style, .. } => BlockKind::Card(*style),
            Flowable::Continued { style, .. } => BlockKind::Continued(*style),
        }
    }

    /// Break off the part that fits in `height`, leaving the rest for the
    /// next frame. `None` when nothing fits or the flowable cannot be split.
    fn split(&self, fonts: &FontBook, height: f32, width: f32) -> Option<(Flowable, Flowable)> {
        match self {
            Flowable::Paragraph(p) => {
                if p.style.leading <= 0.0 || height <= 0.0 {
                    return None;
                }
                let lines = p.lines(fonts, width);
                let fit = ((height + EPSILON) / p.style.leading).floor() as usize;
                if fit == 0 || fit >= lines.len() {
                    return None;
                }
                Some((
                    Flowable::Paragraph(Paragraph::from_lines(&lines[..fit], p.style)),
                    Flowable::Paragraph(Paragraph::from_lines(&lines[fit..], p.style)),
                ))
            }
            Flowable::Card { style, items } => {
                let (head, tail) = split_items(fonts, items, height, width)?;
                let style = *style;
                Some((
                    Flowable::Card { style, items: head },
                    Flowable::Continued { style, items: tail },
                ))
            }
            Flowable::Continued { style, items } => {
                let (head, tail) = split_items(fonts, items, height, width)?;
                let style = *style;
                Some((
                    Flowable::Continued { style, items: head },
                    Flowable::Continued { style, items: tail },
                ))
            }
            _ => None,
        }
    }

    /// Lay out with the top-left corner at `(x, top)`, appending paint
    /// operations to `ops`.
    fn lay_out(&self, fonts: &FontBook, x: f32, top: f32, width: f32, ops: &mut Vec<DrawOp>) -> Extent {
        match self {
            Flowable::Paragraph(p) => lay_out_paragraph(fonts, p, x, top, width, ops),
            Flowable::Spacer(height) => Extent {
                height: *height,
                trailing: 0.0,
            },
            Flowable::IconTable(table) => lay_out_table(fonts, table, x, top, width, ops),
            Flowable::Separator { width: rule, .. } => lay_out_separator(*rule, x, top, width, ops),
            Flowable::FrameBreak => Extent::default(),
            Flowable::Card { items, .. } | Flowable::Continued { items, .. } => {
                let mut y = top;
                let mut trailing = 0.0;
                for item in items {
                    y -= trailing;
                    let extent = item.lay_out(fonts, x, y, width, ops);
                    y -= extent.height;
                    trailing = extent.trailing;
                }
                Extent {
                    height: top - y,
                    trailing,
                }
            }
        }
    }
}

/// Split a card's items at `height`: whole items while they fit, then the
/// first part of the item that crosses the line.
fn split_items(
    fonts: &FontBook,
    items: &[Flowable],
    height: f32,
    width: f32,
) -> Option<(Vec<Flowable>, Vec<Flowable>)> {
    let mut scratch = Vec::new();
    let mut used = 0.0;
    let mut trailing = 0.0;
    for (i, item) in items.iter().enumerate() {
        used += trailing;
        let extent = item.lay_out(fonts, 0.0, 0.0, width, &mut scratch);
        if used + extent.height > height + EPSILON {
            let mut head = items[..i].to_vec();
            let mut tail = Vec::with_capacity(items.len() - i);
            match item.split(fonts, height - used, width) {
                Some((first, rest)) => {
                    head.push(first);
                    tail.push(rest);
                }
                None => tail.push(item.clone()),
            }
            tail.extend_from_slice(&items[i + 1..]);
            return (!head.is_empty()).then_some((head, tail));
        }
        used += extent.height;
        trailing = extent.trailing;
    }
    None
}

fn lay_out_paragraph(
    fonts: &FontBook,
    p: &Paragraph,
    x: f32,
    top: f32,
    width: f32,
    ops: &mut Vec<DrawOp>,
) -> Extent {
    let style = p.style;
    let lines = p.lines(fonts, width);
    for (i, line) in lines.iter().enumerate() {
        let baseline = top - style.size - i as f32 * style.leading;
        let mut cursor = match style.align {
            Align::Left => x,
            Align::Center => x + (width - line.width) / 2.0,
        };
        for piece in &line.pieces {
            ops.push(DrawOp::Text {
                x: cursor,
                y: baseline,
                font: piece.font,
                size: style.size,
                text: piece.text.clone(),
            });
            cursor += fonts.text_width(piece.font, &piece.text, style.size);
        }
    }
    Extent {
        height: lines.len() as f32 * style.leading,
        trailing: style.space_after,
    }
}

/// Cell padding of the icon table: left, top, and bottom of the last row.
/// Rows above the last have no bottom padding.
const CELL_PAD_LEFT: f32 = 3.0;
const CELL_PAD_TOP: f32 = 3.0;
const CELL_PAD_BOTTOM: f32 = 3.0;

fn lay_out_table(
    fonts: &FontBook,
    table: &IconTable,
    x: f32,
    top: f32,
    width: f32,
    ops: &mut Vec<DrawOp>,
) -> Extent {
    let style = table.style;
    let text_x = x + table.icon_width + CELL_PAD_LEFT;
    let text_width = (width - table.icon_width - CELL_PAD_LEFT).max(0.0);
    let icon_cell = (table.icon_width - CELL_PAD_LEFT).max(0.0);

    let mut y = top;
    for (i, row) in table.rows.iter().enumerate() {
        let cell_top = y - CELL_PAD_TOP;
        let para = Paragraph::new(row.text.as_str(), style);
        let text = lay_out_paragraph(fonts, &para, text_x, cell_top, text_width, ops);

        let mut content = text.height;
        if let Some(icon) = row.icon {
            let glyph = icon.to_string();
            let glyph_width = Font::Dingbats.text_width(&glyph, style.size);
            ops.push(DrawOp::Text {
                x: x + CELL_PAD_LEFT + (icon_cell - glyph_width) / 2.0,
                y: cell_top - style.size,
                font: Font::Dingbats,
                size: style.size,
                text: glyph,
            });
            content = content.max(style.size);
        }

        let bottom_pad = if i + 1 == table.rows.len() {
            CELL_PAD_BOTTOM
        } else {
            0.0
        };
        y = cell_top - content - bottom_pad;
    }

    Extent {
        height: top - y,
        trailing: table.space_after,
    }
}

const SEPARATOR_HEIGHT: f32 = 0.5 * INCH;
const SEPARATOR_STAR_SIZE: f32 = 11.0;
const SEPARATOR_GAP: f32 = 15.0;
const SEPARATOR_LINE_WIDTH: f32 = 0.25;

fn lay_out_separator(
    rule: f32,
    x: f32,
    top: f32,
    width: f32,
    ops: &mut Vec<DrawOp>,
) -> Extent {
    let rule = rule.min(width);
    let left = x + (width - rule) / 2.0;
    let center = left + rule / 2.0;
    let mid = top - SEPARATOR_HEIGHT / 2.0;

    ops.push(DrawOp::Line {
        from: (left, mid),
        to: (center - SEPARATOR_GAP, mid),
        width: SEPARATOR_LINE_WIDTH,
    });
    let star = icons::STAR.to_string();
    let star_width = Font::Dingbats.text_width(&star, SEPARATOR_STAR_SIZE);
    ops.push(DrawOp::Text {
        x: center - star_width / 2.0,
        y: mid - 4.0,
        font: Font::Dingbats,
        size: SEPARATOR_STAR_SIZE,
        text: star,
    });
    ops.push(DrawOp::Line {
        from: (center + SEPARATOR_GAP, mid),
        to: (left + rule, mid),
        width: SEPARATOR_LINE_WIDTH,
    });

    Extent {
        height: SEPARATOR_HEIGHT,
        trailing: 0.0,
    }
}

/// Where the next flowable goes.
struct Cursor {
    frame: usize,
    top: f32,
    empty: bool,
}

impl Cursor {
    fn start(frames: &[Frame]) -> Self {
        Self {
            frame: 0,
            top: frames.first().map(Frame::inner_top).unwrap_or(0.0),
            empty: true,
        }
    }

    fn advance(&mut self, frames: &[Frame]) {
        self.frame += 1;
        self.top = frames.get(self.frame).map(Frame::inner_top).unwrap_or(0.0);
        self.empty = true;
    }
}

/// Pour `story` into `frames` on a page of `page_size`.
///
/// A flowable that does not fit in the current frame moves to the next one.
/// One taller than an empty frame is broken at the frame bottom and continues
/// in the next frame; if it cannot be broken it is dropped. Nothing is painted
/// outside its frame. A frame break past the last frame sends the rest of the
/// story off the page.
///
/// A [`SeparatorRole::BetweenCards`] separator is kept with the flowable after
/// it, so it never ends up below the last placed card. One with nothing after
/// it, followed by a frame break, or that would open a frame is left out.
pub fn compose(
    fonts: &FontBook,
    page_size: (f32, f32),
    frames: &[Frame],
    story: &[Flowable],
) -> ComposedPage {
    let mut page = ComposedPage {
        width: page_size.0,
        height: page_size.1,
        ops: Vec::new(),
        blocks: Vec::new(),
        dropped: 0,
    };
    let mut cursor = Cursor::start(frames);
    let mut pending: Option<&Flowable> = None;

    for flowable in story {
        match flowable {
            Flowable::FrameBreak => {
                pending = None;
                cursor.advance(frames);
                continue;
            }
            Flowable::Separator {
                role: SeparatorRole::BetweenCards,
                ..
            } => {
                pending = Some(flowable);
                continue;
            }
            _ => {}
        }
        let unit: Vec<&Flowable> = pending.take().into_iter().chain([flowable]).collect();
        place(fonts, &mut page, &mut cursor, frames, &unit);
    }

    page
}

/// Place `unit` as one atomic group.
fn place(
    fonts: &FontBook,
    page: &mut ComposedPage,
    cursor: &mut Cursor,
    frames: &[Frame],
    unit: &[&Flowable],
) {
    let mut unit = unit;
    loop {
        let Some(frame) = frames.get(cursor.frame) else {
            page.dropped += unit.len();
            return;
        };
        if cursor.empty {
            unit = without_opening_separator(unit);
            if unit.is_empty() {
                return;
            }
        }

        let mut ops = Vec::new();
        let mut blocks = Vec::with_capacity(unit.len());
        let mut top = cursor.top;
        let mut trailing = 0.0;
        for flowable in unit {
            top -= trailing;
            let extent =
                flowable.lay_out(fonts, frame.inner_left(), top, frame.inner_width(), &mut ops);
            blocks.push(PlacedBlock {
                frame: cursor.frame,
                kind: flowable.kind(),
                top,
                bottom: top - extent.height,
            });
            top -= extent.height;
            trailing = extent.trailing;
        }

        let available = cursor.top - frame.inner_bottom();
        if cursor.top - top <= available + EPSILON {
            page.ops.append(&mut ops);
            page.blocks.append(&mut blocks);
            cursor.top = top - trailing;
            cursor.empty = false;
            return;
        }
        if !cursor.empty {
            cursor.advance(frames);
            continue;
        }

        // Taller than a whole frame.
        let pieces = unit.iter().map(|f| (*f).clone()).collect();
        flow_across(fonts, page, cursor, frames, pieces);
        return;
    }
}

fn without_opening_separator<'a, 'b>(unit: &'a [&'b Flowable]) -> &'a [&'b Flowable] {
    match unit {
        [
            Flowable::Separator {
                role: SeparatorRole::BetweenCards,
                ..
            },
            rest @ ..,
        ] => rest,
        _ => unit,
    }
}

/// Place `pieces` one at a time from the top of an empty frame, breaking the
/// one that crosses the frame bottom.
fn flow_across(
    fonts: &FontBook,
    page: &mut ComposedPage,
    cursor: &mut Cursor,
    frames: &[Frame],
    pieces: Vec<Flowable>,
) {
    let mut queue: VecDeque<Flowable> = pieces.into();
    while let Some(flowable) = queue.pop_front() {
        let Some(frame) = frames.get(cursor.frame) else {
            page.dropped += 1 + queue.len();
            return;
        };
        let available = cursor.top - frame.inner_bottom();
        let mut ops = Vec::new();
        let extent =
            flowable.lay_out(fonts, frame.inner_left(), cursor.top, frame.inner_width(), &mut ops);
        if extent.height <= available + EPSILON {
            commit(page, cursor, &flowable, extent, ops);
            continue;
        }

        match flowable.split(fonts, available, frame.inner_width()) {
            Some((head, tail)) => {
                let mut ops = Vec::new();
                let extent =
                    head.lay_out(fonts, frame.inner_left(), cursor.top, frame.inner_width(), &mut ops);
                commit(page, cursor, &head, extent, ops);
                cursor.advance(frames);
                queue.push_front(tail);
            }
            None if cursor.empty => {
                log::debug!("dropping a block taller than frame {:?}", frame.id);
                page.dropped += 1;
            }
            None => {
                cursor.advance(frames);
                queue.push_front(flowable);
            }
        }
    }
}

fn commit(
    page: &mut ComposedPage,
    cursor: &mut Cursor,
    flowable: &Flowable,
    extent: Extent,
    mut ops: Vec<DrawOp>,
) {
    page.ops.append(&mut ops);
    page.blocks.push(PlacedBlock {
        frame: cursor.frame,
        kind: flowable.kind(),
        top: cursor.top,
        bottom: cursor.top - extent.height,
    });
    cursor.top -= extent.height + extent.trailing;
    cursor.empty = false;
}

// ============================================================================
// Line breaking
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Piece {
    pub font: Font,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Line {
    pub pieces: Vec<Piece>,
    pub width: f32,
}

impl Line {
    fn push_str(&mut self, font: Font, text: &str, width: f32) {
        match self.pieces.last_mut() {
            Some(last) if last.font == font => last.text.push_str(text),
            _ => self.pieces.push(Piece {
                font,
                text: text.to_string(),
            }),
        }
        self.width += width;
    }

    fn append(&mut self, word: Word, width: f32) {
        for piece in word {
            self.push_str(piece.font, &piece.text, 0.0);
        }
        self.width += width;
    }

    fn last_font(&self) -> Option<Font> {
        self.pieces.last().map(|p| p.font)
    }
}

/// A run of non-space characters, possibly spanning font changes.
type Word = Vec<Piece>;

fn push_char(word: &mut Word, font: Font, c: char) {
    match word.last_mut() {
        Some(last) if last.font == font => last.text.push(c),
        _ => word.push(Piece {
            font,
            text: c.to_string(),
        }),
    }
}

fn word_width(fonts: &FontBook, word: &Word, size: f32) -> f32 {
    word.iter().map(|p| fonts.text_width(p.font, &p.text, size)).sum()
}

/// Split runs into words on ASCII whitespace. Non-breaking spaces stay
/// inside their word.
fn split_words(runs: &[Run]) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current = Word::new();
    for run in runs {
        for c in run.text.chars() {
            if c.is_ascii_whitespace() {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            } else {
                push_char(&mut current, run.font, c);
            }
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Break a word wider than `max_width` into chunks that fit.
fn split_long_word(fonts: &FontBook, word: Word, size: f32, max_width: f32) -> Vec<Word> {
    if word_width(fonts, &word, size) <= max_width + EPSILON {
        return vec![word];
    }
    let mut chunks = Vec::new();
    let mut current = Word::new();
    let mut current_width = 0.0;
    for piece in word {
        for c in piece.text.chars() {
            let w = fonts.char_width(piece.font, c, size);
            if !current.is_empty() && current_width + w > max_width + EPSILON {
                chunks.push(std::mem::take(&mut current));
                current_width = 0.0;
            }
            push_char(&mut current, piece.font, c);
            current_width += w;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Greedy first-fit line breaking.
pub(crate) fn break_lines(
    fonts: &FontBook,
    runs: &[Run],
    size: f32,
    max_width: f32,
) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut line = Line::default();

    for word in split_words(runs) {
        for chunk in split_long_word(fonts, word, size, max_width) {
            let width = word_width(fonts, &chunk, size);
            let Some(space_font) = line.last_font() else {
                line.append(chunk, width);
                continue;
            };
            let space = fonts.text_width(space_font, " ", size);
            if line.width + space + width <= max_width + EPSILON {
                line.push_str(space_font, " ", space);
            } else {
                lines.push(std::mem::take(&mut line));
            }
            line.append(chunk, width);
        }
    }
    if !line.pieces.is_empty() {
        lines.push(line);
    }
    lines
}
