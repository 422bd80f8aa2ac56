//! Text label with word wrap.
//!
//! A label has a fixed width; its height follows from the number of lines
//! the text wraps to. Lines are centred horizontally inside the label.

use embedded_graphics::Drawable;
use embedded_graphics::geometry::{Point, Size};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::DrawTarget;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use heapless::{String, Vec};

use super::geometry::Align;
use crate::error::GuiError;

/// Longest label text.
pub const MAX_LABEL_LEN: usize = 64;

/// Most lines a label wraps to; further text is dropped.
pub const MAX_LABEL_LINES: usize = 8;

// =============================================================================
// Fonts
// =============================================================================

/// ProFont sizes available to labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LabelFont {
    Pt9,
    Pt12,
    Pt14,
    Pt18,
    Pt24,
}

impl LabelFont {
    /// The mono font for this size.
    pub fn mono(self) -> &'static MonoFont<'static> {
        match self {
            Self::Pt9 => &profont::PROFONT_9_POINT,
            Self::Pt12 => &profont::PROFONT_12_POINT,
            Self::Pt14 => &profont::PROFONT_14_POINT,
            Self::Pt18 => &profont::PROFONT_18_POINT,
            Self::Pt24 => &profont::PROFONT_24_POINT,
        }
    }

    /// Horizontal advance of one character.
    fn advance(self) -> u32 {
        let font = self.mono();
        font.character_size.width + font.character_spacing
    }

    /// Height of one text line.
    fn line_height(self) -> u32 { self.mono().character_size.height }
}

// =============================================================================
// Wrapping
// =============================================================================

/// Break `text` into lines of at most `max_chars` characters.
///
/// Breaks at spaces; words longer than a line are split. Explicit newlines
/// always start a new line.
pub fn wrap_lines(
    text: &str,
    max_chars: usize,
) -> Vec<&str, MAX_LABEL_LINES> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    'paragraphs: for paragraph in text.split('\n') {
        let mut rest = paragraph.trim_start_matches(' ');
        if rest.is_empty() && lines.push("").is_err() {
            break;
        }
        while !rest.is_empty() {
            let line = take_line(rest, max_chars);
            if lines.push(line.trim_end_matches(' ')).is_err() {
                break 'paragraphs;
            }
            rest = rest[line.len()..].trim_start_matches(' ');
        }
    }
    lines
}

/// Longest prefix of `text` that fits `max_chars` and ends at a word
/// boundary, or a hard split when the first word alone is too long.
fn take_line(
    text: &str,
    max_chars: usize,
) -> &str {
    if text.chars().count() <= max_chars {
        return text;
    }
    let hard_end = text.char_indices().nth(max_chars).map_or(text.len(), |(i, _)| i);
    if text[hard_end..].starts_with(' ') {
        return &text[..hard_end];
    }
    // Break at the last space that keeps the line within bounds
    match text[..hard_end].rfind(' ') {
        Some(space) if space > 0 => &text[..space],
        _ => &text[..hard_end],
    }
}

// =============================================================================
// Label
// =============================================================================

/// Declarative description of a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelSpec<'a> {
    pub text: &'a str,
    pub align: Align,
    pub offset: Point,
    /// Fixed width; text wraps to it.
    pub width: u32,
    pub font: LabelFont,
    pub color: Rgb565,
}

/// A placed label.
#[derive(Debug, Clone)]
pub struct Label {
    text: String<MAX_LABEL_LEN>,
    align: Align,
    offset: Point,
    width: u32,
    font: LabelFont,
    color: Rgb565,
    bounds: Rectangle,
}

impl Label {
    /// Create and lay out a label inside `parent`.
    pub fn new(
        spec: &LabelSpec<'_>,
        parent: &Rectangle,
    ) -> Result<Self, GuiError> {
        let mut label = Self {
            text: String::new(),
            align: spec.align,
            offset: spec.offset,
            width: spec.width,
            font: spec.font,
            color: spec.color,
            bounds: Rectangle::zero(),
        };
        label.set_text(spec.text, parent)?;
        Ok(label)
    }

    /// Screen area covered by the label.
    #[inline]
    pub fn bounds(&self) -> Rectangle { self.bounds }

    #[inline]
    pub fn text(&self) -> &str { &self.text }

    /// Replace the text and lay the label out again.
    pub fn set_text(
        &mut self,
        text: &str,
        parent: &Rectangle,
    ) -> Result<(), GuiError> {
        let mut new_text = String::new();
        new_text.push_str(text).map_err(|_| GuiError::Capacity)?;
        self.text = new_text;

        let lines = wrap_lines(&self.text, self.chars_per_line()).len() as u32;
        let size = Size::new(self.width, lines * self.font.line_height());
        self.bounds = self.align.resolve(parent, size, self.offset);
        Ok(())
    }

    fn chars_per_line(&self) -> usize { (self.width / self.font.advance().max(1)) as usize }

    /// Draw the wrapped, centred text.
    pub fn draw<D>(
        &self,
        display: &mut D,
    ) where
        D: DrawTarget<Color = Rgb565>,
    {
        let char_style = MonoTextStyle::new(self.font.mono(), self.color);
        let text_style = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Top)
            .build();
        let center_x = self.bounds.top_left.x + self.width as i32 / 2;
        let line_height = self.font.line_height() as i32;

        for (i, line) in wrap_lines(&self.text, self.chars_per_line()).iter().enumerate() {
            let y = self.bounds.top_left.y + i as i32 * line_height;
            Text::with_text_style(line, Point::new(center_x, y), char_style, text_style)
                .draw(display)
                .ok();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use embedded_graphics::prelude::RgbColor;

    use super::*;

    #[test]
    fn test_wrap_at_spaces() {
        let lines = wrap_lines("the quick brown fox", 10);
        assert_eq!(lines.as_slice(), &["the quick", "brown fox"]);
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let lines = wrap_lines("abcdefghij", 4);
        assert_eq!(lines.as_slice(), &["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_keeps_short_text() {
        assert_eq!(wrap_lines("LOOP", 12).as_slice(), &["LOOP"]);
        assert_eq!(wrap_lines("a\nb", 12).as_slice(), &["a", "b"]);
    }

    #[test]
    fn test_wrap_drops_excess_lines() {
        let text = "a b c d e f g h i j";
        assert_eq!(wrap_lines(text, 1).len(), MAX_LABEL_LINES);
    }

    #[test]
    fn test_label_layout() {
        let screen = Rectangle::new(Point::zero(), Size::new(1280, 720));
        let spec = LabelSpec {
            text: "LOOP",
            align: Align::BottomMid,
            offset: Point::new(0, -40),
            width: 150,
            font: LabelFont::Pt18,
            color: Rgb565::BLACK,
        };
        let label = Label::new(&spec, &screen).expect("label");
        let line = LabelFont::Pt18.line_height();
        assert_eq!(label.bounds().size, Size::new(150, line));
        assert_eq!(label.bounds().top_left, Point::new(565, 720 - line as i32 - 40));
    }

    #[test]
    fn test_text_too_long() {
        let screen = Rectangle::new(Point::zero(), Size::new(320, 240));
        let long = [b'x'; MAX_LABEL_LEN + 1];
        let spec = LabelSpec {
            text: core::str::from_utf8(&long).expect("ascii"),
            align: Align::Center,
            offset: Point::zero(),
            width: 100,
            font: LabelFont::Pt12,
            color: Rgb565::BLACK,
        };
        assert_eq!(Label::new(&spec, &screen).err(), Some(GuiError::Capacity));
    }
}
