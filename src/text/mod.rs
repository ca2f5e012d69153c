//! # Text Shaping
//!
//! The layout engine never measures glyphs itself. It asks a [`TextShaper`]
//! for pre-broken lines, a bounding box and a line height, and stores the
//! lines on the layout tree so the renderer draws exactly what was measured.
//!
//! A shaper must be a pure function of `(content, font_size, max_width)`.
//! The intrinsic pass and the final pass both call it, and a renderer may
//! call it again; identical inputs must give identical line breaks.
//!
//! [`FallbackShaper`] approximates advances from character classes and is
//! used when no font-backed shaper is supplied. It is deterministic but
//! only roughly matches real glyph widths.

pub mod bidi;

use unicode_linebreak::{linebreaks, BreakOpportunity};
use unicode_width::UnicodeWidthChar;

use crate::geometry::Size;

/// Lines that sit exactly on the width limit are kept together even when
/// float addition lands a hair above it.
const BREAK_EPSILON: f32 = 0.01;

/// The result of shaping a run of text.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedText {
    /// Lines in visual order, trailing whitespace removed.
    pub lines: Vec<String>,
    /// Widest line by total height (line count × line height).
    pub size: Size,
    pub line_height: f32,
}

/// Strategy for measuring and line-breaking text.
pub trait TextShaper {
    /// Break `content` into lines no wider than `max_width` (unbounded when
    /// `None`) and measure them.
    fn shape(&self, content: &str, font_size: f32, max_width: Option<f32>) -> ShapedText;

    /// Width of the widest unbreakable token.
    fn min_content_width(&self, content: &str, font_size: f32) -> f32 {
        content
            .split_whitespace()
            .map(|word| self.shape(word, font_size, None).size.width)
            .fold(0.0f32, f32::max)
    }
}

/// A line of text after line-breaking.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokenLine {
    pub text: String,
    /// Advance sum, excluding trailing whitespace.
    pub width: f32,
}

fn is_newline(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Compute UAX#14 break opportunities indexed by char position.
///
/// Each entry is the opportunity to break *before* that character. Index 0
/// is always `None`.
fn compute_break_opportunities(text: &str) -> Vec<Option<BreakOpportunity>> {
    let char_count = text.chars().count();
    let mut result = vec![None; char_count];

    let mut byte_to_char = vec![0usize; text.len() + 1];
    for (char_idx, (byte_idx, _)) in text.char_indices().enumerate() {
        byte_to_char[byte_idx] = char_idx;
    }
    byte_to_char[text.len()] = char_count;

    for (byte_offset, opp) in linebreaks(text) {
        let char_idx = byte_to_char[byte_offset];
        // An offset at the very end is the implicit break after the text.
        if char_idx < char_count {
            result[char_idx] = Some(opp);
        }
    }

    result
}

fn make_line(chars: &[char], widths: &[f32]) -> BrokenLine {
    let mut end = chars.len();
    while end > 0 && (chars[end - 1].is_whitespace()) {
        end -= 1;
    }
    BrokenLine {
        text: chars[..end].iter().filter(|c| !is_newline(**c)).collect(),
        width: widths[..end].iter().sum(),
    }
}

/// Greedy line breaking at UAX#14 opportunities.
///
/// Mandatory breaks are always taken. Trailing whitespace hangs past the
/// limit. A token wider than `max_width` is broken at the character that
/// overflows, so no line is ever empty unless the text is.
pub fn break_lines<F>(text: &str, max_width: Option<f32>, char_width: F) -> Vec<BrokenLine>
where
    F: Fn(char) -> f32,
{
    if text.is_empty() {
        return vec![BrokenLine {
            text: String::new(),
            width: 0.0,
        }];
    }

    let chars: Vec<char> = text.chars().collect();
    let widths: Vec<f32> = chars
        .iter()
        .map(|&ch| if is_newline(ch) { 0.0 } else { char_width(ch) })
        .collect();
    let limit = max_width.map(|w| w.max(0.0) + BREAK_EPSILON);
    let break_opps = compute_break_opportunities(text);

    let mut lines = Vec::new();
    let mut line_start = 0;
    let mut line_width = 0.0f32;
    let mut last_break_point: Option<usize> = None;

    for (i, &ch) in chars.iter().enumerate() {
        if i > 0 {
            match break_opps[i] {
                Some(BreakOpportunity::Mandatory) => {
                    lines.push(make_line(&chars[line_start..i], &widths[line_start..i]));
                    line_start = i;
                    line_width = 0.0;
                    last_break_point = None;
                }
                Some(BreakOpportunity::Allowed) => {
                    // The break is after char[i - 1].
                    last_break_point = Some(i - 1);
                }
                None => {}
            }
        }

        if is_newline(ch) {
            continue;
        }

        let w = widths[i];
        let overflows = limit.is_some_and(|limit| line_width + w > limit);
        if overflows && line_start < i && !ch.is_whitespace() {
            if let Some(bp) = last_break_point.filter(|bp| *bp >= line_start) {
                lines.push(make_line(&chars[line_start..=bp], &widths[line_start..=bp]));
                line_start = bp + 1;
                line_width = widths[line_start..=i].iter().sum();
                last_break_point = None;
                continue;
            }

            // No break opportunity on this line: force a break here.
            lines.push(make_line(&chars[line_start..i], &widths[line_start..i]));
            line_start = i;
            line_width = w;
            last_break_point = None;
            continue;
        }

        line_width += w;
    }

    if line_start < chars.len() {
        lines.push(make_line(&chars[line_start..], &widths[line_start..]));
    }

    lines
}

/// Width of the widest segment between UAX#14 break opportunities.
pub fn widest_token<F>(text: &str, char_width: F) -> f32
where
    F: Fn(char) -> f32,
{
    let chars: Vec<char> = text.chars().collect();
    let widths: Vec<f32> = chars
        .iter()
        .map(|&ch| if is_newline(ch) { 0.0 } else { char_width(ch) })
        .collect();
    let break_opps = compute_break_opportunities(text);

    let mut widest = 0.0f32;
    let mut start = 0;
    for i in 1..=chars.len() {
        if i == chars.len() || break_opps[i].is_some() {
            widest = widest.max(make_line(&chars[start..i], &widths[start..i]).width);
            start = i;
        }
    }
    widest
}

/// Shape with a per-character advance function and a fixed line height.
/// Shared by the built-in shapers.
pub fn shape_with<F>(content: &str, max_width: Option<f32>, line_height: f32, char_width: F) -> ShapedText
where
    F: Fn(char) -> f32,
{
    let broken = break_lines(content, max_width, char_width);
    let width = broken.iter().map(|l| l.width).fold(0.0f32, f32::max);
    let height = broken.len() as f32 * line_height;
    ShapedText {
        lines: broken.into_iter().map(|l| l.text).collect(),
        size: Size::new(width, height),
        line_height,
    }
}

/// Approximate shaper used when no font engine is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackShaper;

impl FallbackShaper {
    pub const LINE_HEIGHT: f32 = 1.2;

    /// Approximate advance of `ch` in pixels.
    pub fn advance(ch: char, font_size: f32) -> f32 {
        let columns = match ch.width() {
            Some(c) => c as f32,
            None => return 0.0,
        };
        if columns >= 2.0 {
            return font_size;
        }
        let em = match ch {
            ' ' | 'i' | 'j' | 'l' | 'I' | '!' | '.' | ',' | ':' | ';' | '\'' | '|' => 0.28,
            'f' | 't' | 'r' | '(' | ')' | '-' => 0.35,
            'm' | 'w' | 'M' | 'W' | '@' => 0.83,
            _ => 0.55,
        };
        columns * em * font_size
    }
}

impl TextShaper for FallbackShaper {
    fn shape(&self, content: &str, font_size: f32, max_width: Option<f32>) -> ShapedText {
        shape_with(content, max_width, font_size * Self::LINE_HEIGHT, |ch| {
            Self::advance(ch, font_size)
        })
    }

    fn min_content_width(&self, content: &str, font_size: f32) -> f32 {
        widest_token(content, |ch| Self::advance(ch, font_size))
    }
}
