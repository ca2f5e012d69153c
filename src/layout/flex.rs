//! # Flex Layout Utilities
//!
//! The arithmetic half of the flexbox algorithm, along a single axis:
//! splitting items into lines, resolving flexible lengths, and turning
//! leftover space into offsets. The layout engine maps rows and columns
//! onto these functions.

use crate::style::{AlignContent, JustifyContent};

/// A single line of items in a wrapping flex container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapLine {
    /// Index of the first item in this line.
    pub start: usize,
    /// One past the last item (exclusive end).
    pub end: usize,
}

impl WrapLine {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Partition items into wrap lines by their outer main size (hypothetical
/// size plus margins). A line breaks before the item that would push the
/// running total past `available`.
/// Always adds at least one item per line (prevents infinite loops on oversized items).
pub fn partition_into_lines(outer_sizes: &[f32], gap: f32, available: f32) -> Vec<WrapLine> {
    if outer_sizes.is_empty() {
        return vec![];
    }

    let mut lines = Vec::new();
    let mut line_start = 0;
    let mut line_size = 0.0;

    for (i, &size) in outer_sizes.iter().enumerate() {
        let needed = if i == line_start { size } else { gap + size };
        if i > line_start && line_size + needed > available {
            lines.push(WrapLine {
                start: line_start,
                end: i,
            });
            line_start = i;
            line_size = size;
        } else {
            line_size += needed;
        }
    }

    // Close the last line
    lines.push(WrapLine {
        start: line_start,
        end: outer_sizes.len(),
    });

    lines
}

/// Inputs to flexible length resolution for one item, all along the main
/// axis and in border-box pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlexFactors {
    /// Flex base size.
    pub base: f32,
    pub min: f32,
    /// `f32::INFINITY` when unbounded.
    pub max: f32,
    pub grow: f32,
    pub shrink: f32,
    /// Fixed margins on both sides. Auto margins count as zero here.
    pub margin: f32,
}

impl FlexFactors {
    /// Clamp to the item's min/max. The min wins over the max, and no size
    /// is ever negative.
    pub fn clamp(&self, size: f32) -> f32 {
        size.min(self.max).max(self.min).max(0.0)
    }

    /// The base size clamped by min/max.
    pub fn hypothetical(&self) -> f32 {
        self.clamp(self.base)
    }
}

/// Resolve the main sizes of one line's items so that their outer sizes
/// fill `available`, following the CSS Flexbox §9.7 freeze loop: inflexible
/// items are frozen first, then free space is handed out by grow factor
/// (or taken by shrink factor × base size) and items that violate their
/// min/max are frozen at the clamp until nothing moves.
pub fn resolve_flexible_lengths(items: &[FlexFactors], available: f32) -> Vec<f32> {
    let hypothetical_sum: f32 = items.iter().map(|i| i.hypothetical() + i.margin).sum();
    let growing = hypothetical_sum < available;

    let mut target: Vec<f32> = items.iter().map(FlexFactors::hypothetical).collect();
    let mut frozen: Vec<bool> = items
        .iter()
        .map(|item| {
            let factor = if growing { item.grow } else { item.shrink };
            factor <= 0.0
                || (growing && item.base > item.hypothetical())
                || (!growing && item.base < item.hypothetical())
        })
        .collect();

    let free_space = |target: &[f32], frozen: &[bool]| -> f32 {
        let used: f32 = items
            .iter()
            .zip(target)
            .zip(frozen)
            .map(|((item, t), f)| item.margin + if *f { *t } else { item.base })
            .sum();
        available - used
    };

    while frozen.iter().any(|f| !f) {
        let unfrozen: Vec<usize> = (0..items.len()).filter(|&i| !frozen[i]).collect();

        let remaining = free_space(&target, &frozen);

        if growing {
            let factor_sum: f32 = unfrozen.iter().map(|&i| items[i].grow).sum();
            for &i in &unfrozen {
                target[i] = items[i].base + remaining * items[i].grow / factor_sum;
            }
        } else {
            let scaled_sum: f32 = unfrozen
                .iter()
                .map(|&i| items[i].shrink * items[i].base)
                .sum();
            for &i in &unfrozen {
                target[i] = if scaled_sum > 0.0 {
                    let ratio = items[i].shrink * items[i].base / scaled_sum;
                    items[i].base - remaining.abs() * ratio
                } else {
                    items[i].base
                };
            }
        }

        let mut violations = vec![0.0f32; items.len()];
        let mut total_violation = 0.0f32;
        for &i in &unfrozen {
            let clamped = items[i].clamp(target[i]);
            violations[i] = clamped - target[i];
            total_violation += violations[i];
            target[i] = clamped;
        }

        for &i in &unfrozen {
            frozen[i] = if total_violation > 0.0 {
                violations[i] > 0.0
            } else if total_violation < 0.0 {
                violations[i] < 0.0
            } else {
                true
            };
        }
    }

    target
}

/// `(start_offset, between_extra)` for distributing `free` space across
/// `count` items. Negative free space has no room to spread, so the
/// spacing modes fall back: `space-between` to `start`, `space-around`
/// and `space-evenly` to `center`.
pub fn justify_offsets(justify: JustifyContent, free: f32, count: usize) -> (f32, f32) {
    if count == 0 {
        return (0.0, 0.0);
    }
    let justify = if free < 0.0 {
        match justify {
            JustifyContent::SpaceBetween => JustifyContent::Start,
            JustifyContent::SpaceAround | JustifyContent::SpaceEvenly => JustifyContent::Center,
            other => other,
        }
    } else {
        justify
    };

    let n = count as f32;
    match justify {
        JustifyContent::Start => (0.0, 0.0),
        JustifyContent::End => (free, 0.0),
        JustifyContent::Center => (free / 2.0, 0.0),
        JustifyContent::SpaceBetween => {
            if count > 1 {
                (0.0, free / (n - 1.0))
            } else {
                (0.0, 0.0)
            }
        }
        JustifyContent::SpaceAround => {
            let s = free / n;
            (s / 2.0, s)
        }
        JustifyContent::SpaceEvenly => {
            let s = free / (n + 1.0);
            (s, s)
        }
    }
}

/// Line offsets for `align-content`. `Stretch` grows the lines instead of
/// moving them, which the caller does when there is room; here it packs
/// at the start.
pub fn align_content_offsets(align: AlignContent, free: f32, lines: usize) -> (f32, f32) {
    let as_justify = match align {
        AlignContent::Start | AlignContent::Stretch => JustifyContent::Start,
        AlignContent::End => JustifyContent::End,
        AlignContent::Center => JustifyContent::Center,
        AlignContent::SpaceBetween => JustifyContent::SpaceBetween,
        AlignContent::SpaceAround => JustifyContent::SpaceAround,
        AlignContent::SpaceEvenly => JustifyContent::SpaceEvenly,
    };
    justify_offsets(as_justify, free, lines)
}
