//! # Paragraph Direction
//!
//! Resolves `direction: auto` on text content using the UAX#9 rule for the
//! paragraph embedding level: the first strong character decides.

use unicode_bidi::{bidi_class, BidiClass};

use crate::style::{Direction, ResolvedDirection};

/// Direction of the first strong character in `text`, if any.
pub fn paragraph_direction(text: &str) -> Option<ResolvedDirection> {
    text.chars().find_map(|ch| match bidi_class(ch) {
        BidiClass::L => Some(ResolvedDirection::Ltr),
        BidiClass::R | BidiClass::AL => Some(ResolvedDirection::Rtl),
        _ => None,
    })
}

/// Resolve a declared direction against the inherited one. `Auto` detects
/// from `content` when there is text to inspect and inherits otherwise.
pub fn resolve_direction(
    declared: Option<Direction>,
    inherited: ResolvedDirection,
    content: Option<&str>,
) -> ResolvedDirection {
    match declared {
        None => inherited,
        Some(Direction::Ltr) => ResolvedDirection::Ltr,
        Some(Direction::Rtl) => ResolvedDirection::Rtl,
        Some(Direction::Auto) => content
            .and_then(paragraph_direction)
            .unwrap_or(inherited),
    }
}
