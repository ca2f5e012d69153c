//! # Style System
//!
//! The CSS-like properties carried by every element, plus the extra set a
//! flex container carries. This is intentionally a subset of CSS: box
//! sizing, flexbox, positioning and the few paint properties a renderer
//! needs passed through untouched.
//!
//! Every field has a default, so a document only spells out what differs.

use serde::{Deserialize, Serialize};

use crate::unit::{Edges, Margin, Unit};

/// Style properties shared by every element kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Style {
    // ── Box Model ──────────────────────────────────────────────
    pub width: Unit,
    pub height: Unit,
    pub min_width: Unit,
    pub min_height: Unit,
    /// `Auto` means unbounded.
    pub max_width: Unit,
    /// `Auto` means unbounded.
    pub max_height: Unit,
    /// Padding inside the element's box, in pixels.
    pub padding: Edges<f32>,
    /// Margin outside the element's box. `auto` sides absorb free space.
    pub margin: Edges<Margin>,
    /// Preferred width / height ratio.
    pub aspect_ratio: Option<f32>,

    // ── Flex Item ──────────────────────────────────────────────
    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub flex_basis: Unit,
    /// Overrides the container's `align-items` for this item.
    pub align_self: Option<AlignItems>,
    /// Items are placed in ascending order; ties keep document order.
    pub order: i32,

    // ── Positioning ────────────────────────────────────────────
    pub position: Position,
    pub inset: Insets,

    // ── Visibility & Paint ─────────────────────────────────────
    pub display: Display,
    /// Degrees, clockwise. Passed through to the renderer.
    pub rotation: f32,
    /// 0.0 – 1.0. Passed through to the renderer.
    pub opacity: f32,

    // ── Text ───────────────────────────────────────────────────
    /// Font size in pixels. Inherited.
    pub font_size: Option<f32>,
    /// Inherited when unset.
    pub direction: Option<Direction>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            width: Unit::Auto,
            height: Unit::Auto,
            min_width: Unit::Auto,
            min_height: Unit::Auto,
            max_width: Unit::Auto,
            max_height: Unit::Auto,
            padding: Edges::default(),
            margin: Edges::default(),
            aspect_ratio: None,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            flex_basis: Unit::Auto,
            align_self: None,
            order: 0,
            position: Position::Static,
            inset: Insets::default(),
            display: Display::Flex,
            rotation: 0.0,
            opacity: 1.0,
            font_size: None,
            direction: None,
        }
    }
}

impl Style {
    /// A usable aspect ratio, ignoring zero, negative and non-finite values.
    pub fn aspect_ratio(&self) -> Option<f32> {
        self.aspect_ratio.filter(|r| r.is_finite() && *r > 0.0)
    }

    pub fn is_hidden(&self) -> bool {
        matches!(self.display, Display::None)
    }

    pub fn is_absolute(&self) -> bool {
        matches!(self.position, Position::Absolute)
    }
}

/// Properties only a flex container carries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlexContainer {
    pub direction: FlexDirection,
    pub wrap: FlexWrap,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub align_content: AlignContent,
    /// Space between lines of a row container, or between items of a column.
    pub row_gap: f32,
    /// Space between items of a row container, or between lines of a column.
    pub column_gap: f32,
    pub overflow: Overflow,
}

/// Inset offsets for relative and absolute positioning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Insets {
    pub top: Option<Unit>,
    pub right: Option<Unit>,
    pub bottom: Option<Unit>,
    pub left: Option<Unit>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlexDirection {
    #[default]
    Row,
    RowReverse,
    Column,
    ColumnReverse,
}

impl FlexDirection {
    pub fn is_row(&self) -> bool {
        matches!(self, FlexDirection::Row | FlexDirection::RowReverse)
    }

    pub fn is_reverse(&self) -> bool {
        matches!(self, FlexDirection::RowReverse | FlexDirection::ColumnReverse)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlexWrap {
    #[default]
    #[serde(alias = "nowrap")]
    NoWrap,
    Wrap,
    WrapReverse,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JustifyContent {
    #[default]
    #[serde(alias = "flex-start")]
    Start,
    #[serde(alias = "flex-end")]
    End,
    Center,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlignItems {
    #[serde(alias = "flex-start")]
    Start,
    #[serde(alias = "flex-end")]
    End,
    Center,
    #[default]
    Stretch,
    Baseline,
}

/// Distribution of flex lines on the cross axis. Defaults to `Start`, not
/// the CSS initial value `stretch`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlignContent {
    #[default]
    #[serde(alias = "flex-start")]
    Start,
    #[serde(alias = "flex-end")]
    End,
    Center,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
    Stretch,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
    Clip,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    /// Normal flow, not a containing block for absolute descendants.
    #[default]
    Static,
    /// Normal flow, shifted by its insets afterwards.
    Relative,
    /// Out of flow, placed by its insets.
    Absolute,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Display {
    #[default]
    Flex,
    None,
}

/// Text direction as written in a document. `Auto` detects the direction
/// of text content and inherits everywhere else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
    Auto,
}

/// The direction an element resolved to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolvedDirection {
    #[default]
    Ltr,
    Rtl,
}

impl ResolvedDirection {
    pub fn is_rtl(&self) -> bool {
        matches!(self, ResolvedDirection::Rtl)
    }
}
