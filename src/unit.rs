//! # Units
//!
//! Dimension values and the pure resolver that turns them into pixels.
//!
//! Raw strings only enter the system through [`Unit::parse`] (directly or
//! via serde), which is the single place a malformed expression can be
//! rejected. Once a `Unit` exists, resolving it never fails: it either
//! yields pixels or `None`, which means the caller has to infer the size
//! from context (content size, or the space left in a flex line).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A dimension expression.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "UnitRepr", into = "String")]
pub enum Unit {
    /// Absolute pixels.
    Pixels(f32),
    /// Percentage (0–100) of the reference size on the same axis.
    Percent(f32),
    /// Multiple of the element's font size (`em`/`rem`).
    FontRelative(f32),
    /// No explicit value; the caller decides.
    #[default]
    Auto,
}

/// A malformed dimension string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid unit expression {input:?}: {reason}")]
pub struct UnitParseError {
    pub input: String,
    pub reason: &'static str,
}

impl Unit {
    pub fn px(v: f32) -> Self {
        Unit::Pixels(v)
    }

    pub fn percent(v: f32) -> Self {
        Unit::Percent(v)
    }

    pub fn em(v: f32) -> Self {
        Unit::FontRelative(v)
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Unit::Auto)
    }

    /// Resolve against a reference size (the parent content box on the same
    /// axis) and the element's font size.
    ///
    /// A percentage of an indefinite reference behaves like `auto`.
    pub fn resolve(&self, reference: Option<f32>, base_font_size: f32) -> Option<f32> {
        match *self {
            Unit::Pixels(v) => Some(v),
            Unit::Percent(p) => reference.map(|r| r * p / 100.0),
            Unit::FontRelative(m) => Some(m * base_font_size),
            Unit::Auto => None,
        }
    }

    /// Resolve without any reference size. Percentages are indefinite.
    pub fn resolve_absolute(&self, base_font_size: f32) -> Option<f32> {
        self.resolve(None, base_font_size)
    }

    /// Parse a dimension expression: `auto`, `12`, `12px`, `50%`, `1.5em`
    /// or `1.5rem`.
    pub fn parse(input: &str) -> Result<Unit, UnitParseError> {
        let err = |reason| UnitParseError {
            input: input.to_string(),
            reason,
        };
        let s = input.trim();
        if s.is_empty() {
            return Err(err("empty expression"));
        }
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Unit::Auto);
        }

        let lower = s.to_ascii_lowercase();
        let (number, make): (&str, fn(f32) -> Unit) = if let Some(n) = lower.strip_suffix('%') {
            (n, Unit::Percent)
        } else if let Some(n) = lower.strip_suffix("px") {
            (n, Unit::Pixels)
        } else if let Some(n) = lower.strip_suffix("rem") {
            (n, Unit::FontRelative)
        } else if let Some(n) = lower.strip_suffix("em") {
            (n, Unit::FontRelative)
        } else {
            (lower.as_str(), Unit::Pixels)
        };

        let number = number.trim_end();
        if number.is_empty() {
            return Err(err("missing number"));
        }
        let value: f32 = number.parse().map_err(|_| err("not a number"))?;
        if !value.is_finite() {
            return Err(err("value must be finite"));
        }
        Ok(make(value))
    }
}

impl FromStr for Unit {
    type Err = UnitParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::parse(s)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Pixels(v) => write!(f, "{v}px"),
            Unit::Percent(v) => write!(f, "{v}%"),
            Unit::FontRelative(v) => write!(f, "{v}em"),
            Unit::Auto => write!(f, "auto"),
        }
    }
}

impl From<Unit> for String {
    fn from(unit: Unit) -> Self {
        unit.to_string()
    }
}

/// Wire shape of a unit: bare numbers are pixels.
#[derive(Deserialize)]
#[serde(untagged)]
enum UnitRepr {
    Number(f32),
    Text(String),
}

impl TryFrom<UnitRepr> for Unit {
    type Error = UnitParseError;

    fn try_from(repr: UnitRepr) -> Result<Self, Self::Error> {
        match repr {
            UnitRepr::Number(v) if v.is_finite() => Ok(Unit::Pixels(v)),
            UnitRepr::Number(v) => Err(UnitParseError {
                input: v.to_string(),
                reason: "value must be finite",
            }),
            UnitRepr::Text(s) => Unit::parse(&s),
        }
    }
}

/// One side of a margin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MarginRepr", into = "String")]
pub enum Margin {
    Fixed(f32),
    /// Absorbs free space on its axis.
    Auto,
}

impl Default for Margin {
    fn default() -> Self {
        Margin::Fixed(0.0)
    }
}

impl Margin {
    /// Parse one margin side: `auto` or a pixel length.
    pub fn parse(input: &str) -> Result<Margin, UnitParseError> {
        match Unit::parse(input)? {
            Unit::Pixels(v) => Ok(Margin::Fixed(v)),
            Unit::Auto => Ok(Margin::Auto),
            Unit::Percent(_) | Unit::FontRelative(_) => Err(UnitParseError {
                input: input.to_string(),
                reason: "margins are pixels or auto",
            }),
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Margin::Auto)
    }

    /// The fixed part of the margin; auto margins contribute nothing until
    /// free space is handed out.
    pub fn fixed(&self) -> f32 {
        match *self {
            Margin::Fixed(v) => v,
            Margin::Auto => 0.0,
        }
    }
}

impl From<Margin> for String {
    fn from(margin: Margin) -> Self {
        match margin {
            Margin::Fixed(v) => format!("{v}px"),
            Margin::Auto => "auto".to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MarginRepr {
    Number(f32),
    Text(String),
}

impl TryFrom<MarginRepr> for Margin {
    type Error = UnitParseError;

    fn try_from(repr: MarginRepr) -> Result<Self, Self::Error> {
        match repr {
            MarginRepr::Number(v) if v.is_finite() => Ok(Margin::Fixed(v)),
            MarginRepr::Number(v) => Err(UnitParseError {
                input: v.to_string(),
                reason: "value must be finite",
            }),
            MarginRepr::Text(s) => Margin::parse(&s),
        }
    }
}

/// Values for each edge (top, right, bottom, left).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges<T> {
    #[serde(default)]
    pub top: T,
    #[serde(default)]
    pub right: T,
    #[serde(default)]
    pub bottom: T,
    #[serde(default)]
    pub left: T,
}

impl<T: Copy> Edges<T> {
    pub fn uniform(v: T) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn symmetric(vertical: T, horizontal: T) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }
}

impl Edges<f32> {
    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

impl Edges<Margin> {
    /// Sum of the fixed horizontal margins.
    pub fn horizontal(&self) -> f32 {
        self.left.fixed() + self.right.fixed()
    }

    /// Sum of the fixed vertical margins.
    pub fn vertical(&self) -> f32 {
        self.top.fixed() + self.bottom.fixed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_number_is_pixels() {
        assert_eq!(Unit::parse("12").unwrap(), Unit::Pixels(12.0));
        assert_eq!(Unit::parse(" 12.5px ").unwrap(), Unit::Pixels(12.5));
    }

    #[test]
    fn parse_suffixes() {
        assert_eq!(Unit::parse("50%").unwrap(), Unit::Percent(50.0));
        assert_eq!(Unit::parse("1.5em").unwrap(), Unit::FontRelative(1.5));
        assert_eq!(Unit::parse("2REM").unwrap(), Unit::FontRelative(2.0));
        assert_eq!(Unit::parse("Auto").unwrap(), Unit::Auto);
    }

    #[test]
    fn parse_rejects_garbage() {
        for bad in ["", "px", "12pt", "abc", "1.2.3%", "NaN", "inf"] {
            let err = Unit::parse(bad).unwrap_err();
            assert_eq!(err.input, bad);
        }
    }

    #[test]
    fn resolve_against_reference() {
        assert_eq!(Unit::Pixels(10.0).resolve(Some(200.0), 16.0), Some(10.0));
        assert_eq!(Unit::Percent(25.0).resolve(Some(200.0), 16.0), Some(50.0));
        assert_eq!(Unit::FontRelative(2.0).resolve(Some(200.0), 16.0), Some(32.0));
        assert_eq!(Unit::Auto.resolve(Some(200.0), 16.0), None);
    }

    #[test]
    fn percent_of_indefinite_reference_is_auto() {
        assert_eq!(Unit::Percent(50.0).resolve(None, 16.0), None);
    }

    #[test]
    fn unit_deserializes_from_number_or_string() {
        let units: Vec<Unit> = serde_json::from_str(r#"[10, "20px", "30%", "auto"]"#).unwrap();
        assert_eq!(
            units,
            vec![
                Unit::Pixels(10.0),
                Unit::Pixels(20.0),
                Unit::Percent(30.0),
                Unit::Auto
            ]
        );
    }

    #[test]
    fn unit_deserialize_error_names_expression() {
        let err = serde_json::from_str::<Unit>(r#""12parsecs""#).unwrap_err();
        assert!(err.to_string().contains("invalid unit expression"));
    }

    #[test]
    fn margin_accepts_auto_and_rejects_percent() {
        let m: Edges<Margin> =
            serde_json::from_str(r#"{"left": "auto", "right": 4, "top": "2px"}"#).unwrap();
        assert_eq!(m.left, Margin::Auto);
        assert_eq!(m.right, Margin::Fixed(4.0));
        assert_eq!(m.bottom, Margin::Fixed(0.0));
        assert!((m.horizontal() - 4.0).abs() < f32::EPSILON);

        assert!(serde_json::from_str::<Margin>(r#""10%""#).is_err());
        let err = Margin::parse("1.5em").unwrap_err();
        assert_eq!(err.input, "1.5em");
        assert_eq!(err.reason, "margins are pixels or auto");
    }
}
