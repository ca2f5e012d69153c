//! Structured error types for the layout engine.
//!
//! Layout is a pure function of its input, so the error surface is small:
//! the input could not be parsed, a resource guard tripped, or a code
//! symbol could not be encoded to determine its natural size.

use std::fmt;

use thiserror::Error;

use crate::unit::UnitParseError;

/// The guarded resource that a layout call ran out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Nesting depth of flex containers.
    Depth,
    /// Flex lines produced by a single container.
    Lines,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Depth => write!(f, "depth"),
            Resource::Lines => write!(f, "flex line"),
        }
    }
}

/// The unified error type returned by all public layout functions.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// Recursion depth or line count went past the configured maximum.
    /// The whole layout call fails; the tree is never truncated.
    #[error("{resource} limit exceeded: reached {actual}, maximum is {limit}")]
    ResourceLimitExceeded {
        resource: Resource,
        limit: usize,
        actual: usize,
    },

    /// A dimension string could not be parsed into a `Unit`.
    #[error(transparent)]
    InvalidUnitExpression(#[from] UnitParseError),

    /// JSON input failed to parse as a valid document.
    #[error("failed to parse document: {source}{}", hint_suffix(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    /// A code symbol's data cannot be encoded, so it has no natural size.
    #[error("cannot encode code symbol: {0}")]
    Symbol(String),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {hint}")
    }
}

impl From<serde_json::Error> for LayoutError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                if e.to_string().contains("unit expression") {
                    "Dimensions are numbers (pixels) or strings like \"12px\", \"50%\", \"1.5em\" or \"auto\".".to_string()
                } else {
                    "The JSON is valid but doesn't match the document schema. Check field names and types.".to_string()
                }
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input, is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        LayoutError::Parse { source: e, hint }
    }
}
