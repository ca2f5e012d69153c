//! # Labelform
//!
//! A two-pass flexbox layout engine for data-bound label documents.
//!
//! A label is a tree of text blocks, images, QR codes, barcodes, separators
//! and nested flex containers, already expanded from its template. Labelform
//! turns that tree into absolute pixel geometry. It never draws anything:
//! a rendering backend walks the resulting [`LayoutNode`] tree and paints
//! each box where it was placed.
//!
//! Text is measured through the [`TextShaper`] trait, so the same document
//! lays out identically for every backend that agrees on a shaper. Line
//! breaks chosen during layout travel with the output, and the renderer
//! never re-breaks text.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON/API)
//!       ↓
//!   [model]      Element tree, canvas, options
//!       ↓
//!   [layout::intrinsic]   Pass 1: min/max content sizes, bottom-up
//!       ↓
//!   [layout]     Pass 2: lines, grow/shrink, alignment, positioning
//!       ↓
//!   LayoutNode   Absolute boxes for the renderer
//! ```

pub mod error;
pub mod font;
pub mod geometry;
pub mod layout;
pub mod model;
pub mod style;
pub mod text;
pub mod unit;

pub use error::LayoutError;
pub use layout::{LayoutEngine, LayoutNode, LayoutOptions};
pub use model::{Canvas, Document, Element};
pub use text::{FallbackShaper, TextShaper};

/// Lay out a document with the built-in fallback shaper.
///
/// This is the primary entry point.
pub fn layout(document: &Document) -> Result<LayoutNode<'_>, LayoutError> {
    layout_with_shaper(document, &FallbackShaper)
}

/// Lay out a document, measuring text with `shaper`.
pub fn layout_with_shaper<'d>(
    document: &'d Document,
    shaper: &dyn TextShaper,
) -> Result<LayoutNode<'d>, LayoutError> {
    let engine = LayoutEngine::with_options(document.options.clone());
    engine.layout(&document.root, document.canvas, shaper)
}

/// Lay out a document described as JSON and return the layout tree as JSON.
///
/// A malformed dimension string fails with
/// [`LayoutError::InvalidUnitExpression`]; any other schema or syntax
/// problem is a [`LayoutError::Parse`].
pub fn layout_json(json: &str) -> Result<String, LayoutError> {
    let document = Document::from_json(json)?;
    let tree = layout(&document)?;
    Ok(serde_json::to_string(&tree)?)
}
