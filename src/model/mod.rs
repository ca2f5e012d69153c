//! # Document Model
//!
//! The input representation for the layout engine: a fully expanded element
//! tree (loops, conditionals and `{{...}}` substitutions already applied
//! upstream) plus the canvas it is laid out on.
//!
//! Element kinds are a closed tagged union. Only containers own children,
//! so a child can never be attached to a leaf and lost.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LayoutError;
use crate::layout::LayoutOptions;
use crate::style::{FlexContainer, Style};
use crate::unit::{Margin, Unit, UnitParseError};

/// A complete document ready for layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Which canvas dimensions are fixed.
    pub canvas: Canvas,
    /// The root element. Its box always covers the whole canvas.
    pub root: Element,
    /// Limits and defaults for this layout call.
    #[serde(default)]
    pub options: LayoutOptions,
}

impl Document {
    pub fn new(canvas: Canvas, root: Element) -> Self {
        Self {
            canvas,
            root,
            options: LayoutOptions::default(),
        }
    }

    /// Parse a document from JSON.
    ///
    /// Dimension strings are checked before the typed decode, so a
    /// malformed one is reported as [`LayoutError::InvalidUnitExpression`]
    /// naming the offending text rather than as a generic parse error.
    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        let value: Value = serde_json::from_str(json)?;
        if let Some(root) = value.get("root") {
            check_dimensions(root)?;
        }
        Ok(serde_json::from_value(value)?)
    }
}

const DIMENSION_KEYS: [&str; 7] = [
    "width",
    "height",
    "minWidth",
    "minHeight",
    "maxWidth",
    "maxHeight",
    "flexBasis",
];

const SIDES: [&str; 4] = ["top", "right", "bottom", "left"];

/// Run every dimension string in an element subtree through the unit
/// parser. Anything that is not a string is left to serde.
fn check_dimensions(element: &Value) -> Result<(), UnitParseError> {
    if let Some(style) = element.get("style") {
        for key in DIMENSION_KEYS {
            if let Some(Value::String(s)) = style.get(key) {
                Unit::parse(s)?;
            }
        }
        for side in SIDES {
            if let Some(Value::String(s)) = style.get("inset").and_then(|i| i.get(side)) {
                Unit::parse(s)?;
            }
            if let Some(Value::String(s)) = style.get("margin").and_then(|m| m.get(side)) {
                Margin::parse(s)?;
            }
        }
    }

    let children = element
        .get("kind")
        .and_then(|kind| kind.get("children"))
        .and_then(Value::as_array);
    for child in children.into_iter().flatten() {
        check_dimensions(child)?;
    }
    Ok(())
}

/// Canvas sizing mode. When only one dimension is fixed the other one is
/// the measured size of the element tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "fixed", rename_all = "camelCase")]
pub enum Canvas {
    Width { width: f32 },
    Height { height: f32 },
    Both { width: f32, height: f32 },
}

impl Canvas {
    pub fn fixed_width(&self) -> Option<f32> {
        match *self {
            Canvas::Width { width } | Canvas::Both { width, .. } => Some(width.max(0.0)),
            Canvas::Height { .. } => None,
        }
    }

    pub fn fixed_height(&self) -> Option<f32> {
        match *self {
            Canvas::Height { height } | Canvas::Both { height, .. } => Some(height.max(0.0)),
            Canvas::Width { .. } => None,
        }
    }
}

/// A node in the element tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// What kind of element this is.
    pub kind: ElementKind,

    /// Style properties for this element.
    #[serde(default)]
    pub style: Style,

    /// An optional identifier, carried through to the layout tree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// The different kinds of elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ElementKind {
    /// A flex container.
    Container {
        #[serde(default)]
        flex: FlexContainer,
        #[serde(default)]
        children: Vec<Element>,
    },

    /// A block of text, shaped by the injected text shaper.
    Text {
        content: String,
        /// Whether lines may break at wrap opportunities.
        #[serde(default = "default_true")]
        wrap: bool,
    },

    /// An image whose pixels the renderer loads. The resource provider
    /// supplies the natural size.
    Image {
        #[serde(default)]
        src: String,
        #[serde(default, rename = "naturalWidth")]
        natural_width: f32,
        #[serde(default, rename = "naturalHeight")]
        natural_height: f32,
    },

    /// A QR code or barcode placeholder.
    Code {
        symbology: Symbology,
        data: String,
        /// Size of one module (the smallest bar or square) in pixels.
        #[serde(default = "default_module_size", rename = "moduleSize")]
        module_size: f32,
    },

    /// A rule line.
    Separator {
        #[serde(default)]
        orientation: Orientation,
        #[serde(default = "default_thickness")]
        thickness: f32,
    },

    /// Empty leaf content with no natural size.
    Spacer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Symbology {
    Qr,
    Code128,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

fn default_true() -> bool {
    true
}

fn default_module_size() -> f32 {
    4.0
}

fn default_thickness() -> f32 {
    1.0
}

impl Element {
    fn new(kind: ElementKind, style: Style) -> Self {
        Self {
            kind,
            style,
            id: None,
        }
    }

    /// Create a flex container.
    pub fn container(flex: FlexContainer, style: Style, children: Vec<Element>) -> Self {
        Self::new(ElementKind::Container { flex, children }, style)
    }

    /// Create a wrapping text element.
    pub fn text(content: &str, style: Style) -> Self {
        Self::new(
            ElementKind::Text {
                content: content.to_string(),
                wrap: true,
            },
            style,
        )
    }

    /// Create an image element with a known natural size.
    pub fn image(src: &str, natural_width: f32, natural_height: f32, style: Style) -> Self {
        Self::new(
            ElementKind::Image {
                src: src.to_string(),
                natural_width,
                natural_height,
            },
            style,
        )
    }

    /// Create a code symbol element with the default module size.
    pub fn code(symbology: Symbology, data: &str, style: Style) -> Self {
        Self::new(
            ElementKind::Code {
                symbology,
                data: data.to_string(),
                module_size: default_module_size(),
            },
            style,
        )
    }

    pub fn separator(orientation: Orientation, thickness: f32, style: Style) -> Self {
        Self::new(
            ElementKind::Separator {
                orientation,
                thickness,
            },
            style,
        )
    }

    pub fn spacer(style: Style) -> Self {
        Self::new(ElementKind::Spacer, style)
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Children of a container; empty for leaves.
    pub fn children(&self) -> &[Element] {
        match &self.kind {
            ElementKind::Container { children, .. } => children,
            _ => &[],
        }
    }

    pub fn flex(&self) -> Option<&FlexContainer> {
        match &self.kind {
            ElementKind::Container { flex, .. } => Some(flex),
            _ => None,
        }
    }
}

/// Return a human-readable name for an ElementKind variant.
pub fn element_kind_name(kind: &ElementKind) -> &'static str {
    match kind {
        ElementKind::Container { .. } => "Container",
        ElementKind::Text { .. } => "Text",
        ElementKind::Image { .. } => "Image",
        ElementKind::Code {
            symbology: Symbology::Qr,
            ..
        } => "QrCode",
        ElementKind::Code {
            symbology: Symbology::Code128,
            ..
        } => "Barcode",
        ElementKind::Separator { .. } => "Separator",
        ElementKind::Spacer => "Spacer",
    }
}
