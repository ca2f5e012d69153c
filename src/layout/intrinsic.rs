//! # Intrinsic Sizing (Pass 1)
//!
//! A bottom-up walk that records, for every visible element, how narrow and
//! how wide its content can be laid out, and the height it has at those two
//! widths. Containers combine their children along the main axis (sum plus
//! gaps) and the cross axis (max). Explicit sizes always win over content.
//!
//! The resulting [`MeasuredNode`] tree is read-only input to Pass 2. It also
//! fixes everything about a node that does not depend on the space it is
//! given: its inherited font size, its resolved direction, its natural
//! size, and its aspect ratio.

use log::trace;

use crate::error::LayoutError;
use crate::geometry::Size;
use crate::model::{Element, ElementKind, Orientation, Symbology};
use crate::style::{FlexContainer, ResolvedDirection, Style};
use crate::text::bidi::resolve_direction;
use crate::text::TextShaper;

use super::guard::ResourceGuard;

/// Quiet zone on each side of a QR symbol, in modules.
const QR_QUIET_MODULES: usize = 4;
/// Quiet zone of a Code 128 symbol, both sides together, in modules.
const CODE128_QUIET_MODULES: usize = 20;
/// Symbol height of a Code 128 barcode, in modules.
const CODE128_HEIGHT_MODULES: f32 = 12.0;

/// Content-driven size bounds of one node, border box, margins excluded.
///
/// `None` means the node has no content on that axis (an empty spacer).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IntrinsicSize {
    /// Min-content width: the narrowest the content can be laid out.
    pub min_width: Option<f32>,
    /// Max-content width: the content laid out without any wrapping.
    pub max_width: Option<f32>,
    /// Height at the max-content width.
    pub min_height: Option<f32>,
    /// Height at the min-content width.
    pub max_height: Option<f32>,
}

impl IntrinsicSize {
    fn exact(size: Size) -> Self {
        Self {
            min_width: Some(size.width),
            max_width: Some(size.width),
            min_height: Some(size.height),
            max_height: Some(size.height),
        }
    }

    pub fn min_content_width(&self) -> f32 {
        self.min_width.unwrap_or(0.0)
    }

    pub fn max_content_width(&self) -> f32 {
        self.max_width.or(self.min_width).unwrap_or(0.0)
    }

    pub fn min_content_height(&self) -> f32 {
        self.min_height.unwrap_or(0.0)
    }

    pub fn max_content_height(&self) -> f32 {
        self.max_height.or(self.min_height).unwrap_or(0.0)
    }
}

/// An element annotated with everything Pass 1 learned about it.
#[derive(Debug, Clone)]
pub struct MeasuredNode<'a> {
    pub element: &'a Element,
    /// Pre-order index among measured nodes; keys the Pass 2 cache.
    pub id: usize,
    pub intrinsic: IntrinsicSize,
    /// Min-content width of the content plus padding, before the node's
    /// own width applies. The basis of a row item's automatic minimum.
    pub content_min_width: f32,
    pub font_size: f32,
    pub direction: ResolvedDirection,
    /// Content-box size of leaf content that has one (images, codes,
    /// separators).
    pub natural: Option<Size>,
    /// Declared aspect ratio, or the natural ratio of an image.
    pub aspect_ratio: Option<f32>,
    /// Visible children, in document order.
    pub children: Vec<MeasuredNode<'a>>,
}

impl<'a> MeasuredNode<'a> {
    pub fn style(&self) -> &'a Style {
        &self.element.style
    }
}

/// Walks an element tree and produces its [`MeasuredNode`] tree.
pub struct IntrinsicPass<'s> {
    shaper: &'s dyn TextShaper,
    next_id: usize,
}

impl<'s> IntrinsicPass<'s> {
    pub fn new(shaper: &'s dyn TextShaper) -> Self {
        Self { shaper, next_id: 0 }
    }

    /// Number of nodes measured so far.
    pub fn node_count(&self) -> usize {
        self.next_id
    }

    /// Measure `element` and its visible descendants. Hidden elements are
    /// never passed in; callers filter `display: none` first.
    pub fn measure<'a>(
        &mut self,
        element: &'a Element,
        parent_font_size: f32,
        parent_direction: ResolvedDirection,
        guard: ResourceGuard,
    ) -> Result<MeasuredNode<'a>, LayoutError> {
        let style = &element.style;
        let id = self.next_id;
        self.next_id += 1;

        let font_size = style
            .font_size
            .filter(|fs| fs.is_finite() && *fs > 0.0)
            .unwrap_or(parent_font_size);
        let text_content = match &element.kind {
            ElementKind::Text { content, .. } => Some(content.as_str()),
            _ => None,
        };
        let direction = resolve_direction(style.direction, parent_direction, text_content);

        let mut natural = None;
        let mut children = Vec::new();

        let content = match &element.kind {
            ElementKind::Container { flex, children: elements } => {
                let guard = guard.descend()?;
                for child in elements.iter().filter(|c| !c.style.is_hidden()) {
                    children.push(self.measure(child, font_size, direction, guard)?);
                }
                container_content(flex, &children)
            }
            ElementKind::Text { content, wrap } => {
                let natural_run = self.shaper.shape(content, font_size, None);
                let min_width = if *wrap {
                    self.shaper.min_content_width(content, font_size)
                } else {
                    natural_run.size.width
                };
                let narrow_run = self.shaper.shape(content, font_size, Some(min_width));
                IntrinsicSize {
                    min_width: Some(min_width),
                    max_width: Some(natural_run.size.width),
                    min_height: Some(natural_run.size.height),
                    max_height: Some(narrow_run.size.height),
                }
            }
            ElementKind::Spacer => IntrinsicSize::default(),
            kind => {
                let size = natural_size(kind)?;
                natural = Some(size);
                IntrinsicSize::exact(size)
            }
        };

        let aspect_ratio = style.aspect_ratio().or(match element.kind {
            ElementKind::Image {
                natural_width,
                natural_height,
                ..
            } if natural_width > 0.0 && natural_height > 0.0 => Some(natural_width / natural_height),
            _ => None,
        });

        let content_min_width = content.min_content_width() + style.padding.horizontal();
        let intrinsic = apply_box(style, font_size, aspect_ratio, content);
        trace!("measured node {id}: {intrinsic:?}");

        Ok(MeasuredNode {
            element,
            id,
            intrinsic,
            content_min_width,
            font_size,
            direction,
            natural,
            aspect_ratio,
            children,
        })
    }
}

/// Natural content-box size of leaf content that is not text.
pub fn natural_size(kind: &ElementKind) -> Result<Size, LayoutError> {
    Ok(match kind {
        ElementKind::Image {
            natural_width,
            natural_height,
            ..
        } => Size::new(natural_width.max(0.0), natural_height.max(0.0)),
        ElementKind::Code {
            symbology: Symbology::Qr,
            data,
            module_size,
        } => {
            let code = qrcode::QrCode::new(data.as_bytes())
                .map_err(|e| LayoutError::Symbol(format!("QR data {data:?}: {e}")))?;
            let side = (code.width() + 2 * QR_QUIET_MODULES) as f32 * module_size.max(0.0);
            Size::new(side, side)
        }
        ElementKind::Code {
            symbology: Symbology::Code128,
            data,
            module_size,
        } => {
            if !data.is_ascii() {
                return Err(LayoutError::Symbol(format!(
                    "Code 128 data {data:?} is not ASCII"
                )));
            }
            // Start and check symbols, the data, the stop pattern and the quiet zone.
            let modules = 11 * (data.len() + 2) + 13 + CODE128_QUIET_MODULES;
            let module = module_size.max(0.0);
            Size::new(modules as f32 * module, CODE128_HEIGHT_MODULES * module)
        }
        ElementKind::Separator {
            orientation,
            thickness,
        } => match orientation {
            Orientation::Horizontal => Size::new(0.0, thickness.max(0.0)),
            Orientation::Vertical => Size::new(thickness.max(0.0), 0.0),
        },
        ElementKind::Container { .. } | ElementKind::Text { .. } | ElementKind::Spacer => Size::ZERO,
    })
}

fn sum_of(values: impl Iterator<Item = f32>) -> f32 {
    values.sum()
}

fn max_of(values: impl Iterator<Item = f32>) -> f32 {
    values.fold(0.0f32, f32::max)
}

fn outer_width(node: &MeasuredNode<'_>, content: fn(&IntrinsicSize) -> f32) -> f32 {
    content(&node.intrinsic) + node.style().margin.horizontal()
}

fn outer_height(node: &MeasuredNode<'_>, content: fn(&IntrinsicSize) -> f32) -> f32 {
    content(&node.intrinsic) + node.style().margin.vertical()
}

/// Content size of a container from its in-flow children's outer sizes.
fn container_content(flex: &FlexContainer, children: &[MeasuredNode<'_>]) -> IntrinsicSize {
    let in_flow: Vec<&MeasuredNode<'_>> = children
        .iter()
        .filter(|c| !c.style().is_absolute())
        .collect();
    if in_flow.is_empty() {
        return IntrinsicSize::default();
    }

    let min_w = |c: &&MeasuredNode<'_>| outer_width(c, IntrinsicSize::min_content_width);
    let max_w = |c: &&MeasuredNode<'_>| outer_width(c, IntrinsicSize::max_content_width);
    let min_h = |c: &&MeasuredNode<'_>| outer_height(c, IntrinsicSize::min_content_height);
    let max_h = |c: &&MeasuredNode<'_>| outer_height(c, IntrinsicSize::max_content_height);

    let gaps = |gap: f32| gap * (in_flow.len() - 1) as f32;
    let wraps = !matches!(flex.wrap, crate::style::FlexWrap::NoWrap);

    let (min_width, max_width, min_height, max_height) = if flex.direction.is_row() {
        let main_gaps = gaps(flex.column_gap);
        let min_width = if wraps {
            max_of(in_flow.iter().map(min_w))
        } else {
            sum_of(in_flow.iter().map(min_w)) + main_gaps
        };
        (
            min_width,
            sum_of(in_flow.iter().map(max_w)) + main_gaps,
            max_of(in_flow.iter().map(min_h)),
            max_of(in_flow.iter().map(max_h)),
        )
    } else {
        let main_gaps = gaps(flex.row_gap);
        (
            max_of(in_flow.iter().map(min_w)),
            max_of(in_flow.iter().map(max_w)),
            sum_of(in_flow.iter().map(min_h)) + main_gaps,
            sum_of(in_flow.iter().map(max_h)) + main_gaps,
        )
    };

    IntrinsicSize {
        min_width: Some(min_width),
        max_width: Some(max_width),
        min_height: Some(min_height),
        max_height: Some(max_height),
    }
}

/// Turn content-box bounds into border-box bounds: add padding, let
/// explicit sizes override, derive the missing axis from an aspect ratio,
/// and clamp by min/max. Percentages have no reference yet and are ignored.
fn apply_box(
    style: &Style,
    font_size: f32,
    aspect_ratio: Option<f32>,
    content: IntrinsicSize,
) -> IntrinsicSize {
    let pad_h = style.padding.horizontal();
    let pad_v = style.padding.vertical();
    let padded = |v: Option<f32>, pad: f32| match v {
        Some(v) => Some(v + pad),
        None if pad > 0.0 => Some(pad),
        None => None,
    };
    let mut size = IntrinsicSize {
        min_width: padded(content.min_width, pad_h),
        max_width: padded(content.max_width, pad_h),
        min_height: padded(content.min_height, pad_v),
        max_height: padded(content.max_height, pad_v),
    };

    let width = style.width.resolve_absolute(font_size);
    let height = style.height.resolve_absolute(font_size);
    if let Some(w) = width {
        size.min_width = Some(w);
        size.max_width = Some(w);
    }
    if let Some(h) = height {
        size.min_height = Some(h);
        size.max_height = Some(h);
    }
    if let Some(ratio) = aspect_ratio {
        match (width, height) {
            (Some(w), None) => {
                size.min_height = Some(w / ratio);
                size.max_height = Some(w / ratio);
            }
            (None, Some(h)) => {
                size.min_width = Some(h * ratio);
                size.max_width = Some(h * ratio);
            }
            _ => {}
        }
    }

    let clamp = |v: Option<f32>, min: Option<f32>, max: Option<f32>, floor: f32| {
        v.map(|v| {
            let v = max.map_or(v, |m| v.min(m));
            min.map_or(v, |m| v.max(m)).max(floor)
        })
    };
    let min_w = style.min_width.resolve_absolute(font_size);
    let max_w = style.max_width.resolve_absolute(font_size);
    let min_h = style.min_height.resolve_absolute(font_size);
    let max_h = style.max_height.resolve_absolute(font_size);

    IntrinsicSize {
        min_width: clamp(size.min_width, min_w, max_w, pad_h),
        max_width: clamp(size.max_width, min_w, max_w, pad_h),
        min_height: clamp(size.min_height, min_h, max_h, pad_v),
        max_height: clamp(size.max_height, min_h, max_h, pad_v),
    }
}
