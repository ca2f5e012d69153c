//! # Layout Engine
//!
//! Turns an element tree into a tree of absolutely positioned boxes in two
//! passes:
//!
//! 1. **Intrinsic sizing** ([`intrinsic`]) walks bottom-up and records the
//!    min-content and max-content size of every visible element.
//! 2. **Flex resolution** walks top-down. Every container is *planned*:
//!    its in-flow children are broken into lines, their main sizes are
//!    resolved with the flexbox freeze loop, and both axes are aligned.
//!    The plan places children relative to the container's content box and
//!    the build step turns that into absolute [`LayoutNode`]s.
//!
//! Sizing a child sometimes requires planning it hypothetically (an
//! auto-height container inside a row, say). Those answers are cached per
//! layout call, keyed by node and constraints, so nested auto sizes cost a
//! constant factor per level instead of multiplying.
//!
//! Widths are always resolved before heights. A width never depends on
//! content height, except through an aspect ratio with a definite height.

pub mod flex;
pub mod guard;
pub mod intrinsic;
pub mod node;

use std::cell::RefCell;
use std::collections::HashMap;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::geometry::{Rect, Size};
use crate::model::{Canvas, Element, ElementKind};
use crate::style::{
    AlignContent, AlignItems, FlexContainer, FlexWrap, Overflow, Position, ResolvedDirection,
};
use crate::text::TextShaper;
use crate::unit::{Edges, Margin, Unit};

use flex::{FlexFactors, WrapLine};
use intrinsic::IntrinsicPass;

pub use guard::{ResourceGuard, ResourceLimits};
pub use intrinsic::{IntrinsicSize, MeasuredNode};
pub use node::{LayoutNode, TextLines};

/// Ascent of a text line as a fraction of its line height. Used for
/// baseline alignment, where the shaper reports no font metrics.
const BASELINE_RATIO: f32 = 0.8;

/// Per-call configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutOptions {
    pub limits: ResourceLimits,
    /// Font size of the root element, in pixels.
    pub base_font_size: f32,
    /// Direction the root element inherits.
    pub direction: ResolvedDirection,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            limits: ResourceLimits::default(),
            base_font_size: 16.0,
            direction: ResolvedDirection::Ltr,
        }
    }
}

/// The main layout engine.
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    options: LayoutOptions,
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: LayoutOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Main entry point: lay out `root` on `canvas`, measuring text with
    /// `shaper`. The root box always starts at the canvas origin; its
    /// margins are ignored.
    pub fn layout<'a>(
        &self,
        root: &'a Element,
        canvas: Canvas,
        shaper: &dyn TextShaper,
    ) -> Result<LayoutNode<'a>, LayoutError> {
        debug!("layout start: canvas {canvas:?}");
        let guard = ResourceGuard::new(self.options.limits);
        let base_font_size = Some(self.options.base_font_size)
            .filter(|fs| fs.is_finite() && *fs > 0.0)
            .unwrap_or(16.0);

        if root.style.is_hidden() {
            let width = canvas.fixed_width().unwrap_or(0.0);
            let height = canvas.fixed_height().unwrap_or(0.0);
            debug!("root is display:none; emitting an empty {width}x{height} box");
            return Ok(LayoutNode {
                element: root,
                x: 0.0,
                y: 0.0,
                width,
                height,
                direction: self.options.direction,
                children: vec![],
                text: None,
            });
        }

        let mut pass = IntrinsicPass::new(shaper);
        let measured = pass.measure(root, base_font_size, self.options.direction, guard)?;
        debug!("intrinsic pass measured {} nodes", pass.node_count());

        let solver = Solver::new(shaper, guard);
        let size = solver.canvas_size(&measured, canvas)?;
        let rect = Rect::new(0.0, 0.0, size.width, size.height);
        let tree = solver.build(&measured, rect, rect)?;

        debug!(
            "layout done: {}x{}, {} nodes",
            tree.width,
            tree.height,
            tree.iter().count()
        );
        Ok(tree)
    }
}

/// Constraints for sizing one node. All sizes are border-box pixels.
#[derive(Debug, Clone, Copy, Default)]
struct SizingInput {
    /// Width already decided by the parent (a flex main size or stretch).
    known_width: Option<f32>,
    known_height: Option<f32>,
    /// The parent's content box, the reference for percentages.
    parent_width: Option<f32>,
    parent_height: Option<f32>,
    /// Space an auto width may fill. `None` means max-content.
    available_width: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SizeKey {
    id: usize,
    constraints: [Option<u32>; 5],
}

impl SizingInput {
    fn key(&self, id: usize) -> SizeKey {
        let bits = |v: Option<f32>| v.map(f32::to_bits);
        SizeKey {
            id,
            constraints: [
                bits(self.known_width),
                bits(self.known_height),
                bits(self.parent_width),
                bits(self.parent_height),
                bits(self.available_width),
            ],
        }
    }
}

/// A node's own size properties resolved against its parent's content box.
/// `Auto` minimums are zero and `Auto` maximums unbounded.
#[derive(Debug, Clone, Copy)]
struct BoxSizes {
    width: Option<f32>,
    height: Option<f32>,
    min_width: f32,
    max_width: f32,
    min_height: f32,
    max_height: f32,
    padding: Edges<f32>,
}

impl BoxSizes {
    fn resolve(node: &MeasuredNode<'_>, parent_width: Option<f32>, parent_height: Option<f32>) -> Self {
        let style = node.style();
        let fs = node.font_size;
        Self {
            width: style.width.resolve(parent_width, fs).map(|v| v.max(0.0)),
            height: style.height.resolve(parent_height, fs).map(|v| v.max(0.0)),
            min_width: style.min_width.resolve(parent_width, fs).unwrap_or(0.0),
            max_width: style.max_width.resolve(parent_width, fs).unwrap_or(f32::INFINITY),
            min_height: style.min_height.resolve(parent_height, fs).unwrap_or(0.0),
            max_height: style
                .max_height
                .resolve(parent_height, fs)
                .unwrap_or(f32::INFINITY),
            padding: style.padding,
        }
    }

    fn clamp_width(&self, width: f32) -> f32 {
        width
            .min(self.max_width)
            .max(self.min_width)
            .max(self.padding.horizontal())
            .max(0.0)
    }

    fn clamp_height(&self, height: f32) -> f32 {
        height
            .min(self.max_height)
            .max(self.min_height)
            .max(self.padding.vertical())
            .max(0.0)
    }
}

/// Fit-content width from intrinsic bounds: the max-content width, but no
/// wider than the available space and no narrower than the min-content width.
fn fit_content(intrinsic: &IntrinsicSize, available: Option<f32>) -> f32 {
    let max_content = intrinsic.max_content_width();
    match available {
        Some(available) => max_content.min(available.max(intrinsic.min_content_width())),
        None => max_content,
    }
}

fn margin_value(margin: Margin, auto_share: f32) -> f32 {
    match margin {
        Margin::Fixed(v) => v,
        Margin::Auto => auto_share,
    }
}

/// Where a container's in-flow children go.
#[derive(Debug, Clone, Default)]
struct FlexPlan {
    /// `(child index, border box relative to the content box origin)`,
    /// in output order.
    placements: Vec<(usize, Rect)>,
    /// Extent of the content box that the plan filled.
    content: Size,
}

/// Per-item working state while planning a container.
struct FlexItem<'m, 'a> {
    index: usize,
    node: &'m MeasuredNode<'a>,
    factors: FlexFactors,
    main_margins: (Margin, Margin),
    cross_margins: (Margin, Margin),
    align: AlignItems,
    /// Auto cross size, no aspect ratio, no auto cross margins.
    stretches: bool,
    main: f32,
    cross: f32,
    /// Outer cross-start edge to the first baseline.
    baseline: f32,
}

impl FlexItem<'_, '_> {
    fn cross_margin_sum(&self) -> f32 {
        self.cross_margins.0.fixed() + self.cross_margins.1.fixed()
    }

    fn has_auto_cross_margin(&self) -> bool {
        self.cross_margins.0.is_auto() || self.cross_margins.1.is_auto()
    }

    fn auto_main_margins(&self) -> usize {
        self.main_margins.0.is_auto() as usize + self.main_margins.1.is_auto() as usize
    }

    fn aligns_baseline(&self, row: bool) -> bool {
        row && self.align == AlignItems::Baseline && !self.has_auto_cross_margin()
    }
}

/// Pass 2 state for one layout call.
struct Solver<'s> {
    shaper: &'s dyn TextShaper,
    guard: ResourceGuard,
    sizes: RefCell<HashMap<SizeKey, Size>>,
    content_heights: RefCell<HashMap<(usize, u32), f32>>,
}

impl<'s> Solver<'s> {
    fn new(shaper: &'s dyn TextShaper, guard: ResourceGuard) -> Self {
        Self {
            shaper,
            guard,
            sizes: RefCell::new(HashMap::new()),
            content_heights: RefCell::new(HashMap::new()),
        }
    }

    /// The root box: fixed dimensions come from the canvas, the free one
    /// is measured.
    fn canvas_size(&self, root: &MeasuredNode<'_>, canvas: Canvas) -> Result<Size, LayoutError> {
        match (canvas.fixed_width(), canvas.fixed_height()) {
            (Some(width), Some(height)) => Ok(Size::new(width, height)),
            (Some(width), None) => {
                let size = self.node_size(
                    root,
                    SizingInput {
                        known_width: Some(width),
                        parent_width: Some(width),
                        ..Default::default()
                    },
                )?;
                Ok(Size::new(width, size.height))
            }
            (None, Some(height)) => {
                let width = self.node_width(
                    root,
                    SizingInput {
                        known_height: Some(height),
                        parent_height: Some(height),
                        ..Default::default()
                    },
                );
                Ok(Size::new(width, height))
            }
            (None, None) => self.node_size(root, SizingInput::default()),
        }
    }

    /// Border-box width. Infallible: widths come from styles and Pass 1.
    fn node_width(&self, node: &MeasuredNode<'_>, input: SizingInput) -> f32 {
        if let Some(width) = input.known_width {
            return width;
        }
        let b = BoxSizes::resolve(node, input.parent_width, input.parent_height);
        let definite_height = input
            .known_height
            .or_else(|| b.height.map(|h| b.clamp_height(h)));
        let width = b
            .width
            .or_else(|| node.aspect_ratio.zip(definite_height).map(|(r, h)| h * r))
            .unwrap_or_else(|| fit_content(&node.intrinsic, input.available_width));
        b.clamp_width(width)
    }

    /// Border-box size.
    fn node_size(&self, node: &MeasuredNode<'_>, input: SizingInput) -> Result<Size, LayoutError> {
        let key = input.key(node.id);
        let cached = self.sizes.borrow().get(&key).copied();
        if let Some(size) = cached {
            return Ok(size);
        }

        let b = BoxSizes::resolve(node, input.parent_width, input.parent_height);
        let width = self.node_width(node, input);
        let height = match input.known_height {
            Some(height) => height,
            None => {
                let height = match b.height.or_else(|| node.aspect_ratio.map(|r| width / r)) {
                    Some(h) => h,
                    None => self.content_height(node, width)?,
                };
                b.clamp_height(height)
            }
        };

        let size = Size::new(width, height);
        self.sizes.borrow_mut().insert(key, size);
        Ok(size)
    }

    /// Border-box height the content needs at `width`, ignoring the node's
    /// own height properties.
    fn content_height(&self, node: &MeasuredNode<'_>, width: f32) -> Result<f32, LayoutError> {
        let key = (node.id, width.to_bits());
        let cached = self.content_heights.borrow().get(&key).copied();
        if let Some(height) = cached {
            return Ok(height);
        }

        let padding = node.style().padding;
        let content_width = (width - padding.horizontal()).max(0.0);
        let content = match &node.element.kind {
            ElementKind::Container { .. } => {
                self.plan_container(node, content_width, None)?.content.height
            }
            ElementKind::Text { content, wrap } => {
                self.shaper
                    .shape(content, node.font_size, wrap.then_some(content_width))
                    .size
                    .height
            }
            _ => node.natural.map_or(0.0, |s| s.height),
        };

        let height = content + padding.vertical();
        self.content_heights.borrow_mut().insert(key, height);
        Ok(height)
    }

    /// Resolve an item's flex factors and hypothetical cross size.
    fn flex_item<'m, 'a>(
        &self,
        child: &'m MeasuredNode<'a>,
        index: usize,
        flex: &FlexContainer,
        inner_width: f32,
        inner_height: Option<f32>,
    ) -> Result<FlexItem<'m, 'a>, LayoutError> {
        let row = flex.direction.is_row();
        let style = child.style();
        let fs = child.font_size;
        let m = &style.margin;
        let (main_margins, cross_margins) = if row {
            ((m.left, m.right), (m.top, m.bottom))
        } else {
            ((m.top, m.bottom), (m.left, m.right))
        };
        let align = style.align_self.unwrap_or(flex.align_items);

        let b = BoxSizes::resolve(child, Some(inner_width), inner_height);
        let cross_auto = if row { b.height.is_none() } else { b.width.is_none() };
        let stretches = align == AlignItems::Stretch
            && cross_auto
            && child.aspect_ratio.is_none()
            && !cross_margins.0.is_auto()
            && !cross_margins.1.is_auto();

        let input = SizingInput {
            parent_width: Some(inner_width),
            parent_height: inner_height,
            ..Default::default()
        };
        let inner_main = if row { Some(inner_width) } else { inner_height };
        let basis = style.flex_basis.resolve(inner_main, fs);

        // Main-axis base size, cross size before stretching, and the
        // min-content main size.
        let (base, cross, min_content) = if row {
            let base = match basis {
                Some(basis) => basis,
                None => self.node_width(child, input),
            };
            (base, 0.0, child.content_min_width)
        } else {
            let available = (inner_width - m.horizontal()).max(0.0);
            // A single line's cross size is the container's, so stretch now;
            // the main size then follows from the final width.
            let width = if stretches && flex.wrap == FlexWrap::NoWrap {
                b.clamp_width(available)
            } else {
                self.node_width(
                    child,
                    SizingInput {
                        available_width: Some(available),
                        ..input
                    },
                )
            };
            let base = match basis {
                Some(basis) => basis,
                None => {
                    self.node_size(
                        child,
                        SizingInput {
                            known_width: Some(width),
                            ..input
                        },
                    )?
                    .height
                }
            };
            (base, width, self.content_height(child, width)?)
        };

        let (min_unit, specified, max_main, padding_main) = if row {
            (&style.min_width, b.width, b.max_width, b.padding.horizontal())
        } else {
            (&style.min_height, b.height, b.max_height, b.padding.vertical())
        };
        let min_main = match min_unit.resolve(inner_main, fs) {
            Some(min) => min,
            None => {
                // Automatic minimum size: content that does not clip cannot
                // shrink below its min-content size.
                let clips = child
                    .element
                    .flex()
                    .is_some_and(|f| f.overflow != Overflow::Visible);
                if clips {
                    0.0
                } else {
                    let auto_min = specified.map_or(min_content, |s| min_content.min(s));
                    auto_min.min(max_main)
                }
            }
        };

        Ok(FlexItem {
            index,
            node: child,
            factors: FlexFactors {
                base: base.max(0.0),
                min: min_main.max(padding_main),
                max: max_main,
                grow: style.flex_grow.max(0.0),
                shrink: style.flex_shrink.max(0.0),
                margin: main_margins.0.fixed() + main_margins.1.fixed(),
            },
            main_margins,
            cross_margins,
            align,
            stretches,
            main: 0.0,
            cross,
            baseline: 0.0,
        })
    }

    /// Distance from an item's border-box top to its first baseline.
    fn first_baseline(&self, item: &FlexItem<'_, '_>) -> f32 {
        let node = item.node;
        match &node.element.kind {
            ElementKind::Text { content, wrap } => {
                let padding = node.style().padding;
                let content_width = (item.main - padding.horizontal()).max(0.0);
                let shaped = self
                    .shaper
                    .shape(content, node.font_size, wrap.then_some(content_width));
                padding.top + shaped.line_height * BASELINE_RATIO
            }
            _ => item.cross,
        }
    }

    /// Offset of an item's border box from its line's cross-start edge.
    fn cross_offset(item: &FlexItem<'_, '_>, line_size: f32, line_ascent: f32, row: bool) -> f32 {
        let (start, end) = item.cross_margins;
        let free = line_size - item.cross - item.cross_margin_sum();
        if item.has_auto_cross_margin() {
            let free = free.max(0.0);
            return match (start.is_auto(), end.is_auto()) {
                (true, true) => free / 2.0,
                (true, false) => free,
                _ => start.fixed(),
            };
        }
        match item.align {
            AlignItems::Start | AlignItems::Stretch => start.fixed(),
            AlignItems::End => line_size - item.cross - end.fixed(),
            AlignItems::Center => start.fixed() + free / 2.0,
            AlignItems::Baseline if row => line_ascent - item.baseline,
            AlignItems::Baseline => start.fixed(),
        }
    }

    /// Plan a container's in-flow children inside a content box of
    /// `inner_width` × `inner_height` (`None`: height still unknown).
    fn plan_container(
        &self,
        node: &MeasuredNode<'_>,
        inner_width: f32,
        inner_height: Option<f32>,
    ) -> Result<FlexPlan, LayoutError> {
        let Some(flex) = node.element.flex() else {
            return Ok(FlexPlan::default());
        };
        let row = flex.direction.is_row();
        let (main_gap, cross_gap) = if row {
            (flex.column_gap, flex.row_gap)
        } else {
            (flex.row_gap, flex.column_gap)
        };
        let inner_main = if row { Some(inner_width) } else { inner_height };
        let inner_cross = if row { inner_height } else { Some(inner_width) };

        let mut order: Vec<usize> = (0..node.children.len())
            .filter(|&i| !node.children[i].style().is_absolute())
            .collect();
        order.sort_by_key(|&i| node.children[i].style().order);

        let mut items = Vec::with_capacity(order.len());
        for index in order {
            items.push(self.flex_item(&node.children[index], index, flex, inner_width, inner_height)?);
        }

        // Phase 1: break into lines
        let lines = match (flex.wrap, inner_main) {
            _ if items.is_empty() => vec![],
            (FlexWrap::NoWrap, _) | (_, None) => vec![WrapLine {
                start: 0,
                end: items.len(),
            }],
            (_, Some(available)) => {
                let outer: Vec<f32> = items
                    .iter()
                    .map(|i| i.factors.hypothetical() + i.factors.margin)
                    .collect();
                flex::partition_into_lines(&outer, main_gap, available)
            }
        };
        self.guard.check_lines(lines.len())?;

        // Phase 2: resolve main sizes per line, then hypothetical cross sizes
        for line in &lines {
            let slice = &mut items[line.start..line.end];
            match inner_main {
                Some(main) => {
                    let gaps = main_gap * (line.len() - 1) as f32;
                    let factors: Vec<FlexFactors> = slice.iter().map(|i| i.factors).collect();
                    let sizes = flex::resolve_flexible_lengths(&factors, main - gaps);
                    for (item, size) in slice.iter_mut().zip(sizes) {
                        item.main = size;
                    }
                }
                None => {
                    for item in slice.iter_mut() {
                        item.main = item.factors.hypothetical();
                    }
                }
            }
        }

        let input = SizingInput {
            parent_width: Some(inner_width),
            parent_height: inner_height,
            ..Default::default()
        };
        for item in items.iter_mut() {
            if row {
                item.cross = self
                    .node_size(
                        item.node,
                        SizingInput {
                            known_width: Some(item.main),
                            ..input
                        },
                    )?
                    .height;
            }
            if item.aligns_baseline(row) {
                item.baseline = self.first_baseline(item);
            }
        }

        // Phase 3: line cross sizes
        let mut line_sizes = Vec::with_capacity(lines.len());
        let mut line_ascents = Vec::with_capacity(lines.len());
        for line in &lines {
            let (mut size, mut ascent, mut descent) = (0.0f32, 0.0f32, 0.0f32);
            for item in &items[line.start..line.end] {
                let outer = item.cross + item.cross_margin_sum();
                if item.aligns_baseline(row) {
                    let above = item.cross_margins.0.fixed() + item.baseline;
                    ascent = ascent.max(above);
                    descent = descent.max(outer - above);
                } else {
                    size = size.max(outer);
                }
            }
            line_sizes.push(size.max(ascent + descent));
            line_ascents.push(ascent);
        }
        if flex.wrap == FlexWrap::NoWrap {
            if let (Some(first), Some(cross)) = (line_sizes.first_mut(), inner_cross) {
                *first = cross;
            }
        }

        // Phase 4: align-content across lines
        let line_count = lines.len();
        let gaps_between_lines = cross_gap * line_count.saturating_sub(1) as f32;
        let (mut cross_pos, mut line_between) = (0.0, 0.0);
        if line_count > 1 {
            if let Some(cross) = inner_cross {
                let free = cross - line_sizes.iter().sum::<f32>() - gaps_between_lines;
                if flex.align_content == AlignContent::Stretch && free > 0.0 {
                    let extra = free / line_count as f32;
                    for size in line_sizes.iter_mut() {
                        *size += extra;
                    }
                } else {
                    (cross_pos, line_between) =
                        flex::align_content_offsets(flex.align_content, free, line_count);
                }
            }
        }

        // Phase 5: place items along both axes
        let mut placed: Vec<(usize, Rect)> = Vec::with_capacity(items.len());
        let mut main_used = 0.0f32;
        for (line_index, line) in lines.iter().enumerate() {
            let line_size = line_sizes[line_index];
            let slice = &mut items[line.start..line.end];

            for item in slice.iter_mut().filter(|i| i.stretches) {
                let b = BoxSizes::resolve(item.node, Some(inner_width), inner_height);
                let available = (line_size - item.cross_margin_sum()).max(0.0);
                item.cross = if row {
                    b.clamp_height(available)
                } else {
                    b.clamp_width(available)
                };
            }

            let gaps = main_gap * (line.len() - 1) as f32;
            let used: f32 = slice.iter().map(|i| i.main + i.factors.margin).sum::<f32>() + gaps;
            main_used = main_used.max(used);
            let free = inner_main.map_or(0.0, |main| main - used);

            // Auto margins take positive free space before justify-content.
            let auto_margins: usize = slice.iter().map(FlexItem::auto_main_margins).sum();
            let (start, between, auto_share) = if auto_margins > 0 && free > 0.0 {
                (0.0, 0.0, free / auto_margins as f32)
            } else {
                let (start, between) = flex::justify_offsets(flex.justify_content, free, slice.len());
                (start, between, 0.0)
            };

            let mut main_pos = start;
            for (j, item) in slice.iter().enumerate() {
                if j > 0 {
                    main_pos += main_gap + between;
                }
                main_pos += margin_value(item.main_margins.0, auto_share);
                let cross_at = cross_pos + Self::cross_offset(item, line_size, line_ascents[line_index], row);
                let rect = if row {
                    Rect::new(main_pos, cross_at, item.main, item.cross)
                } else {
                    Rect::new(cross_at, main_pos, item.cross, item.main)
                };
                placed.push((item.index, rect));
                main_pos += item.main + margin_value(item.main_margins.1, auto_share);
            }

            cross_pos += line_size + cross_gap + line_between;
        }

        let cross_used = line_sizes.iter().sum::<f32>() + gaps_between_lines;
        let content = if row {
            Size::new(inner_width, inner_height.unwrap_or(cross_used))
        } else {
            Size::new(inner_width, inner_height.unwrap_or(main_used))
        };

        // Reverse directions run from the main-end edge, wrap-reverse from
        // the cross-end edge, and right-to-left mirrors horizontally.
        let main_mirror = flex.direction.is_reverse();
        let cross_mirror = flex.wrap == FlexWrap::WrapReverse;
        let rtl = node.direction.is_rtl();
        let (mirror_x, mirror_y) = if row {
            (main_mirror ^ rtl, cross_mirror)
        } else {
            (cross_mirror ^ rtl, main_mirror)
        };
        for (_, rect) in placed.iter_mut() {
            if mirror_x {
                rect.x = content.width - rect.x - rect.width;
            }
            if mirror_y {
                rect.y = content.height - rect.y - rect.height;
            }
        }
        if main_mirror {
            placed.reverse();
        }

        trace!(
            "planned container {}: {} items on {} lines, content {}x{}",
            node.id,
            placed.len(),
            line_count,
            content.width,
            content.height
        );

        Ok(FlexPlan {
            placements: placed,
            content,
        })
    }

    /// Shift of a relatively positioned item, resolved against its
    /// parent's content box.
    fn relative_offset(node: &MeasuredNode<'_>, parent: Rect) -> (f32, f32) {
        let style = node.style();
        if style.position != Position::Relative {
            return (0.0, 0.0);
        }
        let fs = node.font_size;
        let inset = &style.inset;
        let resolve = |side: Option<Unit>, reference: f32| {
            side.and_then(|u| u.resolve(Some(reference), fs))
        };
        // Both horizontal insets set: the start side wins.
        let dx = match (resolve(inset.left, parent.width), resolve(inset.right, parent.width)) {
            (Some(_), Some(right)) if node.direction.is_rtl() => -right,
            (Some(left), _) => left,
            (None, Some(right)) => -right,
            (None, None) => 0.0,
        };
        let dy = match (resolve(inset.top, parent.height), resolve(inset.bottom, parent.height)) {
            (Some(top), _) => top,
            (None, Some(bottom)) => -bottom,
            (None, None) => 0.0,
        };
        (dx, dy)
    }

    /// Border box of an absolutely positioned item. Insets are measured
    /// from the containing block; a missing pair on an axis falls back to
    /// the item's static position at the parent's content start.
    fn place_absolute(
        &self,
        node: &MeasuredNode<'_>,
        containing_block: Rect,
        parent_content: Rect,
        rtl: bool,
    ) -> Result<Rect, LayoutError> {
        let style = node.style();
        let fs = node.font_size;
        let cb = containing_block;
        let inset = &style.inset;
        let m = &style.margin;
        let left = inset.left.and_then(|u| u.resolve(Some(cb.width), fs));
        let right = inset.right.and_then(|u| u.resolve(Some(cb.width), fs));
        let top = inset.top.and_then(|u| u.resolve(Some(cb.height), fs));
        let bottom = inset.bottom.and_then(|u| u.resolve(Some(cb.height), fs));

        let b = BoxSizes::resolve(node, Some(cb.width), Some(cb.height));
        let input = SizingInput {
            parent_width: Some(cb.width),
            parent_height: Some(cb.height),
            ..Default::default()
        };

        let known_width = match (b.width, left, right) {
            (None, Some(l), Some(r)) => Some(b.clamp_width(cb.width - l - r - m.horizontal())),
            _ => None,
        };
        let available = cb.width - left.unwrap_or(0.0) - right.unwrap_or(0.0) - m.horizontal();
        let width = self.node_width(
            node,
            SizingInput {
                known_width,
                available_width: Some(available.max(0.0)),
                ..input
            },
        );
        let known_height = match (b.height, top, bottom) {
            (None, Some(t), Some(bo)) => Some(b.clamp_height(cb.height - t - bo - m.vertical())),
            _ => None,
        };
        let size = self.node_size(
            node,
            SizingInput {
                known_width: Some(width),
                known_height,
                ..input
            },
        )?;

        let x = match (left, right) {
            (Some(l), _) => cb.x + l + m.left.fixed(),
            (None, Some(r)) => cb.right() - r - m.right.fixed() - size.width,
            (None, None) if rtl => parent_content.right() - m.right.fixed() - size.width,
            (None, None) => parent_content.x + m.left.fixed(),
        };
        let y = match (top, bottom) {
            (Some(t), _) => cb.y + t + m.top.fixed(),
            (None, Some(bo)) => cb.bottom() - bo - m.bottom.fixed() - size.height,
            (None, None) => parent_content.y + m.top.fixed(),
        };
        Ok(Rect::new(x, y, size.width, size.height))
    }

    /// Build the output node for `node`, whose border box is `rect`.
    /// `containing_block` is the padding box absolutely positioned children
    /// are placed against.
    fn build<'a>(
        &self,
        node: &MeasuredNode<'a>,
        rect: Rect,
        containing_block: Rect,
    ) -> Result<LayoutNode<'a>, LayoutError> {
        let p = &node.style().padding;
        let content_box = rect.inset(p.top, p.right, p.bottom, p.left);
        let mut children = Vec::with_capacity(node.children.len());
        let mut text = None;

        match &node.element.kind {
            ElementKind::Container { .. } => {
                let plan = self.plan_container(node, content_box.width, Some(content_box.height))?;
                for (index, local) in plan.placements {
                    let child = &node.children[index];
                    let (dx, dy) = Self::relative_offset(child, content_box);
                    let child_rect = Rect::new(
                        content_box.x + local.x + dx,
                        content_box.y + local.y + dy,
                        local.width,
                        local.height,
                    );
                    let child_cb = if child.style().position == Position::Static {
                        containing_block
                    } else {
                        child_rect
                    };
                    children.push(self.build(child, child_rect, child_cb)?);
                }

                let mut absolute: Vec<&MeasuredNode<'a>> = node
                    .children
                    .iter()
                    .filter(|c| c.style().is_absolute())
                    .collect();
                absolute.sort_by_key(|c| c.style().order);
                for child in absolute {
                    let child_rect = self.place_absolute(
                        child,
                        containing_block,
                        content_box,
                        node.direction.is_rtl(),
                    )?;
                    children.push(self.build(child, child_rect, child_rect)?);
                }
            }
            ElementKind::Text { content, wrap } => {
                let shaped = self.shaper.shape(
                    content,
                    node.font_size,
                    wrap.then_some(content_box.width),
                );
                text = Some(TextLines {
                    lines: shaped.lines,
                    line_height: shaped.line_height,
                });
            }
            _ => {}
        }

        Ok(LayoutNode {
            element: node.element,
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            direction: node.direction,
            children,
            text,
        })
    }
}
