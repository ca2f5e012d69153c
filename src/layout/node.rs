//! The positioned output tree a renderer walks.

use serde::{Serialize, Serializer};

use crate::geometry::Rect;
use crate::model::{element_kind_name, Element};
use crate::style::ResolvedDirection;

/// A positioned, sized element. Coordinates are absolute canvas pixels
/// with a top-left origin; `width`/`height` are the border box.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutNode<'a> {
    #[serde(serialize_with = "serialize_element")]
    pub element: &'a Element,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Direction the node's content is aligned in.
    pub direction: ResolvedDirection,
    /// In-flow children in placement order, then absolutely positioned ones.
    pub children: Vec<LayoutNode<'a>>,
    /// Pre-broken lines, only for text elements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextLines>,
}

/// Text exactly as it was measured, so the renderer never re-breaks it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLines {
    pub lines: Vec<String>,
    pub line_height: f32,
}

#[derive(Serialize)]
struct ElementSummary<'e> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'e str>,
}

fn serialize_element<S: Serializer>(element: &&Element, serializer: S) -> Result<S::Ok, S::Error> {
    ElementSummary {
        kind: element_kind_name(&element.kind),
        id: element.id.as_deref(),
    }
    .serialize(serializer)
}

impl<'a> LayoutNode<'a> {
    /// The border box.
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// The border box minus padding.
    pub fn content_box(&self) -> Rect {
        let p = &self.element.style.padding;
        self.rect().inset(p.top, p.right, p.bottom, p.left)
    }

    /// Pre-order walk over this node and all its descendants.
    pub fn iter(&self) -> Iter<'_, 'a> {
        Iter { stack: vec![self] }
    }

    /// The first node in pre-order whose element has the given id.
    pub fn find(&self, id: &str) -> Option<&LayoutNode<'a>> {
        self.iter().find(|n| n.element.id.as_deref() == Some(id))
    }
}

/// Pre-order iterator returned by [`LayoutNode::iter`].
pub struct Iter<'n, 'a> {
    stack: Vec<&'n LayoutNode<'a>>,
}

impl<'n, 'a> Iterator for Iter<'n, 'a> {
    type Item = &'n LayoutNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
