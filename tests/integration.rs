//! Integration tests for the Labelform layout pipeline.
//!
//! These tests exercise the full path from an element tree (or JSON) to the
//! positioned layout tree. They verify:
//! - Space distribution along the main axis (grow, shrink, justify)
//! - Wrapping into multiple lines and cross-axis sizing
//! - Auto margins, aspect ratios, positioning and RTL mirroring
//! - Resource guards and error reporting
//! - Deterministic, serializable output

use labelform::error::{LayoutError, Resource};
use labelform::layout::{LayoutEngine, LayoutOptions, ResourceLimits};
use labelform::model::*;
use labelform::style::*;
use labelform::text::{shape_with, ShapedText, TextShaper};
use labelform::unit::{Edges, Margin, Unit};

// ─── Helpers ────────────────────────────────────────────────────

/// Every character is 10px wide and every line 20px tall.
struct Mono;

impl TextShaper for Mono {
    fn shape(&self, content: &str, _font_size: f32, max_width: Option<f32>) -> ShapedText {
        shape_with(content, max_width, 20.0, |_| 10.0)
    }
}

fn make_text(content: &str) -> Element {
    Element::text(content, Style::default())
}

fn make_box(width: f32, height: f32) -> Element {
    Element::spacer(Style {
        width: Unit::px(width),
        height: Unit::px(height),
        ..Default::default()
    })
}

fn make_grow(grow: f32) -> Element {
    Element::spacer(Style {
        flex_grow: grow,
        ..Default::default()
    })
}

fn make_row(children: Vec<Element>) -> Element {
    Element::container(FlexContainer::default(), Style::default(), children)
}

fn make_flex(flex: FlexContainer, children: Vec<Element>) -> Element {
    Element::container(flex, Style::default(), children)
}

fn column() -> FlexContainer {
    FlexContainer {
        direction: FlexDirection::Column,
        ..Default::default()
    }
}

fn layout_doc(document: &Document) -> labelform::LayoutNode<'_> {
    labelform::layout_with_shaper(document, &Mono).unwrap()
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 0.01
}

// ─── Main Axis ──────────────────────────────────────────────────

#[test]
fn test_equal_grow_splits_row() {
    let doc = Document::new(
        Canvas::Width { width: 300.0 },
        make_row(vec![make_grow(1.0), make_grow(1.0), make_grow(1.0)]),
    );
    let tree = layout_doc(&doc);

    assert_eq!(tree.children.len(), 3);
    for (i, child) in tree.children.iter().enumerate() {
        assert!(approx(child.width, 100.0), "child {i} width {}", child.width);
        assert!(approx(child.x, 100.0 * i as f32), "child {i} x {}", child.x);
    }
}

#[test]
fn test_grow_ratio() {
    let doc = Document::new(
        Canvas::Both {
            width: 400.0,
            height: 20.0,
        },
        make_row(vec![make_grow(1.0), make_grow(3.0)]),
    );
    let tree = layout_doc(&doc);
    assert!(approx(tree.children[0].width, 100.0));
    assert!(approx(tree.children[1].width, 300.0));
    assert!(approx(tree.children[1].x, 100.0));
}

#[test]
fn test_equal_fractional_grow_fills_row() {
    let doc = Document::new(
        Canvas::Both {
            width: 100.0,
            height: 10.0,
        },
        make_row(vec![make_grow(0.25), make_grow(0.25)]),
    );
    let tree = layout_doc(&doc);
    assert!(approx(tree.children[0].width, 50.0));
    assert!(approx(tree.children[1].width, 50.0));
    assert!(approx(tree.children[1].x, 50.0));
}

#[test]
fn test_space_between() {
    let flex = FlexContainer {
        justify_content: JustifyContent::SpaceBetween,
        ..Default::default()
    };
    let doc = Document::new(
        Canvas::Both {
            width: 100.0,
            height: 20.0,
        },
        make_flex(flex, vec![make_box(20.0, 20.0), make_box(20.0, 20.0)]),
    );
    let tree = layout_doc(&doc);
    assert!(approx(tree.children[0].x, 0.0));
    assert!(approx(tree.children[1].x, 80.0));
}

#[test]
fn test_space_evenly_and_around() {
    let evenly = FlexContainer {
        justify_content: JustifyContent::SpaceEvenly,
        ..Default::default()
    };
    let doc = Document::new(
        Canvas::Both {
            width: 100.0,
            height: 10.0,
        },
        make_flex(evenly, vec![make_box(20.0, 10.0), make_box(20.0, 10.0)]),
    );
    let tree = layout_doc(&doc);
    assert!(approx(tree.children[0].x, 20.0));
    assert!(approx(tree.children[1].x, 60.0));

    let around = FlexContainer {
        justify_content: JustifyContent::SpaceAround,
        ..Default::default()
    };
    let doc = Document::new(
        Canvas::Both {
            width: 100.0,
            height: 10.0,
        },
        make_flex(around, vec![make_box(20.0, 10.0), make_box(20.0, 10.0)]),
    );
    let tree = layout_doc(&doc);
    assert!(approx(tree.children[0].x, 15.0));
    assert!(approx(tree.children[1].x, 65.0));
}

#[test]
fn test_overflow_falls_back_from_space_between() {
    let flex = FlexContainer {
        justify_content: JustifyContent::SpaceBetween,
        ..Default::default()
    };
    let rigid = |w: f32| {
        Element::spacer(Style {
            width: Unit::px(w),
            min_width: Unit::px(w),
            ..Default::default()
        })
    };
    let doc = Document::new(
        Canvas::Both {
            width: 100.0,
            height: 10.0,
        },
        make_flex(flex, vec![rigid(80.0), rigid(80.0)]),
    );
    let tree = layout_doc(&doc);
    assert!(approx(tree.children[0].x, 0.0));
    assert!(approx(tree.children[1].x, 80.0));
}

#[test]
fn test_shrink_never_goes_negative() {
    let heavy = Element::spacer(Style {
        width: Unit::px(100.0),
        flex_shrink: 10.0,
        ..Default::default()
    });
    let doc = Document::new(
        Canvas::Both {
            width: 50.0,
            height: 10.0,
        },
        make_row(vec![heavy, make_box(40.0, 10.0), make_box(40.0, 10.0)]),
    );
    let tree = layout_doc(&doc);
    for child in &tree.children {
        assert!(child.width >= 0.0, "negative width {}", child.width);
    }
}

// ─── Wrapping ───────────────────────────────────────────────────

#[test]
fn test_wrap_moves_item_to_second_line() {
    let flex = FlexContainer {
        wrap: FlexWrap::Wrap,
        ..Default::default()
    };
    let doc = Document::new(
        Canvas::Width { width: 100.0 },
        make_flex(flex, vec![make_text("abcdef"), make_text("abcdef")]),
    );
    let tree = layout_doc(&doc);

    assert!(approx(tree.children[0].width, 60.0));
    assert!(approx(tree.children[0].y, 0.0));
    assert!(approx(tree.children[1].x, 0.0));
    assert!(approx(tree.children[1].y, 20.0));
    assert!(approx(tree.height, 40.0));
}

#[test]
fn test_nowrap_keeps_one_line() {
    let doc = Document::new(
        Canvas::Width { width: 100.0 },
        make_row(vec![make_text("abcdef"), make_text("abcdef")]),
    );
    let tree = layout_doc(&doc);
    assert!(approx(tree.children[0].y, 0.0));
    assert!(approx(tree.children[1].y, 0.0));
}

#[test]
fn test_column_wraps_into_columns() {
    let flex = FlexContainer {
        direction: FlexDirection::Column,
        wrap: FlexWrap::Wrap,
        column_gap: 10.0,
        ..Default::default()
    };
    let doc = Document::new(
        Canvas::Both {
            width: 200.0,
            height: 50.0,
        },
        make_flex(flex, vec![make_box(30.0, 30.0), make_box(30.0, 30.0)]),
    );
    let tree = layout_doc(&doc);
    assert!(approx(tree.children[1].x, 40.0));
    assert!(approx(tree.children[1].y, 0.0));
}

// ─── Margins, Ratios, Alignment ─────────────────────────────────

#[test]
fn test_auto_margins_center_item() {
    let centered = Element::spacer(Style {
        width: Unit::px(40.0),
        height: Unit::px(20.0),
        margin: Edges::uniform(Margin::Auto),
        ..Default::default()
    });
    let doc = Document::new(
        Canvas::Both {
            width: 200.0,
            height: 100.0,
        },
        make_row(vec![centered]),
    );
    let tree = layout_doc(&doc);
    let item = &tree.children[0];
    assert!(approx(item.x, 80.0));
    assert!(approx(item.y, 40.0));
}

#[test]
fn test_auto_margins_override_justify_content() {
    let pushed = Element::spacer(Style {
        width: Unit::px(20.0),
        margin: Edges {
            left: Margin::Auto,
            ..Default::default()
        },
        ..Default::default()
    });
    let flex = FlexContainer {
        justify_content: JustifyContent::SpaceEvenly,
        ..Default::default()
    };
    let doc = Document::new(
        Canvas::Both {
            width: 100.0,
            height: 10.0,
        },
        make_flex(flex, vec![make_box(20.0, 10.0), pushed]),
    );
    let tree = layout_doc(&doc);
    assert!(approx(tree.children[0].x, 0.0));
    assert!(approx(tree.children[1].x, 80.0));
}

#[test]
fn test_aspect_ratio_derives_height() {
    let pictured = Element::spacer(Style {
        width: Unit::px(100.0),
        aspect_ratio: Some(2.0),
        ..Default::default()
    });
    let doc = Document::new(Canvas::Width { width: 300.0 }, make_row(vec![pictured]));
    let tree = layout_doc(&doc);
    assert!(approx(tree.children[0].width, 100.0));
    assert!(approx(tree.children[0].height, 50.0));
}

#[test]
fn test_image_uses_natural_ratio() {
    let logo = Element::image(
        "logo.png",
        400.0,
        100.0,
        Style {
            width: Unit::px(80.0),
            ..Default::default()
        },
    );
    let doc = Document::new(
        Canvas::Width { width: 200.0 },
        make_flex(column(), vec![logo]),
    );
    let tree = layout_doc(&doc);
    assert!(approx(tree.children[0].width, 80.0));
    assert!(approx(tree.children[0].height, 20.0));
}

#[test]
fn test_align_self_overrides_align_items() {
    let ended = Element::spacer(Style {
        width: Unit::px(10.0),
        height: Unit::px(10.0),
        align_self: Some(AlignItems::End),
        ..Default::default()
    });
    let flex = FlexContainer {
        align_items: AlignItems::Center,
        ..Default::default()
    };
    let doc = Document::new(
        Canvas::Both {
            width: 100.0,
            height: 50.0,
        },
        make_flex(flex, vec![make_box(10.0, 10.0), ended]),
    );
    let tree = layout_doc(&doc);
    assert!(approx(tree.children[0].y, 20.0));
    assert!(approx(tree.children[1].y, 40.0));
}

// ─── Code Symbols & Separators ──────────────────────────────────

#[test]
fn test_code_symbols_use_natural_size() {
    let qr = Element::code(Symbology::Qr, "HELLO", Style::default());
    let barcode = Element::code(Symbology::Code128, "ABC", Style::default());
    let doc = Document::new(
        Canvas::Width { width: 800.0 },
        Element::container(
            FlexContainer {
                align_items: AlignItems::Start,
                ..Default::default()
            },
            Style::default(),
            vec![qr, barcode],
        ),
    );
    let tree = layout_doc(&doc);
    // Version 1 QR: 21 modules plus a 4-module quiet zone each side.
    assert!(approx(tree.children[0].width, 29.0 * 4.0));
    assert!(approx(tree.children[0].height, 29.0 * 4.0));
    assert!(approx(tree.children[1].width, 88.0 * 4.0));
    assert!(approx(tree.children[1].height, 48.0));
}

#[test]
fn test_non_ascii_barcode_is_an_error() {
    let doc = Document::new(
        Canvas::Width { width: 100.0 },
        make_row(vec![Element::code(Symbology::Code128, "héllo", Style::default())]),
    );
    let err = labelform::layout_with_shaper(&doc, &Mono).unwrap_err();
    assert!(matches!(err, LayoutError::Symbol(_)));
}

#[test]
fn test_horizontal_separator_stretches_in_column() {
    let rule = Element::separator(Orientation::Horizontal, 2.0, Style::default());
    let doc = Document::new(
        Canvas::Width { width: 120.0 },
        make_flex(column(), vec![make_text("top"), rule, make_text("bottom")]),
    );
    let tree = layout_doc(&doc);
    assert!(approx(tree.children[1].width, 120.0));
    assert!(approx(tree.children[1].height, 2.0));
    assert!(approx(tree.children[2].y, 22.0));
}

// ─── Positioning & Direction ────────────────────────────────────

#[test]
fn test_absolute_is_out_of_flow() {
    let stamp = Element::spacer(Style {
        position: Position::Absolute,
        width: Unit::px(30.0),
        height: Unit::px(30.0),
        inset: Insets {
            top: Some(Unit::px(5.0)),
            right: Some(Unit::px(5.0)),
            ..Default::default()
        },
        ..Default::default()
    })
    .with_id("stamp");
    let doc = Document::new(
        Canvas::Both {
            width: 200.0,
            height: 100.0,
        },
        make_row(vec![stamp, make_grow(1.0).with_id("fill")]),
    );
    let tree = layout_doc(&doc);

    // The in-flow sibling takes the whole row.
    let fill = tree.find("fill").unwrap();
    assert!(approx(fill.x, 0.0));
    assert!(approx(fill.width, 200.0));

    let stamp = tree.find("stamp").unwrap();
    assert!(approx(stamp.x, 165.0));
    assert!(approx(stamp.y, 5.0));
    assert_eq!(tree.children.last().unwrap().element.id.as_deref(), Some("stamp"));
}

#[test]
fn test_relative_offset_does_not_move_siblings() {
    let nudged = Element::spacer(Style {
        position: Position::Relative,
        width: Unit::px(20.0),
        height: Unit::px(20.0),
        inset: Insets {
            top: Some(Unit::px(4.0)),
            left: Some(Unit::px(4.0)),
            ..Default::default()
        },
        ..Default::default()
    });
    let doc = Document::new(
        Canvas::Both {
            width: 100.0,
            height: 40.0,
        },
        make_row(vec![nudged, make_box(20.0, 20.0)]),
    );
    let tree = layout_doc(&doc);
    assert!(approx(tree.children[0].x, 4.0));
    assert!(approx(tree.children[0].y, 4.0));
    assert!(approx(tree.children[1].x, 20.0));
}

#[test]
fn test_rtl_mirrors_row() {
    let root = Element::container(
        FlexContainer::default(),
        Style {
            direction: Some(Direction::Rtl),
            ..Default::default()
        },
        vec![make_box(30.0, 10.0).with_id("first"), make_box(50.0, 10.0).with_id("second")],
    );
    let doc = Document::new(
        Canvas::Both {
            width: 200.0,
            height: 10.0,
        },
        root,
    );
    let tree = layout_doc(&doc);
    assert!(approx(tree.find("first").unwrap().x, 170.0));
    assert!(approx(tree.find("second").unwrap().x, 120.0));
}

#[test]
fn test_auto_direction_detects_rtl_text() {
    let hebrew = Element::text(
        "שלום",
        Style {
            direction: Some(Direction::Auto),
            ..Default::default()
        },
    );
    let doc = Document::new(Canvas::Width { width: 100.0 }, make_row(vec![hebrew]));
    let tree = layout_doc(&doc);
    assert_eq!(tree.direction, ResolvedDirection::Ltr);
    assert_eq!(tree.children[0].direction, ResolvedDirection::Rtl);
}

#[test]
fn test_options_direction_applies_to_root() {
    let mut doc = Document::new(
        Canvas::Both {
            width: 100.0,
            height: 10.0,
        },
        make_row(vec![make_box(10.0, 10.0)]),
    );
    doc.options.direction = ResolvedDirection::Rtl;
    let tree = layout_doc(&doc);
    assert!(approx(tree.children[0].x, 90.0));
}

// ─── Visibility & Canvas ────────────────────────────────────────

#[test]
fn test_display_none_is_excluded() {
    let hidden = Element::spacer(Style {
        width: Unit::px(50.0),
        display: Display::None,
        ..Default::default()
    });
    let doc = Document::new(
        Canvas::Both {
            width: 100.0,
            height: 10.0,
        },
        make_row(vec![hidden, make_box(10.0, 10.0)]),
    );
    let tree = layout_doc(&doc);
    assert_eq!(tree.children.len(), 1);
    assert!(approx(tree.children[0].x, 0.0));
}

#[test]
fn test_height_canvas_sizes_width_to_content() {
    let doc = Document::new(
        Canvas::Height { height: 30.0 },
        make_row(vec![make_text("abcd"), make_box(16.0, 10.0)]),
    );
    let tree = layout_doc(&doc);
    assert!(approx(tree.width, 56.0));
    assert!(approx(tree.height, 30.0));
}

#[test]
fn test_padding_offsets_children() {
    let root = Element::container(
        column(),
        Style {
            padding: Edges::symmetric(8.0, 12.0),
            ..Default::default()
        },
        vec![make_text("hello")],
    );
    let doc = Document::new(Canvas::Width { width: 100.0 }, root);
    let tree = layout_doc(&doc);
    let text = &tree.children[0];
    assert!(approx(text.x, 12.0));
    assert!(approx(text.y, 8.0));
    assert!(approx(text.width, 76.0));
    assert!(approx(tree.height, 36.0));
    assert_eq!(tree.content_box(), labelform::geometry::Rect::new(12.0, 8.0, 76.0, 20.0));
}

#[test]
fn test_containers_fully_contain_in_flow_children() {
    let card = Element::container(
        column(),
        Style {
            padding: Edges::uniform(4.0),
            ..Default::default()
        },
        vec![make_text("name"), make_text("a longer address line")],
    );
    let doc = Document::new(
        Canvas::Width { width: 120.0 },
        make_flex(column(), vec![card.clone(), card]),
    );
    let tree = layout_doc(&doc);
    for node in tree.iter() {
        for child in &node.children {
            let (inner, outer) = (child.rect(), node.rect());
            assert!(inner.x >= outer.x - 0.01 && inner.right() <= outer.right() + 0.01);
            assert!(inner.y >= outer.y - 0.01 && inner.bottom() <= outer.bottom() + 0.01);
        }
    }
}

// ─── Guards & Errors ────────────────────────────────────────────

#[test]
fn test_depth_limit_is_enforced() {
    let mut tree = make_row(vec![]);
    for _ in 0..5 {
        tree = make_row(vec![tree]);
    }
    let engine = LayoutEngine::with_options(LayoutOptions {
        limits: ResourceLimits {
            max_depth: 5,
            ..Default::default()
        },
        ..Default::default()
    });
    let err = engine
        .layout(&tree, Canvas::Width { width: 100.0 }, &Mono)
        .unwrap_err();
    match err {
        LayoutError::ResourceLimitExceeded {
            resource: Resource::Depth,
            limit,
            actual,
        } => {
            assert_eq!(limit, 5);
            assert_eq!(actual, 6);
        }
        other => panic!("expected depth error, got {other:?}"),
    }
}

#[test]
fn test_depth_at_limit_succeeds() {
    let mut tree = make_row(vec![]);
    for _ in 0..4 {
        tree = make_row(vec![tree]);
    }
    let engine = LayoutEngine::with_options(LayoutOptions {
        limits: ResourceLimits {
            max_depth: 5,
            ..Default::default()
        },
        ..Default::default()
    });
    assert!(engine.layout(&tree, Canvas::Width { width: 100.0 }, &Mono).is_ok());
}

#[test]
fn test_invalid_unit_is_rejected_at_parse() {
    let json = r#"{
        "canvas": {"fixed": "width", "width": 100},
        "root": {"kind": {"type": "Spacer"}, "style": {"width": "12 parsecs"}}
    }"#;
    match labelform::layout_json(json).unwrap_err() {
        LayoutError::InvalidUnitExpression(e) => {
            assert_eq!(e.input, "12 parsecs");
            assert_eq!(e.reason, "not a number");
        }
        other => panic!("expected invalid unit expression, got {other:?}"),
    }
}

#[test]
fn test_malformed_json_is_a_parse_error() {
    let err = labelform::layout_json(r#"{"canvas": {"fixed": "width", "width": 100},}"#).unwrap_err();
    match err {
        LayoutError::Parse { ref hint, .. } => assert!(hint.contains("trailing commas")),
        other => panic!("expected parse error, got {other:?}"),
    }
}

// ─── Determinism & JSON ─────────────────────────────────────────

#[test]
fn test_layout_is_deterministic() {
    let build = || {
        Document::new(
            Canvas::Width { width: 180.0 },
            make_flex(
                FlexContainer {
                    wrap: FlexWrap::Wrap,
                    column_gap: 6.0,
                    row_gap: 4.0,
                    ..Default::default()
                },
                vec![
                    make_text("Product"),
                    make_grow(1.0),
                    make_text("1 234,50 EUR"),
                    make_text("Best before 2026-12-31"),
                ],
            ),
        )
    };
    let first = build();
    let second = build();
    let a = layout_doc(&first);
    let b = layout_doc(&second);
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn test_json_in_json_out() {
    let json = r#"{
        "canvas": {"fixed": "both", "width": 300, "height": 60},
        "root": {
            "kind": {
                "type": "Container",
                "flex": {"direction": "row", "alignItems": "center", "columnGap": 10},
                "children": [
                    {"kind": {"type": "Text", "content": "Price"}, "id": "label"},
                    {"kind": {"type": "Spacer"}, "style": {"flexGrow": 1}},
                    {"kind": {"type": "Code", "symbology": "qr", "data": "42", "moduleSize": 2}, "id": "qr"}
                ]
            }
        }
    }"#;
    let out = labelform::layout_json(json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();

    assert_eq!(value["width"], 300.0);
    assert_eq!(value["element"]["type"], "Container");
    let children = value["children"].as_array().unwrap();
    assert_eq!(children.len(), 3);
    assert_eq!(children[0]["element"]["id"], "label");
    assert!(children[0]["text"]["lines"].is_array());
    // 21 + 8 quiet modules at 2px, flush with the right edge.
    assert_eq!(children[2]["width"], 58.0);
    assert!(approx(children[2]["x"].as_f64().unwrap() as f32, 242.0));
}

#[test]
fn test_document_round_trips_through_json() {
    let doc = Document::new(
        Canvas::Width { width: 250.0 },
        Element::container(
            FlexContainer {
                direction: FlexDirection::ColumnReverse,
                wrap: FlexWrap::WrapReverse,
                justify_content: JustifyContent::SpaceAround,
                ..Default::default()
            },
            Style {
                padding: Edges::uniform(3.0),
                margin: Edges::symmetric(Margin::Auto, Margin::Fixed(2.0)),
                width: Unit::percent(50.0),
                ..Default::default()
            },
            vec![make_text("x").with_id("x"), make_box(10.0, 10.0)],
        ),
    );
    let json = serde_json::to_string(&doc).unwrap();
    let back: Document = serde_json::from_str(&json).unwrap();
    assert_eq!(doc, back);
}
