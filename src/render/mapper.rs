//! Maps finalized elements to drawing-primitive calls.

use log::warn;

use crate::extraction::geometry::place_capture;
use crate::models::{
    colors::{CssColor, RgbColor},
    common::Rect,
    primitives::{
        BackgroundSpec, ConnectorSpec, DeckCall, Fill, FontSpec, HorizontalAlign, PictureSpec,
        ShapeKind, ShapeSpec, Stroke, TableCellSpec, TableSpec, TextBoxSpec, VerticalAnchor,
    },
    slide::{CropInfo, Element, ElementKind, SlideBackground, TextSource},
    style::{parse_px, BorderSide, StyleSnapshot},
};

/// Fonts the deck can rely on being installed, in preference order.
pub const PORTABLE_FONTS: &[&str] = &[
    "Arial",
    "Calibri",
    "Times New Roman",
    "Microsoft YaHei",
    "SimHei",
    "Verdana",
    "Tahoma",
];
pub const DEFAULT_FONT_FAMILY: &str = "Arial";

/// Relative tolerance used when deciding whether a rounded box is really a circle.
const ELLIPSE_TOLERANCE: f64 = 0.1;

// --- Style helpers ---

/// Picks the first family of a CSS `font-family` list that is in [`PORTABLE_FONTS`].
pub fn choose_font(font_family: &str) -> String {
    font_family
        .split(',')
        .map(|family| family.trim().trim_matches(|c: char| c == '"' || c == '\''))
        .find(|family| PORTABLE_FONTS.contains(family))
        .unwrap_or(DEFAULT_FONT_FAMILY)
        .to_string()
}

/// Numeric weights of 600 and above, and the `bold` keyword, render bold.
pub fn is_bold(font_weight: &str) -> bool {
    let weight = font_weight.trim();
    weight == "bold" || weight.parse::<u32>().is_ok_and(|w| w >= 600)
}

/// Converts `line-height` to a multiple of the font size. `normal` and unknown units yield `None`.
pub fn line_spacing(line_height: &str, font_size_px: f64) -> Option<f64> {
    let value = line_height.trim();
    if value == "normal" {
        return None;
    }
    if let Some(px) = value.strip_suffix("px") {
        return px.trim().parse::<f64>().ok().map(|px| px / font_size_px);
    }
    value.parse::<f64>().ok()
}

pub fn horizontal_align(text_align: &str) -> HorizontalAlign {
    match text_align.trim() {
        "center" => HorizontalAlign::Center,
        "right" => HorizontalAlign::Right,
        "justify" => HorizontalAlign::Justify,
        _ => HorizontalAlign::Left,
    }
}

/// Vertical anchor from the flex layout: column layouts read `justify-content`, row layouts
/// read `align-items`. Non-flex boxes anchor to the top.
pub fn vertical_anchor(style: &StyleSnapshot) -> VerticalAnchor {
    if !style.is_flex() {
        return VerticalAnchor::Top;
    }
    let axis = if style.flex_direction.trim() == "column" {
        &style.justify_content
    } else {
        &style.align_items
    };
    match axis.trim() {
        "center" => VerticalAnchor::Middle,
        "flex-end" | "end" => VerticalAnchor::Bottom,
        _ => VerticalAnchor::Top,
    }
}

fn font_for(style: &StyleSnapshot) -> FontSpec {
    FontSpec {
        family: choose_font(&style.font_family),
        size_px: style.font_size_px(),
        bold: is_bold(&style.font_weight),
        color: style.text_color().rgb,
    }
}

/// Fill from the background color alone; `None` when the background is fully transparent.
fn background_fill(style: &StyleSnapshot) -> Option<Fill> {
    if !style.has_background_color() {
        return None;
    }
    let color = style.background();
    Some(Fill {
        color: color.rgb,
        alpha: color.alpha,
    })
}

/// Reads a border side as a stroke. `Ok(None)` for a zero width, `Err` for an unreadable one.
fn border_stroke(style: &StyleSnapshot, side: BorderSide) -> Result<Option<Stroke>, String> {
    let border = style.border(side);
    let raw = border.width.trim();
    if raw.is_empty() || raw == "0px" {
        return Ok(None);
    }
    let width = parse_px(raw).ok_or_else(|| format!("unreadable border width '{}'", raw))?;
    if width <= 0.0 {
        return Ok(None);
    }
    Ok(Some(Stroke {
        width,
        color: CssColor::parse(border.color).rgb,
    }))
}

/// A connector for one border side, or nothing. Unreadable widths are logged and skipped.
fn border_connector(
    style: &StyleSnapshot,
    side: BorderSide,
    from: (f64, f64),
    to: (f64, f64),
) -> Option<DeckCall> {
    match border_stroke(style, side) {
        Ok(Some(stroke)) => Some(DeckCall::CreateConnector(ConnectorSpec {
            x1: from.0,
            y1: from.1,
            x2: to.0,
            y2: to.1,
            stroke,
        })),
        Ok(None) => None,
        Err(reason) => {
            warn!("Failed to add {:?} border: {}", side, reason);
            None
        }
    }
}

// --- Primitives ---

/// Builds the text box for `source` without its border connectors.
///
/// Single-line text is widened by `width_factor` so the target renderer does not wrap it;
/// for centered and right-aligned text the box also moves left so the glyphs stay put.
pub fn text_box(source: TextSource<'_>, width_factor: f64) -> TextBoxSpec {
    let style = source.style;
    let align = horizontal_align(&style.text_align);

    let mut rect = source.rect;
    if source.is_single_line {
        let widened = rect.width * width_factor;
        let extra = widened - rect.width;
        match align {
            HorizontalAlign::Center => rect.x -= extra / 2.0,
            HorizontalAlign::Right => rect.x -= extra,
            _ => {}
        }
        rect.width = widened;
    }

    let font = font_for(style);
    TextBoxSpec {
        rect,
        text: source.text.to_string(),
        line_spacing: line_spacing(&style.line_height, font.size_px),
        font,
        align,
        anchor: vertical_anchor(style),
        hyperlink: source.href.map(str::to_string),
        fill: background_fill(style),
        word_wrap: true,
    }
}

/// Connectors for the bottom and left borders of `rect`, tagged with their side.
fn edge_connectors(style: &StyleSnapshot, rect: Rect) -> Vec<(BorderSide, DeckCall)> {
    let bottom = rect.bottom();
    [
        (BorderSide::Bottom, (rect.x, bottom), (rect.right(), bottom)),
        (BorderSide::Left, (rect.x, rect.y), (rect.x, bottom)),
    ]
    .into_iter()
    .filter_map(|(side, from, to)| {
        border_connector(style, side, from, to).map(|call| (side, call))
    })
    .collect()
}

/// The text box and its side-tagged connectors, laid out on the original, unwidened box.
fn text_parts(
    source: TextSource<'_>,
    width_factor: f64,
) -> (TextBoxSpec, Vec<(BorderSide, DeckCall)>) {
    let connectors = edge_connectors(source.style, source.rect);
    (text_box(source, width_factor), connectors)
}

/// Builds a text box plus connectors for its bottom and left borders.
/// Connectors follow the original, unwidened box.
pub fn map_text(source: TextSource<'_>, width_factor: f64) -> Vec<DeckCall> {
    let (text, connectors) = text_parts(source, width_factor);
    std::iter::once(DeckCall::CreateText(text))
        .chain(connectors.into_iter().map(|(_, call)| call))
        .collect()
}

/// Infers the preset geometry from `border-radius`.
///
/// `50%` is always an ellipse. A pixel radius within 10% of half the width on a box whose
/// sides differ by less than 10% is an ellipse too. Any other non-zero radius is a rounded
/// rectangle.
pub fn shape_kind(border_radius: &str, width: f64, height: f64) -> ShapeKind {
    let radius = border_radius.trim();
    if radius.is_empty() || radius == "0px" || radius == "0" {
        return ShapeKind::Rectangle;
    }
    if radius.contains("50%") {
        return ShapeKind::Ellipse;
    }
    match parse_px(radius) {
        Some(px) if px == 0.0 => ShapeKind::Rectangle,
        Some(px)
            if (px - width / 2.0).abs() < width * ELLIPSE_TOLERANCE
                && (width - height).abs() < width * ELLIPSE_TOLERANCE =>
        {
            ShapeKind::Ellipse
        }
        _ => ShapeKind::RoundedRectangle,
    }
}

/// Builds a shape plus the border connectors its outline cannot express, and a text box on
/// top when the shape carries its own text.
///
/// The outline strokes every side with the top border. A left border equal to that outline
/// gets no connector of its own, so a rounded or elliptical shape with a uniform border shows
/// only its curved outline rather than an extra straight left edge. The text box is laid out
/// like any text element but without a fill, and its bottom connector is kept unless the
/// outline already paints that side.
pub fn map_shape(element: &Element, width_factor: f64) -> Vec<DeckCall> {
    let style = &element.style;
    let rect = element.rect();

    let fill = background_fill(style).map(|fill| Fill {
        alpha: fill.alpha * style.opacity_value(),
        ..fill
    });
    let stroke = match border_stroke(style, BorderSide::Top) {
        Ok(stroke) => stroke,
        Err(reason) => {
            warn!("Failed to read outline of {}: {}", element.id, reason);
            None
        }
    };
    let outline_paints = |side: BorderSide| {
        matches!(border_stroke(style, side), Ok(Some(border)) if stroke == Some(border))
    };

    let mut calls = vec![DeckCall::CreateShape(ShapeSpec {
        rect,
        kind: shape_kind(&style.border_radius, element.width, element.height),
        fill,
        stroke,
    })];

    if !outline_paints(BorderSide::Left) {
        calls.extend(border_connector(
            style,
            BorderSide::Left,
            (rect.x, rect.y),
            (rect.x, rect.bottom()),
        ));
    }

    if !element.text.trim().is_empty() {
        let (text, connectors) = text_parts(element.text_source(), width_factor);
        calls.push(DeckCall::CreateText(TextBoxSpec { fill: None, ..text }));
        // The left side was settled with the shape above.
        calls.extend(
            connectors
                .into_iter()
                .filter(|(side, _)| *side != BorderSide::Left && !outline_paints(*side))
                .map(|(_, call)| call),
        );
    }
    calls
}

/// Builds a table from the extracted rows. Column widths come from the first row, row
/// heights from the tallest cell of each row. Returns `None` for a table without rows.
pub fn map_table(element: &Element) -> Option<TableSpec> {
    let first_row = element.rows.first()?;
    let columns = first_row.len();
    let column_widths = first_row.iter().map(|cell| cell.width).collect();

    let row_heights = element
        .rows
        .iter()
        .map(|row| row.iter().map(|cell| cell.height).fold(0.0, f64::max))
        .collect();

    let cells = element
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            if row.len() != columns {
                warn!(
                    "Table {} row {} has {} cells, expected {}",
                    element.id,
                    index,
                    row.len(),
                    columns
                );
            }
            row.iter()
                .take(columns)
                .map(|cell| TableCellSpec {
                    text: cell.text.clone(),
                    font: font_for(&cell.style),
                    fill: background_fill(&cell.style),
                })
                .collect()
        })
        .collect();

    Some(TableSpec {
        rect: element.rect(),
        rows: element.rows.len(),
        columns,
        column_widths,
        row_heights,
        cells,
    })
}

/// Places a capture and stacks the element's rescued text overlays on top of it.
pub fn map_image(
    element: &Element,
    data: Vec<u8>,
    crop: Option<&CropInfo>,
    width_factor: f64,
) -> Vec<DeckCall> {
    let rect: Rect = place_capture(&element.rect(), crop);
    let mut calls = vec![DeckCall::CreatePicture(PictureSpec { rect, data })];
    for child in &element.children {
        calls.extend(map_text(child.text_source(), width_factor));
    }
    calls
}

/// Solid slide background from the resolved color, white when it is transparent. A captured
/// picture takes precedence when the background needs one.
pub fn background_spec(background: &SlideBackground, picture: Option<Vec<u8>>) -> BackgroundSpec {
    if let Some(data) = picture {
        return BackgroundSpec::Picture { data };
    }
    let color = CssColor::parse(&background.color);
    let color = if color.is_fully_transparent() {
        RgbColor::WHITE
    } else {
        color.rgb
    };
    BackgroundSpec::Solid { color }
}

/// Maps an element that needs no capture. `image` elements yield nothing here; they go
/// through [`map_image`] once their pixels are available.
pub fn map_vector(element: &Element, width_factor: f64) -> Vec<DeckCall> {
    match element.kind {
        ElementKind::Text => map_text(element.text_source(), width_factor),
        ElementKind::Shape => map_shape(element, width_factor),
        ElementKind::Table => match map_table(element) {
            Some(table) => vec![DeckCall::CreateTable(table)],
            None => {
                warn!("Table {} has no rows, skipping", element.id);
                Vec::new()
            }
        },
        ElementKind::Image => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::slide::Cell;

    fn element(kind: ElementKind, edit: impl FnOnce(&mut StyleSnapshot)) -> Element {
        let mut style = StyleSnapshot::default();
        edit(&mut style);
        Element {
            id: "slide_0_el_0".to_string(),
            kind,
            text: "Hello".to_string(),
            is_single_line: true,
            href: None,
            x: 100.0,
            y: 50.0,
            width: 200.0,
            height: 40.0,
            style,
            children: Vec::new(),
            rows: Vec::new(),
        }
    }

    fn text_spec(calls: &[DeckCall]) -> &TextBoxSpec {
        calls
            .iter()
            .find_map(|call| match call {
                DeckCall::CreateText(spec) => Some(spec),
                _ => None,
            })
            .expect("text box")
    }

    fn connectors(calls: &[DeckCall]) -> Vec<&ConnectorSpec> {
        calls
            .iter()
            .filter_map(|call| match call {
                DeckCall::CreateConnector(spec) => Some(spec),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_font_selection() {
        assert_eq!(choose_font("\"Inter\", 'Calibri', Arial, sans-serif"), "Calibri");
        assert_eq!(choose_font("Inter, sans-serif"), DEFAULT_FONT_FAMILY);
    }

    #[test]
    fn test_bold_threshold() {
        assert!(is_bold("600"));
        assert!(is_bold("bold"));
        assert!(!is_bold("500"));
        assert!(!is_bold("normal"));
    }

    #[test]
    fn test_line_spacing_units() {
        assert_eq!(line_spacing("24px", 16.0), Some(1.5));
        assert_eq!(line_spacing("1.2", 16.0), Some(1.2));
        assert_eq!(line_spacing("normal", 16.0), None);
    }

    #[test]
    fn test_vertical_anchor_follows_flex_axis() {
        let mut style = StyleSnapshot {
            display: "flex".to_string(),
            align_items: "center".to_string(),
            justify_content: "flex-end".to_string(),
            ..Default::default()
        };
        assert_eq!(vertical_anchor(&style), VerticalAnchor::Middle);
        style.flex_direction = "column".to_string();
        assert_eq!(vertical_anchor(&style), VerticalAnchor::Bottom);
        style.display = "block".to_string();
        assert_eq!(vertical_anchor(&style), VerticalAnchor::Top);
    }

    #[test]
    fn test_single_line_widening_keeps_center_position() {
        let el = element(ElementKind::Text, |s| s.text_align = "center".to_string());
        let calls = map_text(el.text_source(), 1.1);
        let spec = text_spec(&calls);
        assert!((spec.rect.width - 220.0).abs() < 1e-9);
        assert!((spec.rect.x - 90.0).abs() < 1e-9);
        assert_eq!(spec.align, HorizontalAlign::Center);
    }

    #[test]
    fn test_right_aligned_widening_shifts_full_amount() {
        let el = element(ElementKind::Text, |s| s.text_align = "right".to_string());
        let spec = text_spec(&map_text(el.text_source(), 1.5)).clone();
        assert_eq!(spec.rect.x, 0.0);
        assert_eq!(spec.rect.width, 300.0);
    }

    #[test]
    fn test_multi_line_text_is_not_widened() {
        let mut el = element(ElementKind::Text, |_| {});
        el.is_single_line = false;
        let spec = text_spec(&map_text(el.text_source(), 1.5)).clone();
        assert_eq!(spec.rect, el.rect());
    }

    #[test]
    fn test_text_borders_use_unwidened_box() {
        let el = element(ElementKind::Text, |s| {
            s.text_align = "center".to_string();
            s.border_bottom_width = "2px".to_string();
            s.border_bottom_color = "rgb(255, 0, 0)".to_string();
            s.border_left_width = "4px".to_string();
        });
        let calls = map_text(el.text_source(), 1.2);
        let lines = connectors(&calls);
        assert_eq!(lines.len(), 2);
        assert_eq!((lines[0].x1, lines[0].x2, lines[0].y1), (100.0, 300.0, 90.0));
        assert_eq!(lines[0].stroke.color, RgbColor::new(255, 0, 0));
        assert_eq!((lines[1].x1, lines[1].y1, lines[1].y2), (100.0, 50.0, 90.0));
    }

    #[test]
    fn test_unreadable_border_is_skipped() {
        let el = element(ElementKind::Text, |s| s.border_bottom_width = "thick".to_string());
        let calls = map_text(el.text_source(), 1.0);
        assert_eq!(calls.len(), 1);
    }

    #[test]
    fn test_shape_kind_inference() {
        assert_eq!(shape_kind("0px", 100.0, 100.0), ShapeKind::Rectangle);
        assert_eq!(shape_kind("50%", 300.0, 100.0), ShapeKind::Ellipse);
        assert_eq!(shape_kind("50px", 100.0, 104.0), ShapeKind::Ellipse);
        assert_eq!(shape_kind("50px", 100.0, 60.0), ShapeKind::RoundedRectangle);
        assert_eq!(shape_kind("8px", 100.0, 100.0), ShapeKind::RoundedRectangle);
    }

    #[test]
    fn test_solid_shape_without_border() {
        let mut el = element(ElementKind::Shape, |s| {
            s.background_color = "rgb(10, 20, 30)".to_string()
        });
        el.text.clear();
        let calls = map_shape(&el, 1.1);
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            DeckCall::CreateShape(shape) => {
                assert_eq!(shape.kind, ShapeKind::Rectangle);
                assert_eq!(
                    shape.fill,
                    Some(Fill {
                        color: RgbColor::new(10, 20, 30),
                        alpha: 1.0
                    })
                );
                assert_eq!(shape.stroke, None);
            }
            other => panic!("expected shape, got {:?}", other),
        }
    }

    #[test]
    fn test_shape_alpha_combines_with_opacity() {
        let el = element(ElementKind::Shape, |s| {
            s.background_color = "rgba(0, 0, 0, 0.5)".to_string();
            s.opacity = "0.5".to_string();
        });
        match &map_shape(&el, 1.0)[0] {
            DeckCall::CreateShape(shape) => assert_eq!(shape.fill.unwrap().alpha, 0.25),
            other => panic!("expected shape, got {:?}", other),
        }
    }

    #[test]
    fn test_shape_with_text_and_distinct_left_border() {
        let el = element(ElementKind::Shape, |s| {
            s.border_top_width = "1px".to_string();
            s.border_left_width = "6px".to_string();
            s.border_left_color = "rgb(0, 128, 0)".to_string();
        });
        let calls = map_shape(&el, 1.0);
        assert!(matches!(calls[0], DeckCall::CreateShape(_)));
        assert_eq!(connectors(&calls).len(), 1);
        assert_eq!(text_spec(&calls).text, "Hello");
    }

    #[test]
    fn test_shape_text_overlay_has_no_fill() {
        let el = element(ElementKind::Shape, |s| {
            s.background_color = "rgb(0, 0, 255)".to_string();
        });
        let calls = map_shape(&el, 1.0);
        assert_eq!(calls.len(), 2);
        assert_eq!(text_spec(&calls).fill, None);
    }

    #[test]
    fn test_underlined_shape_text_keeps_bottom_rule() {
        let el = element(ElementKind::Shape, |s| {
            s.border_bottom_width = "3px".to_string();
            s.border_bottom_color = "rgb(255, 0, 0)".to_string();
        });
        let calls = map_shape(&el, 1.3);
        assert!(matches!(calls[0], DeckCall::CreateShape(ShapeSpec { stroke: None, .. })));
        let lines = connectors(&calls);
        assert_eq!(lines.len(), 1);
        let rect = el.rect();
        assert_eq!((lines[0].x1, lines[0].x2), (rect.x, rect.right()));
        assert_eq!((lines[0].y1, lines[0].y2), (rect.bottom(), rect.bottom()));
        assert_eq!(lines[0].stroke.color, RgbColor::new(255, 0, 0));
    }

    #[test]
    fn test_uniform_border_with_text_adds_no_connectors() {
        let el = element(ElementKind::Shape, |s| {
            s.border_top_width = "2px".to_string();
            s.border_bottom_width = "2px".to_string();
            s.border_left_width = "2px".to_string();
        });
        let calls = map_shape(&el, 1.0);
        assert_eq!(calls.len(), 2);
        assert!(connectors(&calls).is_empty());
    }

    #[test]
    fn test_background_defaults_to_white() {
        let transparent = SlideBackground {
            color: "rgba(0, 0, 0, 0)".to_string(),
            image: None,
        };
        assert_eq!(
            background_spec(&transparent, None),
            BackgroundSpec::Solid {
                color: RgbColor::WHITE
            }
        );
        let dark = SlideBackground {
            color: "rgb(17, 24, 39)".to_string(),
            image: None,
        };
        assert_eq!(
            background_spec(&dark, None),
            BackgroundSpec::Solid {
                color: RgbColor::new(17, 24, 39)
            }
        );
        assert_eq!(
            background_spec(&dark, Some(vec![7])),
            BackgroundSpec::Picture { data: vec![7] }
        );
    }

    #[test]
    fn test_uniform_border_draws_no_extra_connector() {
        let mut el = element(ElementKind::Shape, |s| {
            s.border_top_width = "2px".to_string();
            s.border_left_width = "2px".to_string();
        });
        el.text.clear();
        assert_eq!(map_shape(&el, 1.0).len(), 1);
    }

    #[test]
    fn test_table_dimensions_from_rows() {
        let cell = |width: f64, height: f64, bg: &str| Cell {
            text: "x".to_string(),
            width,
            height,
            style: StyleSnapshot {
                background_color: bg.to_string(),
                ..Default::default()
            },
        };
        let mut el = element(ElementKind::Table, |_| {});
        el.rows = vec![
            vec![cell(50.0, 20.0, "rgba(0, 0, 0, 0)"), cell(70.0, 24.0, "rgba(0, 0, 0, 0)")],
            vec![cell(55.0, 30.0, "rgb(1, 1, 1)"), cell(65.0, 10.0, "rgb(1, 1, 1)")],
        ];
        let table = map_table(&el).unwrap();
        assert_eq!((table.rows, table.columns), (2, 2));
        assert_eq!(table.column_widths, vec![50.0, 70.0]);
        assert_eq!(table.row_heights, vec![24.0, 30.0]);
        assert_eq!(table.cells[0][0].fill, None);
        assert!(table.cells[1][1].fill.is_some());
    }

    #[test]
    fn test_empty_table_is_skipped() {
        let el = element(ElementKind::Table, |_| {});
        assert!(map_vector(&el, 1.0).is_empty());
    }

    #[test]
    fn test_image_uses_crop_and_overlays() {
        let mut el = element(ElementKind::Image, |_| {});
        el.children.push(crate::models::slide::ChildText {
            id: "slide_0_el_0_child_0".to_string(),
            text: "caption".to_string(),
            is_single_line: false,
            x: 110.0,
            y: 60.0,
            width: 80.0,
            height: 20.0,
            style: StyleSnapshot::default(),
        });
        let crop = CropInfo {
            crop_left: 0.0,
            crop_top: 10.0,
            width: 260.0,
            height: 90.0,
            padding: 30.0,
        };
        let calls = map_image(&el, vec![1, 2, 3], Some(&crop), 1.0);
        match &calls[0] {
            DeckCall::CreatePicture(picture) => {
                assert_eq!(picture.rect, Rect::new(70.0, 30.0, 260.0, 90.0));
            }
            other => panic!("expected picture, got {:?}", other),
        }
        assert_eq!(text_spec(&calls).text, "caption");
    }
}
