use serde_json::{json, Value};

use webppt_tools::{
    extraction::geometry::compute_crop,
    models::{
        colors::RgbColor,
        common::{Rect, Size},
        primitives::{DeckCall, Fill, TableSpec},
        slide::ElementKind,
    },
    render_snapshot, Document, FidelityMode, RenderConfig, RenderConfigBuilder,
};

fn slide(children: Value) -> String {
    json!({"root": {"tag": "body",
        "rect": {"x": 0, "y": 0, "width": 1280, "height": 720},
        "children": [
            {"tag": "section", "attributes": {"class": "slide"},
             "rect": {"x": 0, "y": 0, "width": 1280, "height": 720},
             "style": {"backgroundColor": "rgb(255, 255, 255)"},
             "children": children}
        ]}})
    .to_string()
}

fn config(mode: FidelityMode) -> RenderConfig {
    RenderConfigBuilder::new().set_mode(mode).build().unwrap()
}

fn render(snapshot: &str, mode: FidelityMode) -> Vec<DeckCall> {
    render_snapshot(snapshot, &config(mode)).unwrap().into_calls()
}

fn extract(snapshot: &str) -> webppt_tools::SlideDocument {
    let mut document = Document::from_json(snapshot).unwrap();
    webppt_tools::extract_document(&mut document).unwrap()
}

#[test]
fn solid_container_becomes_plain_shape() {
    let snapshot = slide(json!([
        {"tag": "div",
         "rect": {"x": 100, "y": 80, "width": 300, "height": 150},
         "style": {"backgroundColor": "rgb(34, 139, 34)"}}
    ]));

    let document = extract(&snapshot);
    assert_eq!(document.slides[0].elements.len(), 1);
    assert_eq!(document.slides[0].elements[0].kind, ElementKind::Shape);

    let calls = render(&snapshot, FidelityMode::Smart);
    assert_eq!(calls.len(), 2);
    match &calls[1] {
        DeckCall::CreateShape(shape) => {
            assert_eq!(shape.rect, Rect::new(100.0, 80.0, 300.0, 150.0));
            assert_eq!(
                shape.fill,
                Some(Fill {
                    color: RgbColor::new(34, 139, 34),
                    alpha: 1.0
                })
            );
            assert_eq!(shape.stroke, None);
        }
        other => panic!("expected a shape, got {:?}", other),
    }
}

#[test]
fn gradient_ancestor_is_captured_and_text_stays_editable() {
    let snapshot = slide(json!([
        {"tag": "div", "attributes": {"class": "card"},
         "rect": {"x": 200, "y": 200, "width": 400, "height": 200},
         "style": {"backgroundImage": "linear-gradient(90deg, rgb(255, 0, 0), rgb(0, 0, 255))"},
         "children": [
            {"tag": "p",
             "rect": {"x": 220, "y": 220, "width": 200, "height": 24},
             "style": {"color": "rgb(255, 255, 255)", "fontSize": "20px"},
             "children": [{"text": "Quarterly results",
                           "rects": [{"x": 220, "y": 220, "width": 180, "height": 24}]}]}
         ]}
    ]));

    let calls = render(&snapshot, FidelityMode::Smart);
    assert!(matches!(calls[0], DeckCall::CreateSlide(_)));
    match &calls[1] {
        DeckCall::CreatePicture(picture) => {
            assert_eq!(picture.rect, Rect::new(170.0, 170.0, 460.0, 260.0));
            assert!(!picture.data.is_empty());
        }
        other => panic!("expected the captured card, got {:?}", other),
    }
    match &calls[2] {
        DeckCall::CreateText(text) => {
            assert_eq!(text.text, "Quarterly results");
            assert_eq!(text.font.color, RgbColor::WHITE);
            assert_eq!(text.font.size_px, 20.0);
        }
        other => panic!("expected the text on top, got {:?}", other),
    }
}

#[test]
fn table_row_background_reaches_transparent_cells() {
    let cell = |x: f64, y: f64, text: &str| {
        json!({"tag": "td",
               "rect": {"x": x, "y": y, "width": 100, "height": 30},
               "children": [{"text": text}]})
    };
    let snapshot = slide(json!([
        {"tag": "table", "attributes": {"data-ppt-render": "table"},
         "rect": {"x": 50, "y": 50, "width": 300, "height": 60},
         "children": [
            {"tag": "tbody", "children": [
                {"tag": "tr", "rect": {"x": 50, "y": 50, "width": 300, "height": 30},
                 "children": [cell(50.0, 50.0, "a"), cell(150.0, 50.0, "b"), cell(250.0, 50.0, "c")]},
                {"tag": "tr", "rect": {"x": 50, "y": 80, "width": 300, "height": 30},
                 "style": {"backgroundColor": "rgb(200, 230, 255)"},
                 "children": [cell(50.0, 80.0, "d"), cell(150.0, 80.0, "e"), cell(250.0, 80.0, "f")]}
            ]}
         ]}
    ]));

    let calls = render(&snapshot, FidelityMode::Smart);
    let table: &TableSpec = calls
        .iter()
        .find_map(|call| match call {
            DeckCall::CreateTable(table) => Some(table),
            _ => None,
        })
        .expect("a table call");

    assert_eq!((table.rows, table.columns), (2, 3));
    assert_eq!(table.column_widths, vec![100.0, 100.0, 100.0]);
    let row_color = Some(Fill {
        color: RgbColor::new(200, 230, 255),
        alpha: 1.0,
    });
    assert!(table.cells[1].iter().all(|cell| cell.fill == row_color));
    assert!(table.cells[0].iter().all(|cell| cell.fill.is_none()));
    assert_eq!(table.cells[1][2].text, "f");
}

#[test]
fn full_canvas_element_crop_clamps_at_origin() {
    let canvas = Size::new(1280.0, 720.0);
    let window = compute_crop(&Rect::new(0.0, 0.0, 1280.0, 720.0), 30.0, canvas).unwrap();
    assert_eq!(window.crop.crop_left, 30.0);
    assert_eq!(window.crop.crop_top, 30.0);
    assert_eq!(window.clip, Rect::new(0.0, 0.0, 1280.0, 720.0));

    let inset = compute_crop(&Rect::new(40.0, 0.0, 1200.0, 720.0), 30.0, canvas).unwrap();
    assert_eq!(inset.crop.crop_left, 0.0);
    assert_eq!(inset.crop.crop_top, 30.0);

    // Through the pipeline the capture lands exactly on the slide.
    let snapshot = slide(json!([
        {"tag": "div", "attributes": {"id": "marker"},
         "rect": {"x": 10, "y": 10, "width": 10, "height": 10}},
        {"tag": "div",
         "rect": {"x": 0, "y": 0, "width": 1280, "height": 720},
         "style": {"backgroundColor": "rgba(0, 0, 0, 0.5)"}}
    ]));
    let calls = render(&snapshot, FidelityMode::Smart);
    let pictures: Vec<Rect> = calls
        .iter()
        .filter_map(|call| match call {
            DeckCall::CreatePicture(picture) => Some(picture.rect),
            _ => None,
        })
        .collect();
    assert_eq!(pictures, vec![Rect::new(0.0, 0.0, 1280.0, 720.0)]);
}

#[test]
fn minimal_mode_never_captures_and_maximal_captures_every_shape() {
    let snapshot = slide(json!([
        {"tag": "div", "rect": {"x": 0, "y": 0, "width": 100, "height": 100},
         "style": {"backgroundColor": "rgba(10, 10, 10, 0.3)", "opacity": "0.9"}},
        {"tag": "div", "rect": {"x": 200, "y": 0, "width": 100, "height": 100},
         "style": {"backgroundColor": "rgb(10, 10, 10)"}}
    ]));
    let count_pictures = |calls: &[DeckCall]| {
        calls
            .iter()
            .filter(|call| matches!(call, DeckCall::CreatePicture(_)))
            .count()
    };

    assert_eq!(count_pictures(&render(&snapshot, FidelityMode::Minimal)), 0);
    assert_eq!(count_pictures(&render(&snapshot, FidelityMode::Smart)), 1);
    assert_eq!(count_pictures(&render(&snapshot, FidelityMode::Maximal)), 2);
}

#[test]
fn element_ids_are_stable_across_runs() {
    let snapshot = slide(json!([
        {"tag": "h1", "rect": {"x": 0, "y": 0, "width": 100, "height": 40},
         "children": [{"text": "Title"}]},
        {"tag": "p", "rect": {"x": 0, "y": 50, "width": 100, "height": 20},
         "children": [{"text": "Body"}]}
    ]));
    let first = extract(&snapshot);
    let second = extract(&snapshot);
    assert_eq!(first, second);
    let ids: Vec<&str> = first.slides[0]
        .elements
        .iter()
        .map(|element| element.id.as_str())
        .collect();
    assert_eq!(ids, vec!["slide_0_el_0", "slide_0_el_1"]);
}

#[test]
fn underlined_heading_keeps_its_rule() {
    let snapshot = slide(json!([
        {"tag": "h2",
         "rect": {"x": 60, "y": 40, "width": 500, "height": 48},
         "style": {"borderBottomWidth": "3px", "borderBottomStyle": "solid",
                   "borderBottomColor": "rgb(255, 0, 0)", "fontSize": "32px"},
         "children": [{"text": "Section heading"}]}
    ]));

    let calls = render(&snapshot, FidelityMode::Smart);
    let connectors: Vec<_> = calls
        .iter()
        .filter_map(|call| match call {
            DeckCall::CreateConnector(connector) => Some(connector),
            _ => None,
        })
        .collect();
    assert_eq!(connectors.len(), 1);
    assert_eq!((connectors[0].y1, connectors[0].y2), (88.0, 88.0));
    assert_eq!((connectors[0].x1, connectors[0].x2), (60.0, 560.0));
    assert_eq!(connectors[0].stroke.color, RgbColor::new(255, 0, 0));
    assert!(calls
        .iter()
        .any(|call| matches!(call, DeckCall::CreateText(text) if text.text == "Section heading")));
}
