//! Builds element records from classified nodes: style snapshots, slide background,
//! table cells and the editable text overlays of image elements.
//!
//! Styles are taken verbatim from the snapshot; the only derived values are the promoted
//! slide background and the row-inherited cell backgrounds.

use indexmap::IndexSet;
use indextree::NodeId;

use crate::errors::{DeckError, Result};
use crate::extraction::{
    classifier::is_single_line, collector::CollectedElement, geometry::normalize,
};
use crate::models::{
    colors::is_transparent_color,
    common::Rect,
    dom::Document,
    slide::{Cell, ChildText, Element, ElementKind, SlideBackground},
    style::{BorderSide, StyleSnapshot},
};

/// Size tolerance for a first child to count as covering the slide.
pub const BACKGROUND_COVER_TOLERANCE_PX: f64 = 2.0;
/// Attribute stamped on rescued overlay nodes so capture can hide them.
pub const CHILD_ID_ATTR: &str = "data-ppt-child-id";

/// Resolves the slide background, promoting the first child's background when that child
/// covers the whole slide. Only the first child is considered.
pub fn resolve_background(doc: &Document, slide_root: NodeId) -> Result<SlideBackground> {
    let slide = doc
        .element(slide_root)
        .ok_or_else(|| DeckError::MissingData("slide root is not an element".to_string()))?;
    let mut color = slide.style.background_color.clone();
    let mut image = slide.style.background_image.clone();

    if let Some(child) = doc
        .first_element_child(slide_root)
        .and_then(|id| doc.element(id))
    {
        let covers = child
            .rect
            .same_size_as(&slide.rect, BACKGROUND_COVER_TOLERANCE_PX);
        if covers && (child.style.has_background_color() || child.style.has_background_image()) {
            color = child.style.background_color.clone();
            image = child.style.background_image.clone();
        }
    }

    let image = match image.trim() {
        "" | "none" => None,
        _ => Some(image),
    };
    Ok(SlideBackground { color, image })
}

/// Builds the full element record for one collected node.
/// The text of a `shape` that hosts classified descendants is suppressed; those
/// descendants render it themselves.
pub fn resolve_element(
    doc: &mut Document,
    collected: &CollectedElement,
    slide_rect: &Rect,
) -> Result<Element> {
    let node = collected.node;
    let element = doc
        .element(node)
        .ok_or_else(|| DeckError::MissingData(format!("element {} vanished", collected.id)))?;
    let style = element.style.clone();
    let rect = normalize(&element.rect, slide_rect);

    let hosts_tagged = doc.element_descendants(node).any(|d| doc.is_tagged(d));
    let text = if collected.kind == ElementKind::Shape && hosts_tagged {
        String::new()
    } else {
        doc.inner_text(node)
    };

    let rows = if collected.kind == ElementKind::Table {
        table_rows(doc, node)
    } else {
        Vec::new()
    };
    let children = if collected.kind == ElementKind::Image {
        child_texts(doc, node, &collected.id, slide_rect)?
    } else {
        Vec::new()
    };

    Ok(Element {
        id: collected.id.clone(),
        kind: collected.kind,
        text,
        is_single_line: is_single_line(doc, node),
        href: doc.href(node),
        x: rect.x,
        y: rect.y,
        width: rect.width,
        height: rect.height,
        style,
        children,
        rows,
    })
}

/// Applies row background inheritance: a transparent cell takes a painted row's background.
pub fn inherit_row_background(cell: &StyleSnapshot, row: &StyleSnapshot) -> StyleSnapshot {
    let mut resolved = cell.clone();
    if is_transparent_color(&cell.background_color) && !is_transparent_color(&row.background_color)
    {
        resolved.background_color = row.background_color.clone();
    }
    resolved
}

fn has_tag(doc: &Document, node: NodeId, tags: &[&str]) -> bool {
    doc.element(node)
        .is_some_and(|e| tags.iter().any(|tag| e.tag.eq_ignore_ascii_case(tag)))
}

/// Reads every `tr` of the table, each as its `td`/`th` cells.
fn table_rows(doc: &Document, table: NodeId) -> Vec<Vec<Cell>> {
    doc.element_descendants(table)
        .filter(|node| has_tag(doc, *node, &["tr"]))
        .filter_map(|row| {
            let row_style = doc.style(row)?;
            let cells = doc
                .element_descendants(row)
                .filter(|node| has_tag(doc, *node, &["td", "th"]))
                .filter_map(|cell| {
                    let data = doc.element(cell)?;
                    Some(Cell {
                        text: doc.inner_text(cell),
                        width: data.rect.width,
                        height: data.rect.height,
                        style: inherit_row_background(&data.style, row_style),
                    })
                })
                .collect();
            Some(cells)
        })
        .collect()
}

/// Finds the text-bearing nodes of an image element that can be hidden during capture and
/// re-rendered as text: the direct parent of each non-blank text run, unless that parent
/// paints a background or a top border. Only the direct parent is inspected.
fn child_texts(
    doc: &mut Document,
    image: NodeId,
    element_id: &str,
    slide_rect: &Rect,
) -> Result<Vec<ChildText>> {
    let mut parents: IndexSet<NodeId> = IndexSet::new();
    for text_node in doc.text_descendants(image) {
        let blank = doc
            .text(text_node)
            .map_or(true, |text| text.text.trim().is_empty());
        if blank {
            continue;
        }
        let Some(parent) = doc.parent(text_node) else {
            continue;
        };
        let Some(style) = doc.style(parent) else {
            continue;
        };
        let boxed = style.has_background_color() || style.border(BorderSide::Top).is_visible();
        if !boxed {
            parents.insert(parent);
        }
    }

    let mut children = Vec::with_capacity(parents.len());
    for (index, parent) in parents.into_iter().enumerate() {
        let id = format!("{}_child_{}", element_id, index);
        doc.set_attr(parent, CHILD_ID_ATTR, id.clone())?;
        let Some(element) = doc.element(parent) else {
            continue;
        };
        let rect = normalize(&element.rect, slide_rect);
        children.push(ChildText {
            id,
            text: doc.inner_text(parent),
            is_single_line: is_single_line(doc, parent),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            style: element.style.clone(),
        });
    }
    Ok(children)
}
