//! Assigns role tags to untagged nodes of a slide.
//!
//! Container detection runs before text detection: the text pass refuses to tag a node that
//! wraps an already tagged node, so containers must be marked first.

use indextree::NodeId;
use log::debug;

use crate::models::{dom::Document, slide::ElementKind};

/// Maximum difference between line-box tops for text to count as a single line.
pub const SINGLE_LINE_TOLERANCE_PX: f64 = 5.0;
/// Class treated as an explicit container marker.
pub const CARD_CLASS: &str = "card";

/// Number of nodes tagged by one classification run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassificationStats {
    pub containers: usize,
    pub texts: usize,
}

impl ClassificationStats {
    pub fn total(&self) -> usize {
        self.containers + self.texts
    }
}

/// Runs both tagging passes over the slide rooted at `slide_root`.
/// Nodes already tagged (authored or from an earlier run) and slide roots are never retagged.
pub fn classify_slide(doc: &mut Document, slide_root: NodeId) -> ClassificationStats {
    let stats = ClassificationStats {
        containers: tag_containers(doc, slide_root),
        texts: tag_text(doc, slide_root),
    };
    debug!(
        "Classified slide node {:?}: {} containers, {} text nodes",
        slide_root, stats.containers, stats.texts
    );
    stats
}

fn is_candidate(doc: &Document, node: NodeId) -> bool {
    !doc.is_tagged(node) && !doc.is_slide_root(node)
}

fn has_tagged_ancestor_of(doc: &Document, node: NodeId, kinds: &[ElementKind]) -> bool {
    doc.ancestors(node)
        .filter_map(|ancestor| doc.role(ancestor))
        .any(|role| kinds.contains(&role))
}

/// Tags visible nodes that paint a background or border, or carry the card marker, as `shape`.
fn tag_containers(doc: &mut Document, slide_root: NodeId) -> usize {
    let candidates: Vec<NodeId> = doc.element_descendants(slide_root).collect();
    let mut tagged = 0;

    for node in candidates {
        if !is_candidate(doc, node) || has_tagged_ancestor_of(doc, node, &[ElementKind::Table]) {
            continue;
        }
        let Some(element) = doc.element(node) else {
            continue;
        };
        if !element.style.is_visible() {
            continue;
        }
        let is_container = element.style.has_background_color()
            || element.style.has_visible_border()
            || element.has_class(CARD_CLASS);
        if is_container {
            doc.set_role(node, ElementKind::Shape);
            tagged += 1;
        }
    }
    tagged
}

/// Tags visible leaf-most nodes with direct, non-blank text as `text`.
fn tag_text(doc: &mut Document, slide_root: NodeId) -> usize {
    let candidates: Vec<NodeId> = doc.element_descendants(slide_root).collect();
    let mut tagged = 0;

    for node in candidates {
        if !is_candidate(doc, node)
            || has_tagged_ancestor_of(doc, node, &[ElementKind::Table, ElementKind::Image])
        {
            continue;
        }
        // A wrapper of tagged nodes is not text itself.
        if doc
            .element_descendants(node)
            .any(|descendant| doc.is_tagged(descendant))
        {
            continue;
        }
        let has_direct_text = doc.children(node).any(|child| {
            doc.text(child)
                .is_some_and(|text| !text.text.trim().is_empty())
        });
        if !has_direct_text {
            continue;
        }
        if doc.style(node).is_some_and(|style| style.is_visible()) {
            doc.set_role(node, ElementKind::Text);
            tagged += 1;
        }
    }
    tagged
}

/// True when every line box of the element's text starts within
/// [`SINGLE_LINE_TOLERANCE_PX`] of the first one. Elements without text are single-line.
pub fn is_single_line(doc: &Document, node: NodeId) -> bool {
    let rects = doc.text_line_rects(node);
    let Some(first) = rects.first() else {
        return true;
    };
    rects
        .iter()
        .all(|rect| (rect.y - first.y).abs() <= SINGLE_LINE_TOLERANCE_PX)
}
