//! Selects the elements of a slide that become primitives.

use indextree::NodeId;
use log::warn;

use crate::errors::Result;
use crate::models::{
    dom::{Document, RENDER_ATTR},
    slide::ElementKind,
};

/// Attribute holding the element id assigned during collection; later capture steps find
/// the live node through it.
pub const ELEMENT_ID_ATTR: &str = "data-ppt-id";

/// A kept element: its node, its document-unique id and its classified kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedElement {
    pub node: NodeId,
    pub id: String,
    pub kind: ElementKind,
}

pub fn slide_id(slide_index: usize) -> String {
    format!("slide_{}", slide_index)
}

pub fn element_id(slide_index: usize, element_index: usize) -> String {
    format!("slide_{}_el_{}", slide_index, element_index)
}

/// Collects the tagged descendants of `slide_root` that are not nested inside a tagged
/// non-container element, and stamps each with its id.
///
/// Only `shape` ancestors may host nested elements; anything under a `text`, `image` or
/// `table` element is represented by that ancestor.
pub fn collect_elements(
    doc: &mut Document,
    slide_root: NodeId,
    slide_index: usize,
) -> Result<Vec<CollectedElement>> {
    let kept: Vec<(NodeId, ElementKind)> = doc
        .element_descendants(slide_root)
        .filter(|node| doc.is_tagged(*node))
        .filter(|node| match doc.tagged_ancestor(*node) {
            None => true,
            Some(ancestor) => doc.role(ancestor) == Some(ElementKind::Shape),
        })
        .filter_map(|node| match doc.role(node) {
            Some(kind) => Some((node, kind)),
            None => {
                warn!(
                    "Ignoring element with unrecognized {} value '{}'",
                    RENDER_ATTR,
                    doc.attr(node, RENDER_ATTR).unwrap_or_default()
                );
                None
            }
        })
        .collect();

    let mut collected = Vec::with_capacity(kept.len());
    for (index, (node, kind)) in kept.into_iter().enumerate() {
        let id = element_id(slide_index, index);
        doc.set_attr(node, ELEMENT_ID_ATTR, id.clone())?;
        collected.push(CollectedElement { node, id, kind });
    }
    Ok(collected)
}
