//! Turns a rendered document snapshot into the slide model.
//!
//! Per slide, strictly in order:
//! 1. `classifier` tags untagged nodes as containers or text.
//! 2. `collector` picks the elements to render and assigns their ids.
//! 3. `resolver` builds style snapshots, the slide background, table cells and overlays.
//! 4. `geometry` expresses every box relative to the slide.
//!
//! Slides are independent; the classifier's tags and the assigned ids are written back into
//! the document so the capture steps can find the same nodes again.

pub mod classifier;
pub mod collector;
pub mod geometry;
pub mod resolver;

use log::{debug, info};

use crate::errors::{DeckError, Result};
use crate::models::{
    dom::Document,
    slide::{Slide, SlideDocument},
};
use collector::{collect_elements, slide_id};
use resolver::{resolve_background, resolve_element};

/// Attribute stamped on each slide root with its slide id.
pub const SLIDE_ID_ATTR: &str = "data-ppt-slide-id";

/// Runs classification, collection and resolution over every slide of the document.
///
/// # Arguments
/// * `doc` - The rendered document. Role tags and ids are written into it.
///
/// # Returns
/// The `SlideDocument` with one `Slide` per slide root, in document order.
pub fn extract_document(doc: &mut Document) -> Result<SlideDocument> {
    let slide_roots = doc.slide_roots();
    let mut slides = Vec::with_capacity(slide_roots.len());

    for (slide_index, slide_root) in slide_roots.into_iter().enumerate() {
        let id = slide_id(slide_index);
        doc.set_attr(slide_root, SLIDE_ID_ATTR, id.clone())?;

        classifier::classify_slide(doc, slide_root);
        let collected = collect_elements(doc, slide_root, slide_index)?;

        let slide_rect = doc
            .rect(slide_root)
            .ok_or_else(|| DeckError::MissingData(format!("slide {} has no layout box", id)))?;
        let background = resolve_background(doc, slide_root)?;

        let mut elements = Vec::with_capacity(collected.len());
        for item in &collected {
            let element = resolve_element(doc, item, &slide_rect)?;
            debug!(
                "Extracted {} ({}) at ({:.1}, {:.1}) {:.1}x{:.1}",
                element.id, element.kind, element.x, element.y, element.width, element.height
            );
            elements.push(element);
        }

        slides.push(Slide {
            id,
            background,
            elements,
        });
    }

    let document = SlideDocument { slides };
    info!(
        "Extracted {} slides with {} elements",
        document.slides.len(),
        document.element_count()
    );
    Ok(document)
}
