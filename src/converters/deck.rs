//! Drives the whole conversion: extraction, per-element decisions, isolation captures and
//! primitive mapping, emitting calls into a [`DeckSink`].

use indextree::NodeId;
use log::{debug, info, warn};

use crate::config::RenderConfig;
use crate::converters::sink::{CallRecorder, DeckSink};
use crate::engine::{IsolatedView, RenderEngine, SnapshotEngine};
use crate::errors::{DeckError, Result};
use crate::extraction::{
    collector::ELEMENT_ID_ATTR, extract_document, geometry::compute_crop, resolver::CHILD_ID_ATTR,
};
use crate::models::{
    dom::{Document, InlineProperty},
    primitives::SlideSpec,
    slide::{CropInfo, Element, ElementKind, Slide},
};
use crate::render::{
    decision::finalize,
    mapper::{background_spec, map_image, map_vector},
};

/// Characters of an element's text quoted in out-of-bounds warnings.
const OVERFLOW_PREVIEW_CHARS: usize = 20;
/// Slack allowed past the canvas edge before an element counts as out of bounds.
const OVERFLOW_TOLERANCE_PX: f64 = 1.0;

/// Counters describing one conversion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionReport {
    pub slides: usize,
    pub elements: usize,
    /// Elements switched to raster rendering by the fidelity mode.
    pub downgraded: usize,
    /// Isolation captures taken, background captures excluded.
    pub captures: usize,
    pub out_of_bounds: usize,
}

/// Converts a rendered document into deck calls.
#[derive(Debug, Clone, Default)]
pub struct DeckConverter {
    config: RenderConfig,
}

impl DeckConverter {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Runs the full pipeline against `engine`, writing every primitive into `sink`.
    ///
    /// Slides and elements are processed strictly in order. Any engine failure other than a
    /// recoverable clip capture aborts the whole document.
    ///
    /// # Arguments
    /// * `engine` - The rendering session holding the live document.
    /// * `sink` - Receives the slide and primitive calls in paint order.
    ///
    /// # Returns
    /// A `ConversionReport` with per-run counters.
    pub fn convert(
        &self,
        engine: &mut dyn RenderEngine,
        sink: &mut dyn DeckSink,
    ) -> Result<ConversionReport> {
        self.config.validate()?;

        let mut doc = engine.snapshot()?;
        let document = extract_document(&mut doc)?;
        let slide_roots = doc.slide_roots();
        let mut report = ConversionReport::default();

        for (index, (slide, slide_root)) in document.slides.iter().zip(slide_roots).enumerate() {
            self.convert_slide(engine, sink, &doc, slide_root, index, slide, &mut report)?;
            report.slides += 1;
        }

        info!(
            "Rendered {} slides: {} elements, {} downgraded to images, {} captures",
            report.slides, report.elements, report.downgraded, report.captures
        );
        Ok(report)
    }

    #[allow(clippy::too_many_arguments)]
    fn convert_slide(
        &self,
        engine: &mut dyn RenderEngine,
        sink: &mut dyn DeckSink,
        doc: &Document,
        slide_root: NodeId,
        index: usize,
        slide: &Slide,
        report: &mut ConversionReport,
    ) -> Result<()> {
        let picture = match &slide.background.image {
            Some(image) => {
                debug!("Slide {} has background image '{}', capturing it", slide.id, image);
                Some(capture_background(engine, doc, slide_root, slide)?)
            }
            None => None,
        };
        sink.create_slide(SlideSpec {
            id: slide.id.clone(),
            width: self.config.canvas_width,
            height: self.config.canvas_height,
            background: background_spec(&slide.background, picture),
        })?;

        for element in &slide.elements {
            if self.is_out_of_bounds(element) {
                let preview: String = element.text.chars().take(OVERFLOW_PREVIEW_CHARS).collect();
                warn!(
                    "Element '{}...' on slide {} is out of bounds",
                    preview,
                    index + 1
                );
                report.out_of_bounds += 1;
            }
        }

        for element in &slide.elements {
            let original_kind = element.kind;
            let (element, decision) = finalize(element.clone(), self.config.mode);
            if decision.is_downgrade() {
                info!(
                    "Element '{}' ({}) has {}, switching to image rendering.",
                    element.id,
                    original_kind,
                    decision.reason_list()
                );
                report.downgraded += 1;
            }

            let calls = match element.kind {
                ElementKind::Image => {
                    let (data, crop) = self.capture_element(engine, doc, slide_root, &element)?;
                    report.captures += 1;
                    map_image(&element, data, crop.as_ref(), self.config.text_width_factor)
                }
                _ => map_vector(&element, self.config.text_width_factor),
            };
            for call in calls {
                sink.apply(call)?;
            }
            report.elements += 1;
        }
        Ok(())
    }

    fn is_out_of_bounds(&self, element: &Element) -> bool {
        element.x + element.width > self.config.canvas_width + OVERFLOW_TOLERANCE_PX
            || element.y + element.height > self.config.canvas_height + OVERFLOW_TOLERANCE_PX
    }

    /// Captures one element in isolation.
    ///
    /// Every other tagged element of the slide is hidden, except the element's ancestors and
    /// descendants. The slide and page backgrounds are cleared unless the element blurs its
    /// backdrop, and the element's text overlays are made fully transparent. The padded,
    /// canvas-clamped window is captured; when it collapses or its capture fails the element
    /// box is captured instead, without crop info.
    fn capture_element(
        &self,
        engine: &mut dyn RenderEngine,
        doc: &Document,
        slide_root: NodeId,
        element: &Element,
    ) -> Result<(Vec<u8>, Option<CropInfo>)> {
        let target = node_with(doc, ELEMENT_ID_ATTR, &element.id)?;
        let mut view = IsolatedView::new(engine);

        if !element.style.has_backdrop_filter() {
            view.clear_background(slide_root)?;
            if doc.root() != slide_root {
                view.clear_background(doc.root())?;
            }
        }
        let others: Vec<NodeId> = doc
            .element_descendants(slide_root)
            .filter(|node| doc.is_tagged(*node))
            .filter(|node| !doc.contains(target, *node) && !doc.contains(*node, target))
            .collect();
        for node in others {
            view.hide(node)?;
        }
        for child in &element.children {
            let node = node_with(doc, CHILD_ID_ATTR, &child.id)?;
            view.set(node, InlineProperty::Opacity, "0")?;
        }

        let canvas = view.canvas_size();
        let window = view
            .bounding_box(target)?
            .and_then(|bbox| compute_crop(&bbox, self.config.capture_padding, canvas));

        let (raster, crop) = match window {
            Some(window) => match view.capture_clip(window.clip) {
                Ok(raster) => (raster, Some(window.crop)),
                Err(e) => {
                    warn!(
                        "Clip capture of {} failed ({}), capturing the element box instead",
                        element.id, e
                    );
                    (view.capture_element(target)?, None)
                }
            },
            None => {
                warn!(
                    "Capture window of {} is empty, capturing the element box instead",
                    element.id
                );
                (view.capture_element(target)?, None)
            }
        };
        view.restore()?;

        debug!(
            "Captured {} as {}x{} image{}",
            element.id,
            raster.width,
            raster.height,
            if crop.is_some() { " with crop" } else { "" }
        );
        Ok((raster.data, crop))
    }
}

/// Captures the slide with all of its elements hidden.
fn capture_background(
    engine: &mut dyn RenderEngine,
    doc: &Document,
    slide_root: NodeId,
    slide: &Slide,
) -> Result<Vec<u8>> {
    let mut view = IsolatedView::new(engine);
    for element in &slide.elements {
        view.hide(node_with(doc, ELEMENT_ID_ATTR, &element.id)?)?;
    }
    let raster = view.capture_element(slide_root)?;
    view.restore()?;
    Ok(raster.data)
}

fn node_with(doc: &Document, attr: &str, value: &str) -> Result<NodeId> {
    doc.find_by_attr(attr, value)
        .ok_or_else(|| DeckError::MissingData(format!("no node with {}='{}'", attr, value)))
}

/// Renders a snapshot dump with the in-memory engine and records the calls.
///
/// # Arguments
/// * `snapshot_json` - The document dump (`{"root": ...}`).
/// * `config` - Canvas, fidelity mode and capture settings.
///
/// # Returns
/// The `CallRecorder` holding the full call sequence.
pub fn render_snapshot(snapshot_json: &str, config: &RenderConfig) -> Result<CallRecorder> {
    let document = Document::from_json(snapshot_json)?;
    let mut engine = SnapshotEngine::from_config(document, config);
    let mut recorder = CallRecorder::new();
    DeckConverter::new(config.clone()).convert(&mut engine, &mut recorder)?;
    Ok(recorder)
}
