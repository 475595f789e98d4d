use indextree::NodeId;
use log::warn;

use crate::engine::{EngineResult, RasterImage, RenderEngine};
use crate::models::{
    common::{Rect, Size},
    dom::InlineProperty,
};

/// A scoped set of inline style changes on a live document.
///
/// Every change made through the guard is recorded with the value it replaced. On drop the
/// changes are undone in reverse order, so the document is restored on every exit path,
/// including early returns through `?`. Use [`IsolatedView::restore`] to observe restore
/// failures instead of having them logged.
pub struct IsolatedView<'e, E: RenderEngine + ?Sized> {
    engine: &'e mut E,
    saved: Vec<(NodeId, InlineProperty, Option<String>)>,
}

impl<'e, E: RenderEngine + ?Sized> IsolatedView<'e, E> {
    pub fn new(engine: &'e mut E) -> Self {
        Self {
            engine,
            saved: Vec::new(),
        }
    }

    /// Sets an inline property and records the previous value.
    pub fn set(&mut self, node: NodeId, property: InlineProperty, value: &str) -> EngineResult<()> {
        let previous = self
            .engine
            .set_inline(node, property, Some(value.to_string()))?;
        self.saved.push((node, property, previous));
        Ok(())
    }

    pub fn hide(&mut self, node: NodeId) -> EngineResult<()> {
        self.set(node, InlineProperty::Visibility, "hidden")
    }

    pub fn clear_background(&mut self, node: NodeId) -> EngineResult<()> {
        self.set(node, InlineProperty::Background, "transparent")
    }

    /// Number of recorded changes.
    pub fn len(&self) -> usize {
        self.saved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }

    pub fn bounding_box(&self, node: NodeId) -> EngineResult<Option<Rect>> {
        self.engine.bounding_box(node)
    }

    pub fn canvas_size(&self) -> Size {
        self.engine.canvas_size()
    }

    pub fn capture_clip(&mut self, clip: Rect) -> EngineResult<RasterImage> {
        self.engine.capture_clip(clip)
    }

    pub fn capture_element(&mut self, node: NodeId) -> EngineResult<RasterImage> {
        self.engine.capture_element(node)
    }

    /// Undoes every change, newest first. Stops at the first failure; the remaining changes
    /// are still attempted when the guard drops.
    pub fn restore(mut self) -> EngineResult<()> {
        self.unwind()
    }

    fn unwind(&mut self) -> EngineResult<()> {
        while let Some((node, property, previous)) = self.saved.pop() {
            self.engine.set_inline(node, property, previous)?;
        }
        Ok(())
    }
}

impl<E: RenderEngine + ?Sized> Drop for IsolatedView<'_, E> {
    fn drop(&mut self) {
        while !self.saved.is_empty() {
            if let Err(e) = self.unwind() {
                warn!("Failed to restore inline style after capture: {}", e);
            }
        }
    }
}
