//! The boundary to the rendering engine: layout queries, inline style toggles and raster
//! captures against one live document.
//!
//! Node handles are the [`NodeId`]s of the [`Document`] returned by
//! [`RenderEngine::snapshot`]. Classification only adds attributes, so ids taken from a
//! classified copy of the snapshot stay valid for the engine.

pub mod isolation;
pub mod snapshot;

use indextree::NodeId;
use thiserror::Error;

use crate::models::{
    common::{Rect, Size},
    dom::{Document, InlineProperty},
};

pub use isolation::IsolatedView;
pub use snapshot::SnapshotEngine;

/// Failures reported by a rendering engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The handle does not name an element of the live document.
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// The engine could not produce or encode the requested pixels.
    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    /// The requested region has no pixels.
    #[error("Capture region is empty: {0}")]
    EmptyCapture(String),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// PNG-encoded pixels of one capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// A rendering session over one document.
///
/// Every call is a suspension point of the session; callers issue them strictly one at a
/// time. Inline changes made through [`RenderEngine::set_inline`] are visible to every later
/// query and capture until they are reverted.
pub trait RenderEngine {
    /// Dumps the resolved style and layout box of every node in one bulk query.
    fn snapshot(&self) -> EngineResult<Document>;

    /// The capture canvas: viewport width by the height needed to fit all content.
    fn canvas_size(&self) -> Size;

    /// Current layout box of an element, `None` when it has no box.
    fn bounding_box(&self, node: NodeId) -> EngineResult<Option<Rect>>;

    /// Sets or clears one inline style property and returns the previous inline value.
    fn set_inline(
        &mut self,
        node: NodeId,
        property: InlineProperty,
        value: Option<String>,
    ) -> EngineResult<Option<String>>;

    /// Captures the element's own box, without a page background.
    fn capture_element(&mut self, node: NodeId) -> EngineResult<RasterImage>;

    /// Captures a canvas region, without a page background.
    fn capture_clip(&mut self, clip: Rect) -> EngineResult<RasterImage>;
}
