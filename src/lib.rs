pub mod compiler;
pub mod config;
pub mod converters;
pub mod engine;
pub mod errors;
pub mod extraction;
pub mod models;
pub mod render;
pub mod wasm;

pub use config::{FidelityMode, RenderConfig, RenderConfigBuilder};
pub use converters::{render_snapshot, CallRecorder, DeckConverter, DeckSink};
pub use engine::{RenderEngine, SnapshotEngine};
pub use errors::{DeckError, Result};
pub use extraction::extract_document;
pub use models::{dom::Document, primitives::DeckCall, slide::SlideDocument};
