use thiserror::Error;

use crate::engine::EngineError;

/// Represents errors that can occur while turning a rendered document into a slide deck.
#[derive(Error, Debug)]
pub enum DeckError {
    /// A query or capture against the rendering engine failed. Fatal for the current document.
    #[error("Rendering engine failure: {0}")]
    Engine(#[from] EngineError),

    /// The primitive serializer rejected a call, e.g. a primitive with no open slide.
    #[error("Serializer rejected a call: {0}")]
    Sink(String),

    /// The supplied render configuration is not usable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Data required to build a slide or primitive is missing from the snapshot.
    #[error("Missing expected data: {0}")]
    MissingData(String),

    /// Error occurred while reading or writing JSON (snapshots, configs, call logs).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A markup rewriting pattern failed to compile.
    #[error("Markup pattern error: {0}")]
    Markup(#[from] regex::Error),

    /// An I/O error occurred, usually while reading an input file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A type alias for `Result<T, DeckError>` for convenience within the crate.
pub type Result<T> = std::result::Result<T, DeckError>;
