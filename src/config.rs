//! Global settings consumed by the extraction and rendering pipeline.

use std::{fmt, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::{DeckError, Result};

pub const DEFAULT_CANVAS_WIDTH_PX: f64 = 1280.0;
pub const DEFAULT_CANVAS_HEIGHT_PX: f64 = 720.0;
pub const DEFAULT_TEXT_WIDTH_FACTOR: f64 = 1.1;
pub const DEFAULT_CAPTURE_PADDING_PX: f64 = 30.0;

/// How aggressively visually complex elements are replaced by raster captures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FidelityMode {
    /// Keep every classified element editable; only explicit `image` elements are captured.
    Minimal,
    /// Capture elements whose effects the primitive set cannot express.
    #[default]
    Smart,
    /// Capture every container; text still stays editable unless it needs effects.
    Maximal,
}

impl FidelityMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FidelityMode::Minimal => "minimal",
            FidelityMode::Smart => "smart",
            FidelityMode::Maximal => "maximal",
        }
    }
}

impl fmt::Display for FidelityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FidelityMode {
    type Err = DeckError;

    /// Accepts both the mode names and the numeric levels `1`, `2`, `3`.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "minimal" => Ok(FidelityMode::Minimal),
            "2" | "smart" => Ok(FidelityMode::Smart),
            "3" | "maximal" => Ok(FidelityMode::Maximal),
            other => Err(DeckError::InvalidConfig(format!(
                "unknown fidelity mode '{}', expected minimal, smart or maximal",
                other
            ))),
        }
    }
}

/// Configuration threaded through extraction, capture and primitive mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderConfig {
    /// Width of one slide canvas in pixels.
    pub canvas_width: f64,
    /// Height of one slide canvas in pixels.
    pub canvas_height: f64,
    /// Multiplier applied to single-line text boxes so they do not wrap.
    pub text_width_factor: f64,
    /// Fidelity mode used by the render-mode decision.
    pub mode: FidelityMode,
    /// Extra pixels captured around an isolated element (shadows, glows).
    pub capture_padding: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            canvas_width: DEFAULT_CANVAS_WIDTH_PX,
            canvas_height: DEFAULT_CANVAS_HEIGHT_PX,
            text_width_factor: DEFAULT_TEXT_WIDTH_FACTOR,
            mode: FidelityMode::default(),
            capture_padding: DEFAULT_CAPTURE_PADDING_PX,
        }
    }
}

impl RenderConfig {
    /// Loads a configuration from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: RenderConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the numeric fields for values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.canvas_width > 0.0 && self.canvas_height > 0.0) {
            return Err(DeckError::InvalidConfig(format!(
                "canvas must be positive, got {}x{}",
                self.canvas_width, self.canvas_height
            )));
        }
        if !(self.text_width_factor >= 1.0) {
            return Err(DeckError::InvalidConfig(format!(
                "text width factor must be >= 1, got {}",
                self.text_width_factor
            )));
        }
        if !(self.capture_padding >= 0.0) {
            return Err(DeckError::InvalidConfig(format!(
                "capture padding must be >= 0, got {}",
                self.capture_padding
            )));
        }
        Ok(())
    }
}

/// Builder for creating a `RenderConfig`.
/// Starts from the defaults (or an existing config) and validates on `build`.
#[derive(Default)]
pub struct RenderConfigBuilder {
    config: RenderConfig,
}

impl RenderConfigBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Starts from an existing configuration, e.g. one loaded from disk.
    pub fn from_config(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn set_canvas(mut self, width: f64, height: f64) -> Self {
        self.config.canvas_width = width;
        self.config.canvas_height = height;
        self
    }

    pub fn set_mode(mut self, mode: FidelityMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn set_text_width_factor(mut self, factor: f64) -> Self {
        self.config.text_width_factor = factor;
        self
    }

    pub fn set_capture_padding(mut self, padding: f64) -> Self {
        self.config.capture_padding = padding;
        self
    }

    /// Builds the `RenderConfig`.
    /// Returns an error if any value is out of range.
    pub fn build(self) -> Result<RenderConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
