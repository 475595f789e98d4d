//! Drawing-primitive descriptions handed to the deck serializer.
//!
//! All geometry is slide-relative and in pixels; the serializer owns unit conversion.

use serde::{Deserialize, Serialize};

use crate::models::colors::RgbColor;
use crate::models::common::Rect;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HorizontalAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VerticalAnchor {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// A solid fill. `alpha` is `1.0` for fully opaque.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fill {
    pub color: RgbColor,
    pub alpha: f64,
}

impl Fill {
    /// Transparency as most deck formats express it (`1 - alpha`).
    pub fn transparency(&self) -> f64 {
        1.0 - self.alpha
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub width: f64,
    pub color: RgbColor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontSpec {
    pub family: String,
    pub size_px: f64,
    pub bold: bool,
    pub color: RgbColor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBoxSpec {
    pub rect: Rect,
    pub text: String,
    pub font: FontSpec,
    pub align: HorizontalAlign,
    pub anchor: VerticalAnchor,
    /// Unitless multiple of the font size; `None` keeps the serializer default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_spacing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hyperlink: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Fill>,
    pub word_wrap: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeKind {
    Rectangle,
    RoundedRectangle,
    Ellipse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeSpec {
    pub rect: Rect,
    pub kind: ShapeKind,
    /// `None` means no fill.
    pub fill: Option<Fill>,
    /// `None` means no outline.
    pub stroke: Option<Stroke>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCellSpec {
    pub text: String,
    pub font: FontSpec,
    pub fill: Option<Fill>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSpec {
    pub rect: Rect,
    pub rows: usize,
    pub columns: usize,
    pub column_widths: Vec<f64>,
    pub row_heights: Vec<f64>,
    pub cells: Vec<Vec<TableCellSpec>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PictureSpec {
    pub rect: Rect,
    /// PNG-encoded pixels.
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

/// A straight line, used for per-side borders the filled primitives cannot express.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorSpec {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub stroke: Stroke,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum BackgroundSpec {
    Solid {
        color: RgbColor,
    },
    /// A full-slide picture for gradients and image backgrounds.
    Picture {
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideSpec {
    pub id: String,
    pub width: f64,
    pub height: f64,
    pub background: BackgroundSpec,
}

/// One serializer call. A deck is an ordered sequence of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DeckCall {
    CreateSlide(SlideSpec),
    CreateText(TextBoxSpec),
    CreateShape(ShapeSpec),
    CreateTable(TableSpec),
    CreatePicture(PictureSpec),
    CreateConnector(ConnectorSpec),
}

impl DeckCall {
    /// The `op` tag this call serializes with.
    pub fn op_name(&self) -> &'static str {
        match self {
            DeckCall::CreateSlide(_) => "createSlide",
            DeckCall::CreateText(_) => "createText",
            DeckCall::CreateShape(_) => "createShape",
            DeckCall::CreateTable(_) => "createTable",
            DeckCall::CreatePicture(_) => "createPicture",
            DeckCall::CreateConnector(_) => "createConnector",
        }
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
