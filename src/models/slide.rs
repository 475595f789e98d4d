use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::DeckError;
use crate::models::common::Rect;
use crate::models::style::StyleSnapshot;

/// The role of an extracted element; also the value of the role-tag attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// Editable text box.
    Text,
    /// Container with a fill and/or border; may host nested elements.
    Shape,
    /// Raster capture of the element's rendered pixels.
    Image,
    /// Grid of cells.
    Table,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Text => "text",
            ElementKind::Shape => "shape",
            ElementKind::Image => "image",
            ElementKind::Table => "table",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementKind {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "text" => Ok(ElementKind::Text),
            "shape" => Ok(ElementKind::Shape),
            "image" => Ok(ElementKind::Image),
            "table" => Ok(ElementKind::Table),
            other => Err(DeckError::MissingData(format!(
                "unknown element role '{}'",
                other
            ))),
        }
    }
}

/// How a padded capture window was clamped to the canvas.
/// `crop_left`/`crop_top` are how far the clamped window starts after the intended padded origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropInfo {
    pub crop_left: f64,
    pub crop_top: f64,
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

/// Resolved slide background: a color, plus the background image value when one is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideBackground {
    pub color: String,
    /// `None` when the resolved `background-image` is `none`.
    pub image: Option<String>,
}

/// A text-bearing node inside an `image` element, re-rendered as editable text on top of the capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildText {
    pub id: String,
    pub text: String,
    pub is_single_line: bool,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub style: StyleSnapshot,
}

/// One table cell. `style.background_color` already reflects row inheritance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub text: String,
    pub width: f64,
    pub height: f64,
    pub style: StyleSnapshot,
}

/// An extracted element with slide-relative geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// `slide_{s}_el_{i}`; unique within the document.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub text: String,
    pub is_single_line: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub style: StyleSnapshot,
    /// Populated for `image` elements only.
    #[serde(default)]
    pub children: Vec<ChildText>,
    /// Populated for `table` elements only.
    #[serde(default)]
    pub rows: Vec<Vec<Cell>>,
}

impl Element {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Borrowed view used by the text-box mapper.
    pub fn text_source(&self) -> TextSource<'_> {
        TextSource {
            rect: self.rect(),
            text: &self.text,
            is_single_line: self.is_single_line,
            href: self.href.as_deref(),
            style: &self.style,
        }
    }
}

impl ChildText {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn text_source(&self) -> TextSource<'_> {
        TextSource {
            rect: self.rect(),
            text: &self.text,
            is_single_line: self.is_single_line,
            href: None,
            style: &self.style,
        }
    }
}

/// Whatever a text box is built from: an element or a rescued child overlay.
#[derive(Debug, Clone, Copy)]
pub struct TextSource<'a> {
    pub rect: Rect,
    pub text: &'a str,
    pub is_single_line: bool,
    pub href: Option<&'a str>,
    pub style: &'a StyleSnapshot,
}

/// One slide and its elements in paint order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    /// `slide_{index}`.
    pub id: String,
    pub background: SlideBackground,
    pub elements: Vec<Element>,
}

/// The extraction result for one input document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideDocument {
    pub slides: Vec<Slide>,
}

impl SlideDocument {
    pub fn element_count(&self) -> usize {
        self.slides.iter().map(|slide| slide.elements.len()).sum()
    }
}
