use serde::{Deserialize, Serialize};

use crate::models::colors::{is_transparent_color, CssColor};

/// One side of a box border.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderSide {
    Top,
    Right,
    Bottom,
    Left,
}

impl BorderSide {
    pub const ALL: [BorderSide; 4] = [
        BorderSide::Top,
        BorderSide::Right,
        BorderSide::Bottom,
        BorderSide::Left,
    ];
}

/// The resolved width/color/style triple for one border side, as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Border<'a> {
    pub width: &'a str,
    pub color: &'a str,
    pub style: &'a str,
}

impl Border<'_> {
    /// Border width in pixels; `None` when the value cannot be read as a length.
    pub fn width_px(&self) -> Option<f64> {
        parse_px(self.width)
    }

    /// A border is drawn when it has a positive width and a style other than `none`.
    pub fn is_visible(&self) -> bool {
        self.width_px().is_some_and(|w| w > 0.0) && self.style != "none" && self.style != "hidden"
    }
}

/// Flat snapshot of the resolved visual properties of one node.
///
/// Values are kept verbatim as the rendering engine serialized them; field names match the
/// engine's computed-style property names. Missing fields take the CSS initial values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleSnapshot {
    pub color: String,
    pub font_size: String,
    pub font_family: String,
    pub font_weight: String,
    pub text_align: String,
    pub opacity: String,
    pub visibility: String,
    pub box_shadow: String,
    pub background_color: String,
    pub background_image: String,
    pub border_radius: String,

    pub border_top_width: String,
    pub border_top_color: String,
    pub border_top_style: String,
    pub border_right_width: String,
    pub border_right_color: String,
    pub border_right_style: String,
    pub border_bottom_width: String,
    pub border_bottom_color: String,
    pub border_bottom_style: String,
    pub border_left_width: String,
    pub border_left_color: String,
    pub border_left_style: String,

    pub line_height: String,
    pub letter_spacing: String,
    pub display: String,
    pub align_items: String,
    pub justify_content: String,
    pub flex_direction: String,
    pub mix_blend_mode: String,
    pub backdrop_filter: String,
    pub webkit_backdrop_filter: String,
}

impl Default for StyleSnapshot {
    fn default() -> Self {
        let none = || "none".to_string();
        let zero = || "0px".to_string();
        let black = || "rgb(0, 0, 0)".to_string();
        Self {
            color: black(),
            font_size: "16px".to_string(),
            font_family: "Arial".to_string(),
            font_weight: "400".to_string(),
            text_align: "start".to_string(),
            opacity: "1".to_string(),
            visibility: "visible".to_string(),
            box_shadow: none(),
            background_color: "rgba(0, 0, 0, 0)".to_string(),
            background_image: none(),
            border_radius: zero(),
            border_top_width: zero(),
            border_top_color: black(),
            border_top_style: none(),
            border_right_width: zero(),
            border_right_color: black(),
            border_right_style: none(),
            border_bottom_width: zero(),
            border_bottom_color: black(),
            border_bottom_style: none(),
            border_left_width: zero(),
            border_left_color: black(),
            border_left_style: none(),
            line_height: "normal".to_string(),
            letter_spacing: "normal".to_string(),
            display: "block".to_string(),
            align_items: "normal".to_string(),
            justify_content: "normal".to_string(),
            flex_direction: "row".to_string(),
            mix_blend_mode: "normal".to_string(),
            backdrop_filter: none(),
            webkit_backdrop_filter: none(),
        }
    }
}

impl StyleSnapshot {
    pub fn border(&self, side: BorderSide) -> Border<'_> {
        match side {
            BorderSide::Top => Border {
                width: &self.border_top_width,
                color: &self.border_top_color,
                style: &self.border_top_style,
            },
            BorderSide::Right => Border {
                width: &self.border_right_width,
                color: &self.border_right_color,
                style: &self.border_right_style,
            },
            BorderSide::Bottom => Border {
                width: &self.border_bottom_width,
                color: &self.border_bottom_color,
                style: &self.border_bottom_style,
            },
            BorderSide::Left => Border {
                width: &self.border_left_width,
                color: &self.border_left_color,
                style: &self.border_left_style,
            },
        }
    }

    /// Resolved opacity; malformed values count as fully opaque.
    pub fn opacity_value(&self) -> f64 {
        self.opacity.trim().parse::<f64>().unwrap_or(1.0)
    }

    /// Font size in pixels, falling back to the 16px initial value.
    pub fn font_size_px(&self) -> f64 {
        parse_px(&self.font_size)
            .filter(|size| *size > 0.0)
            .unwrap_or(16.0)
    }

    pub fn is_visible(&self) -> bool {
        self.display != "none" && self.visibility != "hidden" && self.opacity_value() != 0.0
    }

    pub fn background(&self) -> CssColor {
        CssColor::parse(&self.background_color)
    }

    pub fn text_color(&self) -> CssColor {
        CssColor::parse(&self.color)
    }

    pub fn has_background_color(&self) -> bool {
        !is_transparent_color(&self.background_color)
    }

    pub fn has_background_image(&self) -> bool {
        let image = self.background_image.trim();
        !image.is_empty() && image != "none"
    }

    /// True when any of the four sides draws a border.
    pub fn has_visible_border(&self) -> bool {
        BorderSide::ALL
            .iter()
            .any(|side| self.border(*side).is_visible())
    }

    pub fn has_backdrop_filter(&self) -> bool {
        let set = |v: &str| !v.trim().is_empty() && v.trim() != "none";
        set(&self.backdrop_filter) || set(&self.webkit_backdrop_filter)
    }

    pub fn is_flex(&self) -> bool {
        self.display == "flex" || self.display == "inline-flex"
    }

    /// Block-level boxes start a new line in extracted text.
    pub fn is_block_level(&self) -> bool {
        matches!(
            self.display.as_str(),
            "block" | "flex" | "grid" | "list-item" | "table" | "table-row" | "flow-root"
        )
    }
}

/// Reads a CSS length in pixels (`"12px"`, `"12.5px"` or a bare `"12"`).
pub fn parse_px(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let number = trimmed.strip_suffix("px").unwrap_or(trimmed).trim();
    number.parse::<f64>().ok().filter(|v| v.is_finite())
}
