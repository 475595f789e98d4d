use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque RGB color with 8-bit channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RgbColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl RgbColor {
    pub const BLACK: RgbColor = RgbColor::new(0, 0, 0);
    pub const WHITE: RgbColor = RgbColor::new(255, 255, 255);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Formats the color as `#rrggbb`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A resolved CSS color as reported by the rendering engine.
///
/// `explicit_alpha` records whether the source string was in an alpha-bearing form
/// (`rgba(...)`, `rgb(... / a)`, `#rrggbbaa`). Effects detection only looks at colors
/// written that way, matching how engines serialize translucent colors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CssColor {
    pub rgb: RgbColor,
    /// Alpha in `0.0..=1.0`.
    pub alpha: f64,
    pub explicit_alpha: bool,
}

impl Default for CssColor {
    fn default() -> Self {
        Self::opaque(RgbColor::BLACK)
    }
}

impl CssColor {
    pub fn opaque(rgb: RgbColor) -> Self {
        Self {
            rgb,
            alpha: 1.0,
            explicit_alpha: false,
        }
    }

    /// Parses a CSS color string. Unparsable input yields opaque black, never an error.
    pub fn parse(value: &str) -> Self {
        try_parse_color(value).unwrap_or_default()
    }

    /// True when the alpha channel is zero (nothing would be painted).
    pub fn is_fully_transparent(&self) -> bool {
        self.alpha <= 0.0
    }

    /// True for an alpha-bearing color form with `0 < alpha < 1`.
    pub fn is_semi_transparent(&self) -> bool {
        self.explicit_alpha && self.alpha > 0.0 && self.alpha < 1.0
    }
}

/// Returns true when `value` paints nothing: `transparent`, an empty value, or zero alpha.
/// Malformed values count as painted (they resolve to opaque black).
pub fn is_transparent_color(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return true;
    }
    CssColor::parse(trimmed).is_fully_transparent()
}

/// Parses any CSS color `csscolorparser` understands (named, hex, `rgb()`, `hsl()`, ...).
pub fn try_parse_color(value: &str) -> Option<CssColor> {
    let value = value.trim();
    let parsed: csscolorparser::Color = value.parse().ok()?;
    let [red, green, blue, _] = parsed.to_rgba8();
    Some(CssColor {
        rgb: RgbColor::new(red, green, blue),
        alpha: f64::from(parsed.a).clamp(0.0, 1.0),
        explicit_alpha: has_alpha_form(value),
    })
}

/// True for forms that spell out an alpha channel: `rgba(`/`hsla(`, a `/ a` component,
/// `#rgba`/`#rrggbbaa` and the `transparent` keyword.
fn has_alpha_form(value: &str) -> bool {
    let value = value.to_ascii_lowercase();
    if value == "transparent" {
        return true;
    }
    if let Some(hex) = value.strip_prefix('#') {
        return matches!(hex.len(), 4 | 8);
    }
    value.starts_with("rgba(") || value.starts_with("hsla(") || value.contains('/')
}
