//! Decides, per element and fidelity mode, whether an element stays an editable primitive or
//! is replaced by a raster capture.

use std::fmt;

use crate::config::FidelityMode;
use crate::models::{
    colors::CssColor,
    slide::{Element, ElementKind},
    style::StyleSnapshot,
};

/// Visual effects detected on one style snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StyleFeatures {
    pub gradient: bool,
    pub glass: bool,
    pub blend: bool,
    pub transparent: bool,
    pub semi_transparent_bg: bool,
    pub semi_transparent_text: bool,
}

impl StyleFeatures {
    pub fn detect(style: &StyleSnapshot) -> Self {
        let blend_mode = style.mix_blend_mode.trim();
        Self {
            gradient: style.background_image.contains("gradient"),
            glass: style.has_backdrop_filter(),
            blend: !blend_mode.is_empty() && blend_mode != "normal",
            transparent: style.opacity_value() < 1.0,
            semi_transparent_bg: CssColor::parse(&style.background_color).is_semi_transparent(),
            semi_transparent_text: CssColor::parse(&style.color).is_semi_transparent(),
        }
    }
}

/// Why an element was downgraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DowngradeReason {
    MaximalMode,
    Gradient,
    Glass,
    Blend,
    Opacity,
    RgbaBackground,
    RgbaText,
}

impl fmt::Display for DowngradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DowngradeReason::MaximalMode => "maximal mode",
            DowngradeReason::Gradient => "gradient",
            DowngradeReason::Glass => "glass effect",
            DowngradeReason::Blend => "blend mode",
            DowngradeReason::Opacity => "opacity",
            DowngradeReason::RgbaBackground => "rgba background",
            DowngradeReason::RgbaText => "rgba text",
        };
        f.write_str(label)
    }
}

/// The outcome for one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderDecision {
    pub kind: ElementKind,
    /// Empty unless the element was downgraded.
    pub reasons: Vec<DowngradeReason>,
}

impl RenderDecision {
    pub fn is_downgrade(&self) -> bool {
        !self.reasons.is_empty()
    }

    pub fn reason_list(&self) -> String {
        self.reasons
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn text_needs_raster(features: &StyleFeatures) -> bool {
    features.transparent || features.blend || features.semi_transparent_text
}

fn shape_needs_raster(features: &StyleFeatures) -> bool {
    features.gradient
        || features.glass
        || features.blend
        || features.transparent
        || features.semi_transparent_bg
}

/// Pure decision for one element. `table` and `image` elements are never changed.
///
/// | Mode    | shape downgrades when                    | text downgrades when        |
/// |---------|------------------------------------------|-----------------------------|
/// | Minimal | never                                    | never                       |
/// | Smart   | gradient, glass, blend, opacity, rgba bg | opacity, blend, rgba text   |
/// | Maximal | always                                   | opacity, blend, rgba text   |
pub fn decide(mode: FidelityMode, kind: ElementKind, style: &StyleSnapshot) -> RenderDecision {
    let features = StyleFeatures::detect(style);
    let downgrade = match (mode, kind) {
        (FidelityMode::Minimal, _) => false,
        (FidelityMode::Smart, ElementKind::Shape) => shape_needs_raster(&features),
        (FidelityMode::Maximal, ElementKind::Shape) => true,
        (_, ElementKind::Text) => text_needs_raster(&features),
        (_, ElementKind::Table | ElementKind::Image) => false,
    };

    if !downgrade {
        return RenderDecision {
            kind,
            reasons: Vec::new(),
        };
    }

    let reasons = if mode == FidelityMode::Maximal && kind == ElementKind::Shape {
        vec![DowngradeReason::MaximalMode]
    } else {
        [
            (features.gradient, DowngradeReason::Gradient),
            (features.glass, DowngradeReason::Glass),
            (features.blend, DowngradeReason::Blend),
            (features.transparent, DowngradeReason::Opacity),
            (features.semi_transparent_bg, DowngradeReason::RgbaBackground),
            (features.semi_transparent_text, DowngradeReason::RgbaText),
        ]
        .into_iter()
        .filter_map(|(fired, reason)| fired.then_some(reason))
        .collect()
    };

    RenderDecision {
        kind: ElementKind::Image,
        reasons,
    }
}

/// Produces the finalized element for `mode`, consuming the classified one.
pub fn finalize(element: Element, mode: FidelityMode) -> (Element, RenderDecision) {
    let decision = decide(mode, element.kind, &element.style);
    let finalized = Element {
        kind: decision.kind,
        ..element
    };
    (finalized, decision)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn styled(edit: impl FnOnce(&mut StyleSnapshot)) -> StyleSnapshot {
        let mut style = StyleSnapshot::default();
        edit(&mut style);
        style
    }

    fn effect_styles() -> Vec<StyleSnapshot> {
        vec![
            StyleSnapshot::default(),
            styled(|s| s.background_image = "linear-gradient(red, blue)".to_string()),
            styled(|s| s.backdrop_filter = "blur(10px)".to_string()),
            styled(|s| s.mix_blend_mode = "multiply".to_string()),
            styled(|s| s.opacity = "0.5".to_string()),
            styled(|s| s.background_color = "rgba(0, 0, 0, 0.4)".to_string()),
            styled(|s| s.color = "rgba(255, 255, 255, 0.7)".to_string()),
        ]
    }

    #[test]
    fn test_minimal_never_downgrades() {
        for style in effect_styles() {
            for kind in [ElementKind::Shape, ElementKind::Text] {
                let decision = decide(FidelityMode::Minimal, kind, &style);
                assert_eq!(decision.kind, kind);
                assert!(!decision.is_downgrade());
            }
        }
    }

    #[test]
    fn test_maximal_always_downgrades_shapes() {
        for style in effect_styles() {
            let decision = decide(FidelityMode::Maximal, ElementKind::Shape, &style);
            assert_eq!(decision.kind, ElementKind::Image);
            assert_eq!(decision.reasons, vec![DowngradeReason::MaximalMode]);
        }
    }

    #[test]
    fn test_smart_shape_predicates() {
        let plain = decide(FidelityMode::Smart, ElementKind::Shape, &StyleSnapshot::default());
        assert_eq!(plain.kind, ElementKind::Shape);

        let gradient = styled(|s| s.background_image = "radial-gradient(red, blue)".to_string());
        let decision = decide(FidelityMode::Smart, ElementKind::Shape, &gradient);
        assert_eq!(decision.kind, ElementKind::Image);
        assert_eq!(decision.reasons, vec![DowngradeReason::Gradient]);

        // Text-only effects do not affect shapes.
        let rgba_text = styled(|s| s.color = "rgba(0, 0, 0, 0.5)".to_string());
        assert_eq!(
            decide(FidelityMode::Smart, ElementKind::Shape, &rgba_text).kind,
            ElementKind::Shape
        );
    }

    #[test]
    fn test_text_predicates_same_in_smart_and_maximal() {
        let gradient = styled(|s| s.background_image = "linear-gradient(red, blue)".to_string());
        let faded = styled(|s| {
            s.opacity = "0.8".to_string();
            s.mix_blend_mode = "screen".to_string();
        });
        for mode in [FidelityMode::Smart, FidelityMode::Maximal] {
            assert_eq!(decide(mode, ElementKind::Text, &gradient).kind, ElementKind::Text);
            let decision = decide(mode, ElementKind::Text, &faded);
            assert_eq!(decision.kind, ElementKind::Image);
            assert_eq!(decision.reason_list(), "blend mode, opacity");
        }
    }

    #[test]
    fn test_tables_and_images_are_untouched() {
        let effects = styled(|s| s.opacity = "0.2".to_string());
        for mode in [FidelityMode::Smart, FidelityMode::Maximal] {
            assert_eq!(decide(mode, ElementKind::Table, &effects).kind, ElementKind::Table);
            assert_eq!(decide(mode, ElementKind::Image, &effects).kind, ElementKind::Image);
        }
    }

    #[test]
    fn test_fully_transparent_background_is_not_semi_transparent() {
        let features = StyleFeatures::detect(&StyleSnapshot::default());
        assert!(!features.semi_transparent_bg);
    }
}
