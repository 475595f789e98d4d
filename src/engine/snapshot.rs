//! An in-memory rendering engine serving a previously dumped document.
//!
//! Captures rasterize what the snapshot can express without a layout engine: the solid
//! background and the borders of every visible element box, alpha-blended in document
//! order. Text glyphs, gradients and image backgrounds are not painted.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use indextree::NodeId;
use log::debug;

use crate::config::RenderConfig;
use crate::engine::{EngineError, EngineResult, RasterImage, RenderEngine};
use crate::models::{
    colors::CssColor,
    common::{Rect, Size},
    dom::{Document, DomNode, InlineProperty},
    style::{BorderSide, StyleSnapshot},
};

/// Serves a loaded [`Document`] as a rendering session.
#[derive(Debug, Clone)]
pub struct SnapshotEngine {
    document: Document,
    viewport: Size,
}

impl SnapshotEngine {
    pub fn new(document: Document, viewport: Size) -> Self {
        Self { document, viewport }
    }

    /// Uses the configured canvas as the viewport.
    pub fn from_config(document: Document, config: &RenderConfig) -> Self {
        Self::new(
            document,
            Size::new(config.canvas_width, config.canvas_height),
        )
    }

    /// The live document, including any inline overrides currently applied.
    pub fn document(&self) -> &Document {
        &self.document
    }

    fn rasterize(&self, clip: Rect) -> EngineResult<RasterImage> {
        let width = clip.width.round();
        let height = clip.height.round();
        if width < 1.0 || height < 1.0 {
            return Err(EngineError::EmptyCapture(format!(
                "{:.1}x{:.1} at ({:.1}, {:.1})",
                clip.width, clip.height, clip.x, clip.y
            )));
        }

        let mut canvas = RgbaImage::new(width as u32, height as u32);
        self.paint(self.document.root(), &clip, &mut canvas, None, 1.0);

        let mut data = Vec::new();
        DynamicImage::ImageRgba8(canvas)
            .write_to(&mut Cursor::new(&mut data), ImageFormat::Png)
            .map_err(|e| EngineError::CaptureFailed(e.to_string()))?;
        debug!(
            "Captured {}x{} region at ({:.1}, {:.1})",
            width, height, clip.x, clip.y
        );
        Ok(RasterImage {
            data,
            width: width as u32,
            height: height as u32,
        })
    }

    /// Paints `node` and its subtree. `inherited_visibility` is the nearest inline visibility
    /// override above the node; `opacity` is the product of ancestor opacities.
    fn paint(
        &self,
        node: NodeId,
        clip: &Rect,
        canvas: &mut RgbaImage,
        inherited_visibility: Option<&str>,
        opacity: f64,
    ) {
        let Some(DomNode::Element(element)) = self.document.node(node) else {
            return;
        };
        let style = element.effective_style();
        if style.display == "none" {
            return;
        }

        let own_visibility = element.inline.visibility.as_deref();
        let visibility_override = own_visibility.or(inherited_visibility);
        let visible = match visibility_override {
            Some(value) => value != "hidden" && value != "collapse",
            None => style.visibility != "hidden",
        };
        let opacity = opacity * style.opacity_value();
        if opacity <= 0.0 {
            return;
        }

        if visible {
            paint_box(&style, &element.rect, clip, canvas, opacity);
        }
        for child in self.document.children(node) {
            self.paint(child, clip, canvas, visibility_override, opacity);
        }
    }
}

fn paint_box(style: &StyleSnapshot, rect: &Rect, clip: &Rect, canvas: &mut RgbaImage, opacity: f64) {
    if style.has_background_image() {
        debug!("Background image '{}' is not rasterized", style.background_image);
    }
    let background = style.background();
    if !background.is_fully_transparent() {
        fill_rect(canvas, clip, rect, background, opacity);
    }

    for side in BorderSide::ALL {
        let border = style.border(side);
        if !border.is_visible() {
            continue;
        }
        let Some(width) = border.width_px() else {
            continue;
        };
        let strip = match side {
            BorderSide::Top => Rect::new(rect.x, rect.y, rect.width, width),
            BorderSide::Bottom => Rect::new(rect.x, rect.bottom() - width, rect.width, width),
            BorderSide::Left => Rect::new(rect.x, rect.y, width, rect.height),
            BorderSide::Right => Rect::new(rect.right() - width, rect.y, width, rect.height),
        };
        fill_rect(canvas, clip, &strip, CssColor::parse(border.color), opacity);
    }
}

/// Source-over blends `color` into the part of `rect` that falls inside `clip`.
fn fill_rect(canvas: &mut RgbaImage, clip: &Rect, rect: &Rect, color: CssColor, opacity: f64) {
    let alpha = (color.alpha * opacity).clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }
    let (width, height) = canvas.dimensions();
    let span = |start: f64, end: f64, limit: u32| {
        let from = start.round().max(0.0).min(limit as f64) as u32;
        let to = end.round().max(0.0).min(limit as f64) as u32;
        from..to
    };
    let xs = span(rect.x - clip.x, rect.right() - clip.x, width);
    let ys = span(rect.y - clip.y, rect.bottom() - clip.y, height);

    let source = [
        color.rgb.red as f64 / 255.0,
        color.rgb.green as f64 / 255.0,
        color.rgb.blue as f64 / 255.0,
    ];
    for y in ys {
        for x in xs.clone() {
            let pixel = canvas.get_pixel_mut(x, y);
            *pixel = blend(*pixel, source, alpha);
        }
    }
}

fn blend(dst: Rgba<u8>, src: [f64; 3], src_alpha: f64) -> Rgba<u8> {
    let dst_alpha = dst[3] as f64 / 255.0;
    let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);
    if out_alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |i: usize| {
        let d = dst[i] as f64 / 255.0;
        let c = (src[i] * src_alpha + d * dst_alpha * (1.0 - src_alpha)) / out_alpha;
        (c * 255.0).round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(0),
        channel(1),
        channel(2),
        (out_alpha * 255.0).round() as u8,
    ])
}

impl RenderEngine for SnapshotEngine {
    fn snapshot(&self) -> EngineResult<Document> {
        Ok(self.document.clone())
    }

    fn canvas_size(&self) -> Size {
        let content_height = self
            .document
            .elements()
            .filter_map(|node| self.document.rect(node))
            .map(|rect| rect.bottom())
            .fold(0.0, f64::max);
        Size::new(self.viewport.width, self.viewport.height.max(content_height))
    }

    fn bounding_box(&self, node: NodeId) -> EngineResult<Option<Rect>> {
        let element = self
            .document
            .element(node)
            .ok_or_else(|| EngineError::UnknownNode(format!("{:?}", node)))?;
        let rect = element.rect;
        Ok((rect.width > 0.0 && rect.height > 0.0).then_some(rect))
    }

    fn set_inline(
        &mut self,
        node: NodeId,
        property: InlineProperty,
        value: Option<String>,
    ) -> EngineResult<Option<String>> {
        let element = self
            .document
            .element_mut(node)
            .ok_or_else(|| EngineError::UnknownNode(format!("{:?}", node)))?;
        Ok(element.inline.set(property, value))
    }

    fn capture_element(&mut self, node: NodeId) -> EngineResult<RasterImage> {
        let rect = self.bounding_box(node)?.ok_or_else(|| {
            EngineError::EmptyCapture(format!("element {:?} has no layout box", node))
        })?;
        self.rasterize(rect)
    }

    fn capture_clip(&mut self, clip: Rect) -> EngineResult<RasterImage> {
        self.rasterize(clip)
    }
}
