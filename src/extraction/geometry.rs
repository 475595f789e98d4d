//! Slide-relative coordinates and clamped capture windows.

use crate::models::{
    common::{Rect, Size},
    slide::CropInfo,
};

/// Expresses a viewport-absolute box relative to the slide's origin.
pub fn normalize(absolute: &Rect, slide_origin: &Rect) -> Rect {
    absolute.relative_to(slide_origin)
}

/// A capture clip in canvas coordinates and how it was clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureWindow {
    pub clip: Rect,
    pub crop: CropInfo,
}

/// Pads `element_box` on all sides and clamps the result to the canvas.
///
/// The left/top edges never go below the canvas origin and the right/bottom edges never past
/// its far edge. `crop_left`/`crop_top` record how much of the padded window was cut at the
/// origin so the capture can be re-anchored. Returns `None` when the clamped window has no
/// area; the caller then captures the element box directly.
pub fn compute_crop(element_box: &Rect, padding: f64, canvas: Size) -> Option<CaptureWindow> {
    let padded = element_box.inflate(padding);

    let x = padded.x.max(0.0);
    let y = padded.y.max(0.0);
    let crop_left = x - padded.x;
    let crop_top = y - padded.y;

    let width = (canvas.width - x).min(padded.width - crop_left);
    let height = (canvas.height - y).min(padded.height - crop_top);

    if width <= 0.0 || height <= 0.0 {
        return None;
    }

    Some(CaptureWindow {
        clip: Rect::new(x, y, width, height),
        crop: CropInfo {
            crop_left,
            crop_top,
            width,
            height,
            padding,
        },
    })
}

/// Where a capture lands on the slide: the intended padded origin shifted by the clamp
/// deltas, sized to the clamped window. Without crop info the element box is used as is.
pub fn place_capture(element_rect: &Rect, crop: Option<&CropInfo>) -> Rect {
    match crop {
        Some(crop) => Rect::new(
            element_rect.x - crop.padding + crop.crop_left,
            element_rect.y - crop.padding + crop.crop_top,
            crop.width,
            crop.height,
        ),
        None => *element_rect,
    }
}
