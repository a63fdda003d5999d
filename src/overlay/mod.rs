//! Detection overlay rendering.
//!
//! Translates detections from source-frame coordinates into surface
//! coordinates, compensating for a mirrored preview, and paints
//! semi-transparent rounded boxes plus labels. The surface must already match
//! the source frame's native pixel dimensions or boxes will not line up; the
//! pipeline resizes the surface before calling in here.

mod glyphs;
mod surface;

pub use surface::{DrawOp, DrawSurface, RasterSurface, RecordingSurface, Rgb};

use crate::model::Detection;

/// Box fill opacity.
pub const FILL_ALPHA: f32 = 0.4;
/// Rounded corner radius in pixels.
pub const CORNER_RADIUS: f32 = 8.0;
/// Label whose boxes get the priority fill.
pub const PRIORITY_LABEL: &str = "person";
/// Fill for the priority label (#FFFF00).
pub const PRIORITY_FILL: Rgb = [0xFF, 0xFF, 0x00];
/// Fill for every other label (#00B612).
pub const DEFAULT_FILL: Rgb = [0x00, 0xB6, 0x12];
/// Label text color.
pub const LABEL_COLOR: Rgb = [0x00, 0x00, 0x00];

const LABEL_INSET_X: f32 = 10.0;
const LABEL_BASELINE_Y: f32 = 20.0;

/// Fill color for a detection label.
pub fn fill_for_label(label: &str) -> Rgb {
    if label == PRIORITY_LABEL {
        PRIORITY_FILL
    } else {
        DEFAULT_FILL
    }
}

/// Paint one cycle's detections onto the surface.
///
/// The surface is cleared first, so an empty slice leaves a clean surface
/// with no boxes from the previous cycle. When `mirrored` is set, a box at
/// (x, y, w, h) is drawn at x' = W - x with width -w, visually occupying
/// [W - x - w, W - x]; the label anchor mirrors the same way. Zero-area
/// boxes degenerate harmlessly.
pub fn draw_detections(mirrored: bool, detections: &[Detection], surface: &mut dyn DrawSurface) {
    surface.clear();
    let surface_w = surface.width() as f32;

    for det in detections {
        let bbox = det.bbox;
        let color = fill_for_label(&det.label);

        let (rect_x, rect_w, text_x) = if mirrored {
            (
                surface_w - bbox.x,
                -bbox.w,
                surface_w - bbox.x - bbox.w + LABEL_INSET_X,
            )
        } else {
            (bbox.x, bbox.w, bbox.x + LABEL_INSET_X)
        };

        surface.fill_round_rect(rect_x, bbox.y, rect_w, bbox.h, CORNER_RADIUS, color, FILL_ALPHA);
        surface.draw_text(&det.label, text_x, bbox.y + LABEL_BASELINE_Y, LABEL_COLOR);
    }
}
