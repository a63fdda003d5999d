//! Drawing surfaces.
//!
//! `DrawSurface` is the seam between the renderer and whatever actually owns
//! pixels: the renderer only needs a cleared surface, filled rounded
//! rectangles, and label text. `RasterSurface` is the shipped implementation,
//! compositing over the current video frame and exporting JPEG snapshots.
//! `RecordingSurface` records draw calls for assertions.

use anyhow::{Context, Result};
use image::{Pixel, Rgba, RgbaImage};
use std::path::Path;

use crate::frame::Frame;
use crate::overlay::glyphs;

/// RGB color.
pub type Rgb = [u8; 3];

/// A 2D pixel-addressable drawing surface.
///
/// Coordinates are f32 because detections arrive as float boxes; negative
/// widths/heights describe rectangles extending leftward/upward (the
/// mirrored draw path relies on this, matching canvas `rect` semantics).
pub trait DrawSurface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Reset the whole surface so nothing from the previous cycle lingers.
    fn clear(&mut self);

    /// Fill a rounded rectangle, blending with the given alpha.
    fn fill_round_rect(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32, color: Rgb, alpha: f32);

    /// Draw left-anchored label text at full opacity.
    fn draw_text(&mut self, text: &str, x: f32, y: f32, color: Rgb);
}

// ----------------------------------------------------------------------------
// RasterSurface: RGBA raster with frame background and JPEG export
// ----------------------------------------------------------------------------

/// Raster surface compositing overlays onto the current video frame.
///
/// `set_background` stores the frame; `clear` repaints it, which is how each
/// cycle fully overdraws the previous one.
pub struct RasterSurface {
    image: RgbaImage,
    background: Option<RgbaImage>,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])),
            background: None,
        }
    }

    /// Resize the surface to match new frame dimensions. Drops the stored
    /// background; callers set a fresh one right after.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.image.width() != width || self.image.height() != height {
            self.image = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
            self.background = None;
        }
    }

    /// Use the given frame as the background restored by `clear`.
    ///
    /// The surface must already match the frame's dimensions.
    pub fn set_background(&mut self, frame: &Frame) -> Result<()> {
        if frame.width != self.image.width() || frame.height != self.image.height() {
            anyhow::bail!(
                "surface is {}x{} but frame is {}x{}",
                self.image.width(),
                self.image.height(),
                frame.width,
                frame.height
            );
        }
        let mut bg = RgbaImage::from_pixel(frame.width, frame.height, Rgba([0, 0, 0, 255]));
        for (x, y, px) in bg.enumerate_pixels_mut() {
            let [r, g, b] = frame.pixel(x, y);
            *px = Rgba([r, g, b, 255]);
        }
        self.background = Some(bg);
        Ok(())
    }

    /// Pixel access for tests and encoders.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    /// Encode the surface as JPEG.
    pub fn to_jpeg(&self) -> Result<Vec<u8>> {
        let (w, h) = self.image.dimensions();
        let mut rgb = Vec::with_capacity((w * h * 3) as usize);
        for px in self.image.pixels() {
            rgb.extend_from_slice(&px.0[..3]);
        }
        let mut out = Vec::new();
        image::codecs::jpeg::JpegEncoder::new(&mut out)
            .encode(&rgb, w, h, image::ExtendedColorType::Rgb8)
            .context("encode overlay snapshot as JPEG")?;
        Ok(out)
    }

    /// Write a JPEG snapshot to disk.
    pub fn save_jpeg<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_jpeg()?;
        std::fs::write(path, bytes)
            .with_context(|| format!("write snapshot to {}", path.display()))?;
        Ok(())
    }

    fn blend_pixel(&mut self, x: i64, y: i64, color: Rgb, alpha: f32) {
        if x < 0 || y < 0 || x >= self.image.width() as i64 || y >= self.image.height() as i64 {
            return;
        }
        let overlay = Rgba([color[0], color[1], color[2], (alpha * 255.0).round() as u8]);
        self.image.get_pixel_mut(x as u32, y as u32).blend(&overlay);
    }
}

impl DrawSurface for RasterSurface {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn clear(&mut self) {
        match &self.background {
            Some(bg) => self.image.copy_from_slice(bg.as_raw()),
            None => {
                for px in self.image.pixels_mut() {
                    *px = Rgba([0, 0, 0, 255]);
                }
            }
        }
    }

    fn fill_round_rect(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32, color: Rgb, alpha: f32) {
        // Normalize negative extents: (x, -w) spans [x - w_abs, x].
        let (left, width) = if w < 0.0 { (x + w, -w) } else { (x, w) };
        let (top, height) = if h < 0.0 { (y + h, -h) } else { (y, h) };
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let radius = radius.min(width / 2.0).min(height / 2.0).max(0.0);

        let x0 = left.floor() as i64;
        let y0 = top.floor() as i64;
        let x1 = (left + width).ceil() as i64;
        let y1 = (top + height).ceil() as i64;

        for py in y0..y1 {
            for px in x0..x1 {
                let fx = px as f32 + 0.5;
                let fy = py as f32 + 0.5;

                // Corner rounding: inside the rect but outside the corner
                // circles is skipped.
                let cx = fx.clamp(left + radius, left + width - radius);
                let cy = fy.clamp(top + radius, top + height - radius);
                let dx = fx - cx;
                let dy = fy - cy;
                if dx * dx + dy * dy > radius * radius {
                    continue;
                }

                self.blend_pixel(px, py, color, alpha);
            }
        }
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, color: Rgb) {
        // `y` is the text baseline, matching canvas fillText.
        let scale = glyphs::SCALE as i64;
        let top = y.round() as i64 - glyphs::GLYPH_HEIGHT as i64 * scale;
        let mut pen_x = x.round() as i64;

        for ch in text.chars() {
            let glyph = glyphs::glyph_for(ch);
            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..glyphs::GLYPH_WIDTH {
                    if bits & (0x10 >> col) == 0 {
                        continue;
                    }
                    for sy in 0..scale {
                        for sx in 0..scale {
                            self.blend_pixel(
                                pen_x + col as i64 * scale + sx,
                                top + row as i64 * scale + sy,
                                color,
                                1.0,
                            );
                        }
                    }
                }
            }
            pen_x += (glyphs::GLYPH_WIDTH as i64 + 1) * scale;
        }
    }
}

// ----------------------------------------------------------------------------
// RecordingSurface: draw-call recorder for assertions
// ----------------------------------------------------------------------------

/// A draw call captured by `RecordingSurface`.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Clear,
    RoundRect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        radius: f32,
        color: Rgb,
        alpha: f32,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
        color: Rgb,
    },
}

/// Surface double that records draw calls instead of writing pixels.
pub struct RecordingSurface {
    width: u32,
    height: u32,
    pub ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    /// Recorded rectangle fills, in draw order.
    pub fn rects(&self) -> Vec<&DrawOp> {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::RoundRect { .. }))
            .collect()
    }
}

impl DrawSurface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self) {
        self.ops.push(DrawOp::Clear);
    }

    fn fill_round_rect(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32, color: Rgb, alpha: f32) {
        self.ops.push(DrawOp::RoundRect {
            x,
            y,
            w,
            h,
            radius,
            color,
            alpha,
        });
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, color: Rgb) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            x,
            y,
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_matches_frame_dimensions() {
        let mut surface = RasterSurface::new(320, 240);
        surface.resize(640, 480);
        assert_eq!(surface.width(), 640);
        assert_eq!(surface.height(), 480);
    }

    #[test]
    fn clear_restores_background_frame() {
        let frame = Frame::new(vec![100u8; 4 * 4 * 3], 4, 4).unwrap();
        let mut surface = RasterSurface::new(4, 4);
        surface.set_background(&frame).unwrap();

        surface.fill_round_rect(0.0, 0.0, 4.0, 4.0, 0.0, [255, 0, 0], 1.0);
        assert_eq!(surface.pixel(1, 1), [255, 0, 0, 255]);

        surface.clear();
        assert_eq!(surface.pixel(1, 1), [100, 100, 100, 255]);
    }

    #[test]
    fn alpha_fill_blends_with_background() {
        let frame = Frame::new(vec![0u8; 8 * 8 * 3], 8, 8).unwrap();
        let mut surface = RasterSurface::new(8, 8);
        surface.set_background(&frame).unwrap();
        surface.clear();

        surface.fill_round_rect(0.0, 0.0, 8.0, 8.0, 0.0, [255, 255, 0], 0.4);
        let [r, g, b, _] = surface.pixel(4, 4);
        // 40% yellow over black.
        assert!((100..=104).contains(&r), "r = {}", r);
        assert!((100..=104).contains(&g), "g = {}", g);
        assert_eq!(b, 0);
    }

    #[test]
    fn negative_width_spans_leftward() {
        let mut surface = RasterSurface::new(16, 16);
        surface.clear();
        // (10, -4) spans [6, 10).
        surface.fill_round_rect(10.0, 2.0, -4.0, 4.0, 0.0, [255, 255, 255], 1.0);
        assert_eq!(surface.pixel(7, 3), [255, 255, 255, 255]);
        assert_eq!(surface.pixel(11, 3), [0, 0, 0, 255]);
        assert_eq!(surface.pixel(5, 3), [0, 0, 0, 255]);
    }

    #[test]
    fn zero_area_rect_draws_nothing() {
        let mut surface = RasterSurface::new(8, 8);
        surface.clear();
        surface.fill_round_rect(2.0, 2.0, 0.0, 0.0, 8.0, [255, 255, 255], 1.0);
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(surface.pixel(x, y), [0, 0, 0, 255]);
            }
        }
    }

    #[test]
    fn rounded_corners_stay_unpainted() {
        let mut surface = RasterSurface::new(32, 32);
        surface.clear();
        surface.fill_round_rect(0.0, 0.0, 32.0, 32.0, 8.0, [255, 255, 255], 1.0);
        // Extreme corner is outside the corner circle; center is inside.
        assert_eq!(surface.pixel(0, 0), [0, 0, 0, 255]);
        assert_eq!(surface.pixel(16, 16), [255, 255, 255, 255]);
    }

    #[test]
    fn text_paints_pixels_left_of_advance() {
        let mut surface = RasterSurface::new(64, 64);
        surface.clear();
        surface.draw_text("a", 4.0, 40.0, [255, 255, 255]);
        let painted = (0..64)
            .flat_map(|y| (0..64).map(move |x| (x, y)))
            .filter(|&(x, y)| surface.pixel(x, y) != [0, 0, 0, 255])
            .count();
        assert!(painted > 0, "glyph should paint pixels");
    }

    #[test]
    fn jpeg_snapshot_encodes() {
        let mut surface = RasterSurface::new(16, 16);
        surface.clear();
        let bytes = surface.to_jpeg().unwrap();
        // JPEG SOI marker.
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
