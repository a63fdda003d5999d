//! Synthetic frame source.
//!
//! Generates deterministic scenes for tests and the demo binary: a dark
//! background with a single bright object drifting across the frame. The stub
//! model locates the object by intensity, which gives the whole pipeline an
//! end-to-end path with no camera or model asset on hand.

use anyhow::Result;
use rand::Rng;

use crate::frame::Frame;
use crate::source::{FrameSource, SourceStats};

/// Background gray level. Kept well below the object so intensity
/// thresholding stays unambiguous even with speckle noise on top.
const BACKGROUND_LEVEL: u8 = 24;
const SPECKLE_RANGE: u8 = 32;
const OBJECT_LEVEL: u8 = 235;

/// Configuration for a synthetic source.
#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    /// Origin label (e.g., "stub://scene"), used in stats/logs only.
    pub origin: String,
    /// Frame width.
    pub width: u32,
    /// Frame height.
    pub height: u32,
    /// Number of initial polls that report no frame ready (camera warm-up).
    pub warmup_frames: u32,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            origin: "stub://scene".to_string(),
            width: 640,
            height: 480,
            warmup_frames: 0,
        }
    }
}

/// Synthetic frame source with a drifting bright object.
pub struct SyntheticSource {
    config: SyntheticConfig,
    frame_count: u64,
    polls: u32,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            config,
            frame_count: 0,
            polls: 0,
        }
    }

    /// Bounding box of the synthetic object in the next produced frame.
    ///
    /// The object is a quarter-width rectangle drifting rightward four pixels
    /// per frame, wrapping at the right edge.
    pub fn object_bbox(&self) -> (u32, u32, u32, u32) {
        let w = (self.config.width / 4).max(1);
        let h = (self.config.height / 4).max(1);
        let span = self.config.width.saturating_sub(w).max(1) as u64;
        let x = ((self.frame_count * 4) % span) as u32;
        let y = self.config.height / 3;
        (x, y, w, h)
    }

    fn render_scene(&self) -> Vec<u8> {
        let (ox, oy, ow, oh) = self.object_bbox();
        let mut rng = rand::thread_rng();
        let mut pixels =
            vec![BACKGROUND_LEVEL; self.config.width as usize * self.config.height as usize * 3];

        // Faint background speckle, capped below the detection threshold.
        for chunk in pixels.chunks_mut(3) {
            let level = BACKGROUND_LEVEL + rng.gen_range(0..SPECKLE_RANGE);
            chunk.fill(level);
        }

        for y in oy..(oy + oh).min(self.config.height) {
            for x in ox..(ox + ow).min(self.config.width) {
                let idx = (y as usize * self.config.width as usize + x as usize) * 3;
                pixels[idx..idx + 3].fill(OBJECT_LEVEL);
            }
        }

        pixels
    }
}

impl FrameSource for SyntheticSource {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn connect(&mut self) -> Result<()> {
        // Synthetic sources are always "connected".
        log::info!("SyntheticSource: connected to {}", self.config.origin);
        Ok(())
    }

    fn try_frame(&mut self) -> Result<Option<Frame>> {
        if self.polls < self.config.warmup_frames {
            self.polls += 1;
            return Ok(None);
        }
        self.polls += 1;

        let pixels = self.render_scene();
        self.frame_count += 1;
        Ok(Some(Frame::new(
            pixels,
            self.config.width,
            self.config.height,
        )?))
    }

    fn is_healthy(&self) -> bool {
        true
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            origin: self.config.origin.clone(),
        }
    }
}
