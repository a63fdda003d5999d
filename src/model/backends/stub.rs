use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::frame::Frame;
use crate::model::backend::ModelBackend;
use crate::model::result::{BoundingBox, Detection};

/// Pixels at or above this level count as part of the synthetic object.
const INTENSITY_THRESHOLD: u8 = 200;

/// Stub model for tests and the demo binary.
///
/// Locates the bright object a `SyntheticSource` scene contains by scanning
/// pixel intensity and reports it as a single "person" detection. Identical
/// consecutive frames are answered from a one-entry cache, keyed by pixel
/// hash, the way a real backend skips redundant work.
pub struct StubModel {
    score_threshold: f32,
    last_hash: Option<[u8; 32]>,
    last_detections: Vec<Detection>,
}

impl StubModel {
    pub fn new() -> Self {
        Self {
            score_threshold: 0.5,
            last_hash: None,
            last_detections: Vec::new(),
        }
    }

    /// Override the default score threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = threshold;
        self
    }

    fn scan(&self, frame: &Frame) -> Vec<Detection> {
        let mut min_x = u32::MAX;
        let mut min_y = u32::MAX;
        let mut max_x = 0u32;
        let mut max_y = 0u32;
        let mut bright = 0u64;

        for y in 0..frame.height {
            for x in 0..frame.width {
                let [r, g, b] = frame.pixel(x, y);
                let level = r.max(g).max(b);
                if level >= INTENSITY_THRESHOLD {
                    bright += 1;
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                }
            }
        }

        if bright == 0 {
            return Vec::new();
        }

        let w = (max_x - min_x + 1) as f32;
        let h = (max_y - min_y + 1) as f32;
        // Solid objects fill their bounding box; speckle does not. The fill
        // ratio doubles as the confidence score.
        let coverage = (bright as f32 / (w * h)).clamp(0.0, 1.0);
        let score = 0.5 + coverage / 2.0;
        if score < self.score_threshold {
            return Vec::new();
        }

        vec![Detection::new(
            "person",
            score,
            BoundingBox::new(min_x as f32, min_y as f32, w, h),
        )]
    }
}

impl Default for StubModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelBackend for StubModel {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        let current_hash: [u8; 32] = Sha256::digest(frame.pixels()).into();
        if self.last_hash == Some(current_hash) {
            return Ok(self.last_detections.clone());
        }

        let detections = self.scan(frame);
        self.last_hash = Some(current_hash);
        self.last_detections = detections.clone();
        Ok(detections)
    }
}
