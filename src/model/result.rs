/// Bounding box in source-frame pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn area(&self) -> f32 {
        self.w * self.h
    }
}

/// One model output: category label, confidence score, bounding box.
///
/// Detections are produced fresh on every inference call and carry no
/// identity across frames; they live for one render cycle and are then
/// replaced.
#[derive(Clone, Debug)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub label: String,
    pub score: f32,
}

impl Detection {
    pub fn new(label: impl Into<String>, score: f32, bbox: BoundingBox) -> Self {
        Self {
            bbox,
            label: label.into(),
            score: score.clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_clamps_score() {
        let det = Detection::new("person", 1.7, BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(det.score, 1.0);
    }

    #[test]
    fn zero_area_box_is_representable() {
        let bbox = BoundingBox::new(5.0, 5.0, 0.0, 0.0);
        assert_eq!(bbox.area(), 0.0);
    }
}
