#![cfg(feature = "model-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::frame::Frame;
use crate::model::backend::ModelBackend;
use crate::model::labels::label_for_class;
use crate::model::result::{BoundingBox, Detection};
use crate::model::BaseNetwork;

/// Tract-based backend for SSD-MobileNet ONNX exports.
///
/// Expects a model with a `[1, 3, H, W]` float input (RGB, 0..1) and three
/// outputs: boxes `[1, N, 4]` as normalized `(ymin, xmin, ymax, xmax)`,
/// scores `[1, N]`, and class ids `[1, N]` in the COCO 90-class id space.
/// Frames of any size are resampled to the network input; reported boxes are
/// mapped back to source-frame pixels.
pub struct TractModel {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>,
    input_size: usize,
    score_threshold: f32,
}

impl TractModel {
    /// Load an ONNX export from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, base: BaseNetwork) -> Result<Self> {
        let model_path = model_path.as_ref();
        let input_size = match base {
            BaseNetwork::MobilenetV1 | BaseNetwork::LiteMobilenetV2 => 300,
            BaseNetwork::MobilenetV2 => 320,
        };

        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, input_size, input_size)),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            input_size,
            score_threshold: 0.5,
        })
    }

    /// Override the default score threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = threshold;
        self
    }

    /// Nearest-neighbor resample of the frame into the network input tensor.
    fn build_input(&self, frame: &Frame) -> Tensor {
        let size = self.input_size;
        let mut input = tract_ndarray::Array4::<f32>::zeros((1, 3, size, size));
        for iy in 0..size {
            let sy = ((iy as u64 * frame.height as u64) / size as u64) as u32;
            for ix in 0..size {
                let sx = ((ix as u64 * frame.width as u64) / size as u64) as u32;
                let [r, g, b] = frame.pixel(sx.min(frame.width - 1), sy.min(frame.height - 1));
                input[(0, 0, iy, ix)] = r as f32 / 255.0;
                input[(0, 1, iy, ix)] = g as f32 / 255.0;
                input[(0, 2, iy, ix)] = b as f32 / 255.0;
            }
        }
        input.into()
    }
}

impl ModelBackend for TractModel {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        if frame.width == 0 || frame.height == 0 {
            return Err(anyhow!("cannot run inference on an empty frame"));
        }

        let input = self.build_input(frame);
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        if outputs.len() < 3 {
            return Err(anyhow!(
                "expected 3 model outputs (boxes, scores, classes), got {}",
                outputs.len()
            ));
        }

        let boxes = outputs[0]
            .to_array_view::<f32>()
            .context("boxes output is not f32")?;
        let scores = outputs[1]
            .to_array_view::<f32>()
            .context("scores output is not f32")?;
        let classes = outputs[2]
            .to_array_view::<f32>()
            .context("classes output is not f32")?;

        let count = scores.len();
        if boxes.len() != count * 4 || classes.len() != count {
            return Err(anyhow!(
                "inconsistent output shapes: {} boxes values, {} scores, {} classes",
                boxes.len(),
                count,
                classes.len()
            ));
        }

        let boxes = boxes
            .to_shape((count, 4))
            .context("boxes output is not [N, 4]")?;

        let frame_w = frame.width as f32;
        let frame_h = frame.height as f32;
        let mut detections = Vec::new();
        for i in 0..count {
            let score = scores.as_slice().map(|s| s[i]).unwrap_or(0.0);
            if score < self.score_threshold {
                continue;
            }
            let Some(label) = label_for_class(classes.as_slice().map(|c| c[i]).unwrap_or(0.0) as usize)
            else {
                continue;
            };

            // Normalized (ymin, xmin, ymax, xmax) -> source-frame pixels.
            let ymin = boxes[(i, 0)].clamp(0.0, 1.0) * frame_h;
            let xmin = boxes[(i, 1)].clamp(0.0, 1.0) * frame_w;
            let ymax = boxes[(i, 2)].clamp(0.0, 1.0) * frame_h;
            let xmax = boxes[(i, 3)].clamp(0.0, 1.0) * frame_w;

            detections.push(Detection::new(
                label,
                score,
                BoundingBox::new(xmin, ymin, (xmax - xmin).max(0.0), (ymax - ymin).max(0.0)),
            ));
        }

        Ok(detections)
    }
}
