//! Detection model loading and inference.
//!
//! The model is loaded once at startup via [`load`] and shared read-only for
//! the rest of the session as a [`ModelHandle`]. Backends:
//! - `StubModel` (`stub://` refs): intensity-scan detector for tests/demo
//! - `TractModel` (feature: model-tract): SSD-MobileNet ONNX via tract
//!
//! Load failure is terminal for the session: the caller records the error
//! string and the detection loop never starts.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use crate::frame::Frame;

mod backend;
mod backends;
pub mod labels;
mod result;

pub use backend::ModelBackend;
pub use backends::StubModel;
#[cfg(feature = "model-tract")]
pub use backends::TractModel;
pub use result::{BoundingBox, Detection};

/// Base architecture choice, mirroring the upstream detector's load options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BaseNetwork {
    MobilenetV1,
    #[default]
    MobilenetV2,
    LiteMobilenetV2,
}

impl FromStr for BaseNetwork {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mobilenet_v1" => Ok(Self::MobilenetV1),
            "mobilenet_v2" => Ok(Self::MobilenetV2),
            "lite_mobilenet_v2" => Ok(Self::LiteMobilenetV2),
            other => Err(anyhow!("unknown base network '{}'", other)),
        }
    }
}

impl fmt::Display for BaseNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MobilenetV1 => "mobilenet_v1",
            Self::MobilenetV2 => "mobilenet_v2",
            Self::LiteMobilenetV2 => "lite_mobilenet_v2",
        };
        f.write_str(s)
    }
}

/// Model configuration.
#[derive(Clone, Debug)]
pub struct ModelConfig {
    /// Base architecture to load.
    pub base: BaseNetwork,
    /// Model reference: "stub://object" or a path to an ONNX export.
    pub model_ref: String,
    /// Detections below this score are discarded by the backend.
    pub score_threshold: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base: BaseNetwork::default(),
            model_ref: "stub://object".to_string(),
            score_threshold: 0.5,
        }
    }
}

/// Shared handle to a loaded model.
///
/// Created once by [`load`] and cloned freely; inference calls are
/// serialized through an internal mutex because `ModelBackend::detect`
/// takes `&mut self`.
#[derive(Clone)]
pub struct ModelHandle {
    backend: Arc<Mutex<dyn ModelBackend>>,
    name: &'static str,
}

impl ModelHandle {
    /// Wrap an already-constructed backend. Used by [`load`] and by tests
    /// that substitute their own backend.
    pub fn from_backend<B: ModelBackend + 'static>(mut backend: B) -> Result<Self> {
        backend.warm_up()?;
        let name = backend.name();
        Ok(Self {
            backend: Arc::new(Mutex::new(backend)),
            name,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run inference on a frame.
    pub fn detect(&self, frame: &Frame) -> Result<Vec<Detection>> {
        let mut guard = self
            .backend
            .lock()
            .map_err(|_| anyhow!("model backend lock poisoned"))?;
        guard.detect(frame)
    }
}

/// Load the configured detection model.
pub fn load(config: &ModelConfig) -> Result<ModelHandle> {
    if !(0.0..=1.0).contains(&config.score_threshold) {
        return Err(anyhow!(
            "score threshold {} out of bounds",
            config.score_threshold
        ));
    }

    if config.model_ref.starts_with("stub://") {
        let backend = StubModel::new().with_threshold(config.score_threshold);
        return ModelHandle::from_backend(backend);
    }

    #[cfg(feature = "model-tract")]
    {
        let backend = TractModel::new(&config.model_ref, config.base)?
            .with_threshold(config.score_threshold);
        ModelHandle::from_backend(backend)
    }
    #[cfg(not(feature = "model-tract"))]
    {
        Err(anyhow!(
            "model ref '{}' requires the model-tract feature",
            config.model_ref
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_ref_loads_stub_backend() {
        let handle = load(&ModelConfig::default()).unwrap();
        assert_eq!(handle.name(), "stub");
    }

    #[test]
    fn out_of_bounds_threshold_is_rejected() {
        let config = ModelConfig {
            score_threshold: 1.5,
            ..ModelConfig::default()
        };
        assert!(load(&config).is_err());
    }

    #[cfg(not(feature = "model-tract"))]
    #[test]
    fn onnx_ref_without_feature_fails_to_load() {
        let config = ModelConfig {
            model_ref: "ssd_mobilenet.onnx".to_string(),
            ..ModelConfig::default()
        };
        assert!(load(&config).is_err());
    }

    #[test]
    fn base_network_parses_upstream_names() {
        assert_eq!(
            "mobilenet_v2".parse::<BaseNetwork>().unwrap(),
            BaseNetwork::MobilenetV2
        );
        assert!("resnet50".parse::<BaseNetwork>().is_err());
    }
}
