use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::ModelConfig;

const DEFAULT_SOURCE_ORIGIN: &str = "stub://scene";
const DEFAULT_SOURCE_FPS: u32 = 10;
const DEFAULT_SOURCE_WIDTH: u32 = 640;
const DEFAULT_SOURCE_HEIGHT: u32 = 480;
const DEFAULT_MODEL_REF: &str = "stub://object";
const DEFAULT_SCORE_THRESHOLD: f32 = 0.5;
const DEFAULT_INTERVAL_MS: u64 = 500;
const DEFAULT_MIRRORED: bool = true;

/// Largest accepted frame edge. Keeps pixel-buffer sizes comfortably inside
/// u32 arithmetic everywhere downstream.
const MAX_DIMENSION: u32 = 8192;

#[derive(Debug, Deserialize, Default)]
struct CamsightConfigFile {
    interval_ms: Option<u64>,
    source: Option<SourceConfigFile>,
    model: Option<ModelConfigFile>,
    overlay: Option<OverlayConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    origin: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct ModelConfigFile {
    base: Option<String>,
    model_ref: Option<String>,
    score_threshold: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct OverlayConfigFile {
    mirrored: Option<bool>,
    snapshot_dir: Option<PathBuf>,
}

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct CamsightConfig {
    pub interval: Duration,
    pub source: SourceSettings,
    pub model: ModelConfig,
    pub overlay: OverlaySettings,
}

#[derive(Debug, Clone)]
pub struct SourceSettings {
    /// "stub://…" for a synthetic scene, otherwise a V4L2 device path.
    pub origin: String,
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct OverlaySettings {
    pub mirrored: bool,
    /// When set, the daemon writes annotated JPEG snapshots here.
    pub snapshot_dir: Option<PathBuf>,
}

impl CamsightConfig {
    /// Load configuration: JSON file named by `CAMSIGHT_CONFIG` (optional),
    /// then env overrides, then validation.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("CAMSIGHT_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: CamsightConfigFile) -> Result<Self> {
        let interval = Duration::from_millis(file.interval_ms.unwrap_or(DEFAULT_INTERVAL_MS));
        let source = SourceSettings {
            origin: file
                .source
                .as_ref()
                .and_then(|source| source.origin.clone())
                .unwrap_or_else(|| DEFAULT_SOURCE_ORIGIN.to_string()),
            target_fps: file
                .source
                .as_ref()
                .and_then(|source| source.target_fps)
                .unwrap_or(DEFAULT_SOURCE_FPS),
            width: file
                .source
                .as_ref()
                .and_then(|source| source.width)
                .unwrap_or(DEFAULT_SOURCE_WIDTH),
            height: file
                .source
                .as_ref()
                .and_then(|source| source.height)
                .unwrap_or(DEFAULT_SOURCE_HEIGHT),
        };
        let model = ModelConfig {
            base: file
                .model
                .as_ref()
                .and_then(|model| model.base.as_deref())
                .map(str::parse)
                .transpose()?
                .unwrap_or_default(),
            model_ref: file
                .model
                .as_ref()
                .and_then(|model| model.model_ref.clone())
                .unwrap_or_else(|| DEFAULT_MODEL_REF.to_string()),
            score_threshold: file
                .model
                .as_ref()
                .and_then(|model| model.score_threshold)
                .unwrap_or(DEFAULT_SCORE_THRESHOLD),
        };
        let overlay = OverlaySettings {
            mirrored: file
                .overlay
                .as_ref()
                .and_then(|overlay| overlay.mirrored)
                .unwrap_or(DEFAULT_MIRRORED),
            snapshot_dir: file.overlay.and_then(|overlay| overlay.snapshot_dir),
        };
        Ok(Self {
            interval,
            source,
            model,
            overlay,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(origin) = std::env::var("CAMSIGHT_SOURCE") {
            if !origin.trim().is_empty() {
                self.source.origin = origin;
            }
        }
        if let Ok(model_ref) = std::env::var("CAMSIGHT_MODEL") {
            if !model_ref.trim().is_empty() {
                self.model.model_ref = model_ref;
            }
        }
        if let Ok(base) = std::env::var("CAMSIGHT_MODEL_BASE") {
            if !base.trim().is_empty() {
                self.model.base = base.parse()?;
            }
        }
        if let Ok(interval) = std::env::var("CAMSIGHT_INTERVAL_MS") {
            let ms: u64 = interval
                .parse()
                .map_err(|_| anyhow!("CAMSIGHT_INTERVAL_MS must be an integer number of ms"))?;
            self.interval = Duration::from_millis(ms);
        }
        if let Ok(mirrored) = std::env::var("CAMSIGHT_MIRRORED") {
            self.overlay.mirrored = match mirrored.trim() {
                "1" | "true" => true,
                "0" | "false" => false,
                other => return Err(anyhow!("CAMSIGHT_MIRRORED must be a bool, got '{}'", other)),
            };
        }
        if let Ok(threshold) = std::env::var("CAMSIGHT_SCORE_THRESHOLD") {
            self.model.score_threshold = threshold
                .parse()
                .map_err(|_| anyhow!("CAMSIGHT_SCORE_THRESHOLD must be a float"))?;
        }
        if let Ok(dir) = std::env::var("CAMSIGHT_SNAPSHOT_DIR") {
            if !dir.trim().is_empty() {
                self.overlay.snapshot_dir = Some(PathBuf::from(dir));
            }
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(anyhow!("interval must be greater than zero"));
        }
        if self.source.width == 0 || self.source.height == 0 {
            return Err(anyhow!("source dimensions must be non-zero"));
        }
        if self.source.width > MAX_DIMENSION || self.source.height > MAX_DIMENSION {
            return Err(anyhow!(
                "source dimensions {}x{} exceed the {} pixel limit",
                self.source.width,
                self.source.height,
                MAX_DIMENSION
            ));
        }
        if !(0.0..=1.0).contains(&self.model.score_threshold) {
            return Err(anyhow!(
                "score threshold {} out of bounds",
                self.model.score_threshold
            ));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<CamsightConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BaseNetwork;

    #[test]
    fn defaults_are_sane() {
        let cfg = CamsightConfig::from_file(CamsightConfigFile::default()).unwrap();
        assert_eq!(cfg.interval, Duration::from_millis(500));
        assert_eq!(cfg.source.origin, "stub://scene");
        assert_eq!(cfg.source.width, 640);
        assert_eq!(cfg.source.height, 480);
        assert_eq!(cfg.model.model_ref, "stub://object");
        assert_eq!(cfg.model.base, BaseNetwork::MobilenetV2);
        assert!(cfg.overlay.mirrored);
        assert!(cfg.overlay.snapshot_dir.is_none());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut cfg = CamsightConfig::from_file(CamsightConfigFile::default()).unwrap();
        cfg.interval = Duration::ZERO;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn oversized_dimensions_are_rejected() {
        let mut cfg = CamsightConfig::from_file(CamsightConfigFile::default()).unwrap();
        cfg.source.width = 1 << 20;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unknown_base_network_is_rejected() {
        let file = CamsightConfigFile {
            model: Some(ModelConfigFile {
                base: Some("resnet50".to_string()),
                ..ModelConfigFile::default()
            }),
            ..CamsightConfigFile::default()
        };
        assert!(CamsightConfig::from_file(file).is_err());
    }
}
