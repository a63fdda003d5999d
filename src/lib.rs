//! Camsight
//!
//! Live object detection with annotated overlays, built around a polling
//! pipeline: a frame source is sampled on a fixed interval, each grabbed
//! frame runs through a detection model, and the results are drawn as
//! translucent rounded boxes with labels on a raster surface.
//!
//! # Module Structure
//!
//! - `source`: Frame acquisition (synthetic scenes, V4L2 devices)
//! - `model`: Detection backends behind [`model::ModelBackend`]
//! - `overlay`: Box and label rendering, mirrored or direct
//! - `pipeline`: The interval-driven detect/draw loop
//! - `session`: Shared detecting/mirrored/error state
//! - `config`: Daemon configuration (JSON file plus env overrides)

pub mod config;
pub mod frame;
pub mod model;
pub mod overlay;
pub mod pipeline;
pub mod session;
pub mod source;

pub use config::CamsightConfig;
pub use frame::Frame;
pub use model::{BoundingBox, Detection, ModelHandle};
pub use overlay::draw_detections;
pub use pipeline::{CycleOutcome, DetectionLoop, LoopStats, Pipeline};
pub use session::{SessionState, SharedSession};
pub use source::FrameSource;
