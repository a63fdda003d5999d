//! Frame sources.
//!
//! This module provides the sources a session can pull video frames from:
//! - Synthetic scenes (`stub://` origins, tests and the demo binary)
//! - Local V4L2 devices (feature: source-v4l2)
//!
//! Sources produce `Frame` instances on demand. A source that has no frame
//! ready yet returns `Ok(None)`; the detection loop treats that as a per-poll
//! no-op, not an error.

use anyhow::Result;

use crate::config::SourceSettings;
use crate::frame::Frame;

mod synthetic;
#[cfg(feature = "source-v4l2")]
pub mod v4l2;

pub use synthetic::{SyntheticConfig, SyntheticSource};
#[cfg(feature = "source-v4l2")]
pub use v4l2::{V4l2Config, V4l2Source};

/// A live video source.
///
/// `try_frame` is pull-based: each call captures (or synthesizes) the current
/// frame. Implementations must not block longer than roughly one frame
/// interval.
pub trait FrameSource: Send {
    /// Source identifier for logs.
    fn name(&self) -> &'static str;

    /// Open the underlying device or stream.
    fn connect(&mut self) -> Result<()>;

    /// Capture the current frame, or `None` while the source is warming up.
    fn try_frame(&mut self) -> Result<Option<Frame>>;

    /// Returns false once the source has stalled or errored.
    fn is_healthy(&self) -> bool;

    /// Capture statistics.
    fn stats(&self) -> SourceStats;
}

/// Statistics for a frame source.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub origin: String,
}

/// Open a source for the configured origin.
///
/// `stub://` origins get a synthetic scene; anything else is treated as a
/// V4L2 device path when the `source-v4l2` feature is enabled.
pub fn open(settings: &SourceSettings) -> Result<Box<dyn FrameSource>> {
    if settings.origin.starts_with("stub://") {
        return Ok(Box::new(SyntheticSource::new(SyntheticConfig {
            origin: settings.origin.clone(),
            width: settings.width,
            height: settings.height,
            warmup_frames: 0,
        })));
    }

    #[cfg(feature = "source-v4l2")]
    {
        Ok(Box::new(V4l2Source::new(V4l2Config {
            device: settings.origin.clone(),
            target_fps: settings.target_fps,
            width: settings.width,
            height: settings.height,
        })?))
    }
    #[cfg(not(feature = "source-v4l2"))]
    {
        anyhow::bail!(
            "source origin '{}' requires the source-v4l2 feature",
            settings.origin
        )
    }
}
