use anyhow::Result;

use crate::frame::Frame;
use crate::model::result::Detection;

/// Detection model backend.
///
/// Backends are loaded once at startup and then shared for the lifetime of
/// the session via `ModelHandle`. `detect` takes `&mut self` because some
/// backends keep scratch state between calls; the handle serializes access.
///
/// Both loading and inference are assumed potentially slow and fallible. A
/// backend must never panic on malformed frames; it returns an error and the
/// detection loop skips that cycle.
pub trait ModelBackend: Send {
    /// Backend identifier for logs.
    fn name(&self) -> &'static str;

    /// Run detection on a frame, returning boxes in source-frame pixels.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>>;

    /// Optional warm-up hook, run once after load.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
