//! Detection session state.
//!
//! Owned state for one camera session: whether detection is running, whether
//! the preview is mirrored, the detections from the most recent cycle, and
//! the model-load error if there is one. The state is shared between the
//! loop thread and control handlers as `Arc<Mutex<SessionState>>`; every
//! mutation happens inside one short lock.

use std::sync::{Arc, Mutex};

use crate::model::Detection;

/// Shared handle to session state.
pub type SharedSession = Arc<Mutex<SessionState>>;

/// State for one detection session.
///
/// Transitions: Idle -> Detecting on `enable` (clears prior detections),
/// Detecting -> Idle on `disable` (clears the list so stale results are not
/// shown while idle). A recorded model-load error blocks enabling until it
/// is cleared.
#[derive(Debug, Default)]
pub struct SessionState {
    detecting: bool,
    mirrored: bool,
    last_detections: Vec<Detection>,
    last_error: Option<String>,
}

impl SessionState {
    pub fn new(mirrored: bool) -> Self {
        Self {
            mirrored,
            ..Self::default()
        }
    }

    /// Wrap in the shared handle the pipeline and control handlers use.
    pub fn shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    /// Start detecting. Returns false (and stays idle) while a model-load
    /// error is recorded.
    pub fn enable(&mut self) -> bool {
        if self.last_error.is_some() {
            return false;
        }
        self.detecting = true;
        self.last_detections.clear();
        true
    }

    /// Stop detecting and drop the current detection list.
    pub fn disable(&mut self) {
        self.detecting = false;
        self.last_detections.clear();
    }

    pub fn is_detecting(&self) -> bool {
        self.detecting
    }

    pub fn mirrored(&self) -> bool {
        self.mirrored
    }

    pub fn set_mirrored(&mut self, mirrored: bool) {
        self.mirrored = mirrored;
    }

    pub fn toggle_mirrored(&mut self) {
        self.mirrored = !self.mirrored;
    }

    /// Record one cycle's detections. Ignored while idle so a completion
    /// arriving after disable cannot resurrect stale results.
    pub fn record_detections(&mut self, detections: Vec<Detection>) {
        if self.detecting {
            self.last_detections = detections;
        }
    }

    pub fn detections(&self) -> &[Detection] {
        &self.last_detections
    }

    /// Record the user-visible error string (e.g., model-load failure).
    pub fn record_error(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
    }

    pub fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Render the textual detection list, one `"label (NN%)"` line per
    /// detection, in sequence order.
    pub fn detection_list(&self) -> Vec<String> {
        self.last_detections
            .iter()
            .map(|det| format!("{} ({}%)", det.label, (det.score * 100.0).round() as u32))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoundingBox;

    fn person() -> Detection {
        Detection::new("person", 0.92, BoundingBox::new(100.0, 50.0, 80.0, 40.0))
    }

    #[test]
    fn disable_clears_the_detection_list() {
        let mut session = SessionState::new(false);
        assert!(session.enable());
        session.record_detections(vec![person()]);
        assert_eq!(session.detections().len(), 1);

        session.disable();
        assert!(!session.is_detecting());
        assert!(session.detections().is_empty());
    }

    #[test]
    fn reenable_starts_from_an_empty_list() {
        let mut session = SessionState::new(false);
        session.enable();
        session.record_detections(vec![person()]);
        session.disable();

        assert!(session.enable());
        assert!(session.detections().is_empty());
    }

    #[test]
    fn recorded_error_blocks_enabling() {
        let mut session = SessionState::new(false);
        session.record_error("failed to load the object detection model");

        assert!(!session.enable());
        assert!(!session.is_detecting());
        assert_eq!(
            session.error(),
            Some("failed to load the object detection model")
        );

        session.clear_error();
        assert!(session.enable());
    }

    #[test]
    fn mirror_flag_can_be_set_and_toggled() {
        let mut session = SessionState::new(true);
        assert!(session.mirrored());

        session.toggle_mirrored();
        assert!(!session.mirrored());
        session.toggle_mirrored();
        assert!(session.mirrored());

        session.set_mirrored(false);
        assert!(!session.mirrored());
        // The flag is independent of the detecting state.
        session.enable();
        session.disable();
        assert!(!session.mirrored());
    }

    #[test]
    fn detections_recorded_while_idle_are_dropped() {
        let mut session = SessionState::new(false);
        session.record_detections(vec![person()]);
        assert!(session.detections().is_empty());
    }

    #[test]
    fn detection_list_formats_percentages() {
        let mut session = SessionState::new(false);
        session.enable();
        session.record_detections(vec![
            person(),
            Detection::new("cup", 0.505, BoundingBox::new(0.0, 0.0, 5.0, 5.0)),
        ]);
        assert_eq!(session.detection_list(), vec!["person (92%)", "cup (51%)"]);
    }
}
