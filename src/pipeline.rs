//! The per-cycle detection pipeline and its interval driver.
//!
//! `Pipeline::poll` runs one cycle: grab frame, infer, update session state,
//! draw. `DetectionLoop` drives `poll` at a fixed interval on a background
//! thread with clean cancellation.
//!
//! Known limitation: a cycle that overruns the interval delays the next one
//! (the loop thread is serial, so at most one inference is ever in flight);
//! missed ticks are dropped and counted rather than queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};

use crate::model::ModelHandle;
use crate::overlay::{self, RasterSurface};
use crate::session::SharedSession;
use crate::source::FrameSource;

/// Default poll interval. Trades responsiveness for inference cost.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

/// How far apart the loop thread checks the stop flag while waiting.
const STOP_POLL_SLICE: Duration = Duration::from_millis(25);

/// Outcome of a single poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The session is idle; nothing was captured or drawn.
    Disabled,
    /// The source had no frame ready; skipped until it becomes ready.
    FrameNotReady,
    /// Inference failed; the draw was skipped, polling continues.
    InferenceFailed,
    /// A frame was captured, inferred, and rendered.
    Rendered { detections: usize },
}

/// Counters accumulated by a running loop.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoopStats {
    pub cycles: u64,
    pub rendered: u64,
    pub frames_not_ready: u64,
    pub inference_failures: u64,
    pub poll_errors: u64,
    pub ticks_dropped: u64,
}

/// One camera session's capture -> infer -> draw pipeline.
pub struct Pipeline {
    source: Box<dyn FrameSource>,
    model: ModelHandle,
    session: SharedSession,
    surface: RasterSurface,
}

impl Pipeline {
    pub fn new(source: Box<dyn FrameSource>, model: ModelHandle, session: SharedSession) -> Self {
        Self {
            source,
            model,
            session,
            surface: RasterSurface::new(1, 1),
        }
    }

    /// Run one detection cycle.
    ///
    /// No-ops while the session is disabled or the source has no frame
    /// ready. The enabled flag is re-checked after inference so a disable
    /// issued mid-cycle suppresses the draw and the state update.
    pub fn poll(&mut self) -> Result<CycleOutcome> {
        let enabled = self
            .session
            .lock()
            .map_err(|_| anyhow!("session lock poisoned"))?
            .is_detecting();
        if !enabled {
            return Ok(CycleOutcome::Disabled);
        }

        let Some(frame) = self.source.try_frame()? else {
            return Ok(CycleOutcome::FrameNotReady);
        };

        let detections = match self.model.detect(&frame) {
            Ok(detections) => detections,
            Err(err) => {
                log::warn!("inference failed, skipping draw this cycle: {:#}", err);
                return Ok(CycleOutcome::InferenceFailed);
            }
        };

        let mirrored = {
            let mut session = self
                .session
                .lock()
                .map_err(|_| anyhow!("session lock poisoned"))?;
            if !session.is_detecting() {
                // Disabled while inference was in flight; drop the result.
                return Ok(CycleOutcome::Disabled);
            }
            session.record_detections(detections.clone());
            session.mirrored()
        };

        // The surface must match the frame's native dimensions before any
        // draw call or box alignment is wrong.
        self.surface.resize(frame.width, frame.height);
        self.surface.set_background(&frame)?;
        overlay::draw_detections(mirrored, &detections, &mut self.surface);

        Ok(CycleOutcome::Rendered {
            detections: detections.len(),
        })
    }

    /// The most recently rendered surface.
    pub fn surface(&self) -> &RasterSurface {
        &self.surface
    }

    pub fn session(&self) -> SharedSession {
        Arc::clone(&self.session)
    }

    pub fn source(&self) -> &dyn FrameSource {
        self.source.as_ref()
    }

    pub fn model(&self) -> &ModelHandle {
        &self.model
    }
}

/// Fixed-interval driver for a [`Pipeline`].
///
/// `start` spawns the loop thread; `stop` signals it, joins it, and hands
/// the pipeline back. After `stop` returns, no further polls run.
pub struct DetectionLoop {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<(Pipeline, LoopStats)>,
}

impl DetectionLoop {
    /// Begin polling every `interval`.
    pub fn start(mut pipeline: Pipeline, interval: Duration) -> Self {
        let interval = if interval.is_zero() {
            DEFAULT_INTERVAL
        } else {
            interval
        };
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        let handle = thread::spawn(move || {
            let mut stats = LoopStats::default();
            // The first poll runs immediately; each deadline is one interval
            // after the previous poll started.
            let mut deadline = Instant::now();

            while !thread_stop.load(Ordering::Relaxed) {
                stats.cycles += 1;
                match pipeline.poll() {
                    Ok(CycleOutcome::Rendered { detections }) => {
                        stats.rendered += 1;
                        log::debug!("cycle rendered {} detections", detections);
                    }
                    Ok(CycleOutcome::FrameNotReady) => stats.frames_not_ready += 1,
                    Ok(CycleOutcome::InferenceFailed) => stats.inference_failures += 1,
                    Ok(CycleOutcome::Disabled) => {}
                    Err(err) => {
                        stats.poll_errors += 1;
                        log::warn!("poll error: {:#}", err);
                    }
                }

                deadline += interval;
                let now = Instant::now();
                // An overrunning cycle drops the ticks it missed instead of
                // queueing them.
                while deadline <= now {
                    deadline += interval;
                    stats.ticks_dropped += 1;
                }

                while Instant::now() < deadline {
                    if thread_stop.load(Ordering::Relaxed) {
                        return (pipeline, stats);
                    }
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    thread::sleep(remaining.min(STOP_POLL_SLICE));
                }
            }

            (pipeline, stats)
        });

        Self { stop, handle }
    }

    /// Stop polling. Joins the loop thread; any scheduled-but-unstarted
    /// tick is cancelled.
    pub fn stop(self) -> Result<(Pipeline, LoopStats)> {
        self.stop.store(true, Ordering::Relaxed);
        self.handle
            .join()
            .map_err(|_| anyhow!("detection loop thread panicked"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use crate::model::{self, Detection, ModelBackend, ModelConfig};
    use crate::session::SessionState;
    use crate::source::{SyntheticConfig, SyntheticSource};

    /// Backend whose inference takes longer than the poll interval.
    struct SlowBackend {
        delay: Duration,
    }

    impl ModelBackend for SlowBackend {
        fn name(&self) -> &'static str {
            "slow"
        }

        fn detect(&mut self, _frame: &Frame) -> anyhow::Result<Vec<Detection>> {
            thread::sleep(self.delay);
            Ok(Vec::new())
        }
    }

    fn stub_pipeline(warmup_frames: u32, enabled: bool) -> Pipeline {
        let source = SyntheticSource::new(SyntheticConfig {
            width: 160,
            height: 120,
            warmup_frames,
            ..SyntheticConfig::default()
        });
        let model = model::load(&ModelConfig::default()).unwrap();
        let mut state = SessionState::new(false);
        if enabled {
            state.enable();
        }
        Pipeline::new(Box::new(source), model, state.shared())
    }

    #[test]
    fn disabled_session_polls_are_noops() {
        let mut pipeline = stub_pipeline(0, false);
        assert_eq!(pipeline.poll().unwrap(), CycleOutcome::Disabled);
        assert_eq!(pipeline.source().stats().frames_captured, 0);
    }

    #[test]
    fn frame_not_ready_is_skipped_silently() {
        let mut pipeline = stub_pipeline(1, true);
        assert_eq!(pipeline.poll().unwrap(), CycleOutcome::FrameNotReady);
        assert_eq!(pipeline.poll().unwrap(), CycleOutcome::Rendered { detections: 1 });
    }

    #[test]
    fn rendered_cycle_updates_session_and_surface() {
        let mut pipeline = stub_pipeline(0, true);
        let outcome = pipeline.poll().unwrap();
        assert_eq!(outcome, CycleOutcome::Rendered { detections: 1 });

        let session = pipeline.session();
        let session = session.lock().unwrap();
        assert_eq!(session.detection_list(), vec!["person (100%)"]);

        // Surface resized to the frame's native dimensions.
        use crate::overlay::DrawSurface;
        assert_eq!(pipeline.surface().width(), 160);
        assert_eq!(pipeline.surface().height(), 120);
    }

    #[test]
    fn disable_between_capture_and_draw_drops_the_result() {
        // Disabling after poll() observed enabled=true exercises the
        // completion guard only under a scheduler race; here we verify the
        // state-level contract instead: a disabled session never accepts
        // detections.
        let mut pipeline = stub_pipeline(0, true);
        pipeline.session().lock().unwrap().disable();
        assert_eq!(pipeline.poll().unwrap(), CycleOutcome::Disabled);
        assert!(pipeline.session().lock().unwrap().detections().is_empty());
    }

    #[test]
    fn loop_stops_cleanly_and_reports_stats() {
        let pipeline = stub_pipeline(0, true);
        let detection_loop = DetectionLoop::start(pipeline, Duration::from_millis(10));
        thread::sleep(Duration::from_millis(60));
        let (pipeline, stats) = detection_loop.stop().unwrap();

        assert!(stats.cycles >= 1);
        assert!(stats.rendered >= 1);

        // No further polls after stop.
        let captured = pipeline.source().stats().frames_captured;
        thread::sleep(Duration::from_millis(40));
        assert_eq!(pipeline.source().stats().frames_captured, captured);
    }

    #[test]
    fn polls_are_spaced_one_interval_apart() {
        let pipeline = stub_pipeline(0, true);
        let detection_loop = DetectionLoop::start(pipeline, Duration::from_millis(100));
        thread::sleep(Duration::from_millis(150));
        let (pipeline, stats) = detection_loop.stop().unwrap();

        // First poll at start, second at ~100ms; a doubled first gap would
        // leave only one frame captured by 150ms.
        assert!(pipeline.source().stats().frames_captured >= 2);
        assert_eq!(stats.ticks_dropped, 0);
    }

    #[test]
    fn overrunning_cycles_drop_ticks_instead_of_queueing() {
        let source = SyntheticSource::new(SyntheticConfig {
            width: 160,
            height: 120,
            ..SyntheticConfig::default()
        });
        let model = crate::model::ModelHandle::from_backend(SlowBackend {
            delay: Duration::from_millis(60),
        })
        .unwrap();
        let mut state = SessionState::new(false);
        state.enable();
        let pipeline = Pipeline::new(Box::new(source), model, state.shared());

        let detection_loop = DetectionLoop::start(pipeline, Duration::from_millis(10));
        thread::sleep(Duration::from_millis(150));
        let (_, stats) = detection_loop.stop().unwrap();

        assert!(stats.ticks_dropped >= 1);
        // Roughly 15 intervals elapsed but each cycle takes ~60ms; queued
        // ticks would push the cycle count toward the interval count.
        assert!(stats.cycles <= 6, "cycles queued up: {}", stats.cycles);
    }

    #[test]
    fn zero_interval_falls_back_to_default() {
        let pipeline = stub_pipeline(0, false);
        let detection_loop = DetectionLoop::start(pipeline, Duration::ZERO);
        let (_, stats) = detection_loop.stop().unwrap();
        // With the 500 ms default at most a couple of cycles ran.
        assert!(stats.cycles <= 2);
    }
}
