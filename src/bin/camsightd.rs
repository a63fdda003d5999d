//! camsightd - object detection overlay daemon
//!
//! This daemon:
//! 1. Opens the configured frame source (synthetic or V4L2)
//! 2. Loads the detection model once; a load failure is terminal
//! 3. Runs the interval detection loop (grab, infer, draw)
//! 4. Logs the detection list whenever it changes
//! 5. On Ctrl-C, disables detection, stops the loop, and optionally
//!    writes the last annotated frame as a JPEG snapshot

use anyhow::{Context, Result};
use std::sync::mpsc;
use std::time::Duration;

use camsight::{
    model, source, CamsightConfig, DetectionLoop, FrameSource, Pipeline, SessionState,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = CamsightConfig::load().context("loading configuration")?;
    log::info!(
        "camsightd v{} source={} model={} base={} interval={}ms mirrored={}",
        env!("CARGO_PKG_VERSION"),
        cfg.source.origin,
        cfg.model.model_ref,
        cfg.model.base,
        cfg.interval.as_millis(),
        cfg.overlay.mirrored
    );

    let session = SessionState::new(cfg.overlay.mirrored).shared();

    let mut src = source::open(&cfg.source).context("opening frame source")?;
    src.connect().context("connecting frame source")?;
    log::info!("source '{}' connected", src.name());

    let model = match model::load(&cfg.model) {
        Ok(model) => model,
        Err(e) => {
            // Terminal: record the error on the session and exit without
            // ever starting the detection loop.
            if let Ok(mut guard) = session.lock() {
                guard.record_error(e.to_string());
            }
            log::error!("model load failed: {}", e);
            return Err(e.context("loading detection model"));
        }
    };
    log::info!("model '{}' loaded and warmed up", model.name());

    if let Ok(mut guard) = session.lock() {
        guard.enable();
    }

    let pipeline = Pipeline::new(src, model, session.clone());
    let detection_loop = DetectionLoop::start(pipeline, cfg.interval);
    log::info!("detection loop running at {}ms", cfg.interval.as_millis());

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .expect("error setting Ctrl-C handler");

    // Watch the session for detection list changes until shutdown.
    let mut last_list: Vec<String> = Vec::new();
    loop {
        match rx.recv_timeout(cfg.interval.max(Duration::from_millis(100))) {
            Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => {}
        }
        let list = match session.lock() {
            Ok(guard) => guard.detection_list(),
            Err(_) => break,
        };
        if list != last_list {
            if list.is_empty() {
                log::info!("detections: none");
            } else {
                log::info!("detections: {}", list.join(", "));
            }
            last_list = list;
        }
    }

    log::info!("shutdown signal received, stopping detection loop...");
    if let Ok(mut guard) = session.lock() {
        guard.disable();
    }
    let (pipeline, stats) = detection_loop.stop()?;

    if let Some(dir) = &cfg.overlay.snapshot_dir {
        if stats.rendered > 0 {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating snapshot dir {}", dir.display()))?;
            let path = dir.join("last_frame.jpg");
            pipeline.surface().save_jpeg(&path)?;
            log::info!("last annotated frame written to {}", path.display());
        }
    }

    let src_stats = pipeline.source().stats();
    log::info!(
        "stopped. cycles={} rendered={} not_ready={} inference_failures={} \
         poll_errors={} ticks_dropped={} frames_captured={} source_healthy={}",
        stats.cycles,
        stats.rendered,
        stats.frames_not_ready,
        stats.inference_failures,
        stats.poll_errors,
        stats.ticks_dropped,
        src_stats.frames_captured,
        pipeline.source().is_healthy()
    );

    Ok(())
}
