//! demo - end-to-end synthetic detection run

use anyhow::{anyhow, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

use camsight::config::SourceSettings;
use camsight::model::{self, ModelConfig};
use camsight::pipeline::CycleOutcome;
use camsight::{source, FrameSource, Pipeline, SessionState};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Number of detection cycles to run.
    #[arg(long, default_value_t = 10)]
    cycles: u32,
    /// Scene width in pixels.
    #[arg(long, default_value_t = 640)]
    width: u32,
    /// Scene height in pixels.
    #[arg(long, default_value_t = 480)]
    height: u32,
    /// Render the overlay mirrored (selfie view).
    #[arg(long, action = clap::ArgAction::Set, default_value_t = true)]
    mirrored: bool,
    /// Output directory for the annotated frame.
    #[arg(long, default_value = "demo_out")]
    out: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if args.cycles == 0 {
        return Err(anyhow!("cycles must be >= 1"));
    }

    let out_dir = PathBuf::from(&args.out);
    fs::create_dir_all(&out_dir)?;

    stage("open synthetic source");
    let settings = SourceSettings {
        origin: "stub://demo".to_string(),
        target_fps: 10,
        width: args.width,
        height: args.height,
    };
    let mut src = source::open(&settings)?;
    src.connect()?;

    stage("load stub model");
    let model = model::load(&ModelConfig::default())?;

    stage("run detection cycles");
    let session = SessionState::new(args.mirrored).shared();
    if let Ok(mut guard) = session.lock() {
        guard.enable();
    }
    let mut pipeline = Pipeline::new(src, model, session.clone());

    let mut rendered = 0u32;
    let mut detections_total = 0usize;
    for cycle in 0..args.cycles {
        match pipeline.poll()? {
            CycleOutcome::Rendered { detections } => {
                rendered += 1;
                detections_total += detections;
                let list = session
                    .lock()
                    .map_err(|_| anyhow!("session lock poisoned"))?
                    .detection_list();
                eprintln!("demo: cycle {}: {}", cycle, list.join(", "));
            }
            CycleOutcome::FrameNotReady => eprintln!("demo: cycle {}: frame not ready", cycle),
            CycleOutcome::InferenceFailed => eprintln!("demo: cycle {}: inference failed", cycle),
            CycleOutcome::Disabled => eprintln!("demo: cycle {}: detection disabled", cycle),
        }
    }

    stage("write annotated frame");
    let frame_path = out_dir.join("annotated.jpg");
    pipeline.surface().save_jpeg(&frame_path)?;

    let stats = pipeline.source().stats();
    println!("demo summary:");
    println!("  cycles run: {}", args.cycles);
    println!("  frames rendered: {}", rendered);
    println!("  detections drawn: {}", detections_total);
    println!("  frames captured: {}", stats.frames_captured);
    println!("  annotated frame: {}", frame_path.display());
    println!("next steps:");
    println!("  ls -la {}", out_dir.display());

    Ok(())
}

fn stage(msg: &str) {
    eprintln!("demo: {}", msg);
}
