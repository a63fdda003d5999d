use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use camsight::config::CamsightConfig;
use camsight::model::BaseNetwork;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "CAMSIGHT_CONFIG",
        "CAMSIGHT_SOURCE",
        "CAMSIGHT_MODEL",
        "CAMSIGHT_MODEL_BASE",
        "CAMSIGHT_INTERVAL_MS",
        "CAMSIGHT_MIRRORED",
        "CAMSIGHT_SCORE_THRESHOLD",
        "CAMSIGHT_SNAPSHOT_DIR",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "interval_ms": 250,
        "source": {
            "origin": "stub://lab",
            "target_fps": 15,
            "width": 800,
            "height": 600
        },
        "model": {
            "base": "lite_mobilenet_v2",
            "model_ref": "stub://lab-model",
            "score_threshold": 0.6
        },
        "overlay": {
            "mirrored": false,
            "snapshot_dir": "/tmp/camsight-snaps"
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("CAMSIGHT_CONFIG", file.path());
    std::env::set_var("CAMSIGHT_SOURCE", "stub://overridden");
    std::env::set_var("CAMSIGHT_INTERVAL_MS", "750");

    let cfg = CamsightConfig::load().expect("load config");

    assert_eq!(cfg.interval, Duration::from_millis(750));
    assert_eq!(cfg.source.origin, "stub://overridden");
    assert_eq!(cfg.source.target_fps, 15);
    assert_eq!(cfg.source.width, 800);
    assert_eq!(cfg.source.height, 600);
    assert_eq!(cfg.model.base, BaseNetwork::LiteMobilenetV2);
    assert_eq!(cfg.model.model_ref, "stub://lab-model");
    assert!((cfg.model.score_threshold - 0.6).abs() < f32::EPSILON);
    assert!(!cfg.overlay.mirrored);
    assert_eq!(
        cfg.overlay.snapshot_dir.as_deref(),
        Some(std::path::Path::new("/tmp/camsight-snaps"))
    );

    clear_env();
}

#[test]
fn defaults_apply_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = CamsightConfig::load().expect("load config");

    assert_eq!(cfg.interval, Duration::from_millis(500));
    assert_eq!(cfg.source.origin, "stub://scene");
    assert_eq!(cfg.source.width, 640);
    assert_eq!(cfg.source.height, 480);
    assert_eq!(cfg.model.base, BaseNetwork::MobilenetV2);
    assert_eq!(cfg.model.model_ref, "stub://object");
    assert!(cfg.overlay.mirrored);
    assert!(cfg.overlay.snapshot_dir.is_none());

    clear_env();
}

#[test]
fn rejects_zero_interval_from_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("CAMSIGHT_INTERVAL_MS", "0");
    assert!(CamsightConfig::load().is_err());

    clear_env();
}

#[test]
fn rejects_malformed_mirrored_value() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("CAMSIGHT_MIRRORED", "sideways");
    assert!(CamsightConfig::load().is_err());

    clear_env();
}
