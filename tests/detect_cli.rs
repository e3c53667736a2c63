//! End-to-end tests of the `yolo_detect` binary: output shape, exit codes
//! and the single-line error contract.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const ENV_KEYS: [&str; 6] = [
    "YOLO_DETECT_CONFIG",
    "YOLO_DETECT_BACKEND",
    "YOLO_DETECT_MODEL",
    "YOLO_DETECT_LABELS",
    "YOLO_DETECT_CONFIDENCE",
    "YOLO_DETECT_IOU",
];

fn bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_yolo_detect"));
    for key in ENV_KEYS {
        cmd.env_remove(key);
    }
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write_image(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let img = image::RgbImage::from_fn(32, 24, |x, y| image::Rgb([x as u8 * 8, y as u8 * 8, 64]));
    img.save(&path).expect("write fixture image");
    path
}

fn write_stub_config(dir: &Path) -> PathBuf {
    let path = dir.join("detect.json");
    let json = r#"{
        "backend": "stub",
        "stub": {
            "detections": [
                { "class": "person", "confidence": 0.93 },
                { "class": "car", "confidence": 0.81 }
            ]
        }
    }"#;
    std::fs::write(&path, json).expect("write config");
    path
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn prints_json_array_of_class_and_confidence() {
    let dir = TempDir::new().unwrap();
    let image = write_image(dir.path(), "frame.png");
    let config = write_stub_config(dir.path());

    let output = bin()
        .env("YOLO_DETECT_CONFIG", &config)
        .arg(&image)
        .output()
        .expect("run yolo_detect");

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr_of(&output));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    let items = value.as_array().expect("json array");
    assert_eq!(items.len(), 2);
    for item in items {
        let obj = item.as_object().expect("object");
        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, ["class", "confidence"]);
        assert!(obj["class"].is_string());
        assert!(obj["confidence"].is_number());
    }
    assert_eq!(items[0]["class"], "person");
}

#[test]
fn same_image_twice_gives_same_detections() {
    let dir = TempDir::new().unwrap();
    let image = write_image(dir.path(), "frame.png");
    let config = write_stub_config(dir.path());

    let run = || {
        bin()
            .arg("--config")
            .arg(&config)
            .arg(&image)
            .output()
            .expect("run yolo_detect")
    };
    let first = run();
    let second = run();
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn empty_config_env_is_ignored() {
    let dir = TempDir::new().unwrap();
    let image = write_image(dir.path(), "frame.png");

    let output = bin()
        .env("YOLO_DETECT_CONFIG", "")
        .env("YOLO_DETECT_BACKEND", "stub")
        .arg(&image)
        .output()
        .expect("run yolo_detect");

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr_of(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "[]");
}

#[test]
fn no_arguments_exits_2_with_error_prefix() {
    let output = bin().output().expect("run yolo_detect");

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    let stderr = stderr_of(&output);
    assert!(stderr.starts_with("Error: "), "stderr: {}", stderr);
    assert!(stderr.trim().len() > "Error:".len());
    assert_eq!(stderr.trim_end().lines().count(), 1);
}

#[test]
fn nonexistent_path_exits_2_with_not_found() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.jpg");

    let output = bin().arg(&missing).output().expect("run yolo_detect");

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    let stderr = stderr_of(&output);
    assert!(stderr.starts_with("Error: "), "stderr: {}", stderr);
    assert!(stderr.contains("No such file"), "stderr: {}", stderr);
}

#[test]
fn text_file_renamed_to_jpg_exits_2() {
    let dir = TempDir::new().unwrap();
    let fake = dir.path().join("notes.jpg");
    std::fs::write(&fake, "this is not a jpeg\n").unwrap();
    let config = write_stub_config(dir.path());

    let output = bin()
        .env("YOLO_DETECT_CONFIG", &config)
        .arg(&fake)
        .output()
        .expect("run yolo_detect");

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    let stderr = stderr_of(&output);
    assert!(stderr.starts_with("Error: "), "stderr: {}", stderr);
    assert!(stderr.contains("failed to decode image"), "stderr: {}", stderr);
}

#[test]
fn missing_model_exits_2() {
    let dir = TempDir::new().unwrap();
    let image = write_image(dir.path(), "frame.png");

    let output = bin()
        .arg("--model")
        .arg(dir.path().join("absent.onnx"))
        .arg(&image)
        .output()
        .expect("run yolo_detect");

    assert_eq!(output.status.code(), Some(2));
    let stderr = stderr_of(&output);
    assert!(stderr.starts_with("Error: "), "stderr: {}", stderr);
}

#[test]
fn invalid_config_exits_2() {
    let dir = TempDir::new().unwrap();
    let image = write_image(dir.path(), "frame.png");
    let config = dir.path().join("bad.json");
    std::fs::write(&config, r#"{ "backend": "stub", "confidence_threshold": 4.0 }"#).unwrap();

    let output = bin()
        .arg("--config")
        .arg(&config)
        .arg(&image)
        .output()
        .expect("run yolo_detect");

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr_of(&output).contains("confidence threshold"));
}

#[test]
fn help_exits_0() {
    let output = bin().arg("--help").output().expect("run yolo_detect");
    assert_eq!(output.status.code(), Some(0));
}
