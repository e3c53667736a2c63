//! One-shot YOLO object detection.
//!
//! This crate backs the `yolo_detect` CLI: it decodes one image, runs a
//! pretrained YOLOv8 ONNX model on it through `tract-onnx`, and reports the
//! detected objects as `[{"class": ..., "confidence": ...}]`.
//!
//! # Layout
//!
//! - [`frame`]: image decoding into [`RgbFrame`].
//! - [`detect`]: backend trait, tract and stub backends, letterbox
//!   pre-processing, head decoding and NMS, label sets.
//! - [`config`]: defaults, JSON config file, environment overrides.
//! - [`pipeline`]: the linear image-to-detections path the CLI runs.
//! - [`client`]: spawning the CLI from another process and parsing its output.

pub mod client;
pub mod config;
pub mod detect;
pub mod frame;
pub mod pipeline;

pub use client::{person_detected, DetectionRunner};
pub use config::{BackendKind, DetectConfig};
pub use detect::{open_backend, Detection, DetectorBackend, Labels, StubBackend};
pub use frame::{load_image, write_gray_jpeg, RgbFrame};
pub use pipeline::{detect_frame, detect_image, render_json};

/// Exit code for every invocation failure.
pub const EXIT_FAILURE: u8 = 2;
