use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::detect::Detection;

pub const CONFIG_ENV: &str = "YOLO_DETECT_CONFIG";

const DEFAULT_MODEL_PATH: &str = "yolov8n.onnx";
const DEFAULT_INPUT_SIZE: u32 = 640;
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
const DEFAULT_IOU_THRESHOLD: f32 = 0.45;
const DEFAULT_MAX_DETECTIONS: usize = 300;

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DetectConfigFile {
    backend: Option<String>,
    model_path: Option<PathBuf>,
    labels_path: Option<PathBuf>,
    input_size: Option<u32>,
    confidence_threshold: Option<f32>,
    iou_threshold: Option<f32>,
    max_detections: Option<usize>,
    stub: Option<StubConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct StubConfigFile {
    detections: Option<Vec<Detection>>,
}

/// Which detector implementation to open.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Tract,
    Stub,
}

impl BackendKind {
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "tract" => Ok(Self::Tract),
            "stub" => Ok(Self::Stub),
            other => Err(anyhow!(
                "unknown backend '{}' (expected 'tract' or 'stub')",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DetectConfig {
    pub backend: BackendKind,
    pub model_path: PathBuf,
    pub labels_path: Option<PathBuf>,
    pub input_size: u32,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
    /// Fixed output of the stub backend.
    pub stub_detections: Vec<Detection>,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Tract,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            labels_path: None,
            input_size: DEFAULT_INPUT_SIZE,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            max_detections: DEFAULT_MAX_DETECTIONS,
            stub_detections: Vec::new(),
        }
    }
}

impl DetectConfig {
    /// Load from the file named by `YOLO_DETECT_CONFIG` (if any), then apply
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var(CONFIG_ENV)
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);
        Self::load_from(config_path.as_deref())
    }

    /// Load from an explicit config file (or defaults), then apply
    /// environment overrides.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let file_cfg = match config_path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: DetectConfigFile) -> Result<Self> {
        let defaults = Self::default();
        let backend = match file.backend.as_deref() {
            Some(name) => BackendKind::parse(name)?,
            None => defaults.backend,
        };
        Ok(Self {
            backend,
            model_path: file.model_path.unwrap_or(defaults.model_path),
            labels_path: file.labels_path,
            input_size: file.input_size.unwrap_or(defaults.input_size),
            confidence_threshold: file
                .confidence_threshold
                .unwrap_or(defaults.confidence_threshold),
            iou_threshold: file.iou_threshold.unwrap_or(defaults.iou_threshold),
            max_detections: file.max_detections.unwrap_or(defaults.max_detections),
            stub_detections: file
                .stub
                .and_then(|stub| stub.detections)
                .unwrap_or_default(),
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(backend) = non_empty_env("YOLO_DETECT_BACKEND") {
            self.backend = BackendKind::parse(&backend)?;
        }
        if let Some(model) = non_empty_env("YOLO_DETECT_MODEL") {
            self.model_path = PathBuf::from(model);
        }
        if let Some(labels) = non_empty_env("YOLO_DETECT_LABELS") {
            self.labels_path = Some(PathBuf::from(labels));
        }
        if let Some(conf) = non_empty_env("YOLO_DETECT_CONFIDENCE") {
            self.confidence_threshold = conf
                .trim()
                .parse()
                .map_err(|_| anyhow!("YOLO_DETECT_CONFIDENCE must be a number"))?;
        }
        if let Some(iou) = non_empty_env("YOLO_DETECT_IOU") {
            self.iou_threshold = iou
                .trim()
                .parse()
                .map_err(|_| anyhow!("YOLO_DETECT_IOU must be a number"))?;
        }
        Ok(())
    }

    /// Check ranges. Call again after applying command-line overrides.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(anyhow!(
                "confidence threshold must be within [0, 1], got {}",
                self.confidence_threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(anyhow!(
                "IoU threshold must be within [0, 1], got {}",
                self.iou_threshold
            ));
        }
        if self.input_size == 0 || self.input_size % 32 != 0 {
            return Err(anyhow!(
                "input size must be a positive multiple of 32, got {}",
                self.input_size
            ));
        }
        if self.max_detections == 0 {
            return Err(anyhow!("max detections must be greater than zero"));
        }
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn read_config_file(path: &Path) -> Result<DetectConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
