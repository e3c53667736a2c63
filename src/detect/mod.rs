mod backend;
mod backends;
pub mod labels;
pub mod postprocess;
pub mod preprocess;
mod result;

use anyhow::Result;

use crate::config::{BackendKind, DetectConfig};

pub use backend::DetectorBackend;
pub use backends::StubBackend;
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use labels::Labels;
pub use result::{BoundingBox, Candidate, Detection};

/// Open the backend named by `config`, loading model weights when needed.
pub fn open_backend(config: &DetectConfig) -> Result<Box<dyn DetectorBackend>> {
    match config.backend {
        BackendKind::Stub => Ok(Box::new(StubBackend::new(config.stub_detections.clone()))),
        BackendKind::Tract => open_tract(config),
    }
}

#[cfg(feature = "backend-tract")]
fn open_tract(config: &DetectConfig) -> Result<Box<dyn DetectorBackend>> {
    let labels = match &config.labels_path {
        Some(path) => Labels::from_file(path)?,
        None => Labels::coco(),
    };
    let backend = TractBackend::new(&config.model_path, config.input_size)?
        .with_labels(labels)
        .with_thresholds(config.confidence_threshold, config.iou_threshold)
        .with_max_detections(config.max_detections);
    Ok(Box::new(backend))
}

#[cfg(not(feature = "backend-tract"))]
fn open_tract(_config: &DetectConfig) -> Result<Box<dyn DetectorBackend>> {
    Err(anyhow::anyhow!(
        "tract backend requires the backend-tract feature"
    ))
}
