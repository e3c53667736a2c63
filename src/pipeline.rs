//! One-shot detection: image path in, detections out.

use std::path::Path;

use anyhow::{Context, Result};

use crate::config::DetectConfig;
use crate::detect::{open_backend, Detection, DetectorBackend};
use crate::frame::{load_image, RgbFrame};

/// Decode the image at `image_path`, open the configured backend and run it.
///
/// The image is read before the model is loaded, so a bad path is reported
/// as such even when no model is available.
pub fn detect_image<P: AsRef<Path>>(image_path: P, config: &DetectConfig) -> Result<Vec<Detection>> {
    let image_path = image_path.as_ref();
    let frame = load_image(image_path)?;
    log::debug!(
        "decoded {} ({}x{})",
        image_path.display(),
        frame.width,
        frame.height
    );

    let mut backend = open_backend(config)?;
    detect_frame(backend.as_mut(), &frame)
        .with_context(|| format!("detection failed on {}", image_path.display()))
}

/// Warm up `backend`, then run it on one decoded frame.
pub fn detect_frame(backend: &mut dyn DetectorBackend, frame: &RgbFrame) -> Result<Vec<Detection>> {
    backend
        .warm_up()
        .with_context(|| format!("{} backend warm-up failed", backend.name()))?;
    let detections = backend
        .detect(frame)
        .with_context(|| format!("{} backend failed", backend.name()))?;
    log::info!(
        "{} detections from {} backend",
        detections.len(),
        backend.name()
    );
    Ok(detections)
}

/// Serialize detections as a JSON array of `{"class", "confidence"}` objects.
pub fn render_json(detections: &[Detection], pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(detections)?
    } else {
        serde_json::to_string(detections)?
    };
    Ok(json)
}
