#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::labels::Labels;
use crate::detect::postprocess::{decode_predictions, non_max_suppression};
use crate::detect::preprocess::letterbox;
use crate::detect::result::Detection;
use crate::frame::RgbFrame;

/// Tract-based backend for YOLOv8 ONNX exports.
///
/// This backend loads a local model file and performs inference on RGB frames.
/// It does not perform any network I/O or write to disk.
pub struct TractBackend {
    model: TypedRunnableModel<TypedModel>,
    input_size: u32,
    labels: Labels,
    confidence_threshold: f32,
    iou_threshold: f32,
    max_detections: usize,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for a square input of
    /// `input_size` pixels.
    pub fn new<P: AsRef<Path>>(model_path: P, input_size: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let side = input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, side, side)),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;
        log::debug!(
            "loaded model {} with input {}x{}",
            model_path.display(),
            input_size,
            input_size
        );

        Ok(Self {
            model,
            input_size,
            labels: Labels::coco(),
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            max_detections: 300,
        })
    }

    /// Replace the built-in COCO label set.
    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    /// Override the default confidence and IoU thresholds.
    pub fn with_thresholds(mut self, confidence: f32, iou: f32) -> Self {
        self.confidence_threshold = confidence;
        self.iou_threshold = iou;
        self
    }

    pub fn with_max_detections(mut self, max_detections: usize) -> Self {
        self.max_detections = max_detections;
        self
    }
}

/// Letterbox `frame` into a `(1, 3, size, size)` f32 tensor.
fn input_tensor(frame: &RgbFrame, input_size: u32) -> Result<Tensor> {
    let data = letterbox(frame, input_size)?;
    let side = input_size as usize;
    let array = tract_ndarray::Array4::from_shape_vec((1, 3, side, side), data)
        .context("letterboxed input does not match model shape")?;
    Ok(array.into_tensor())
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&mut self, frame: &RgbFrame) -> Result<Vec<Detection>> {
        let input = input_tensor(frame, self.input_size)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let data = output
            .as_slice::<f32>()
            .context("model output tensor was not f32")?;

        let candidates = decode_predictions(data, output.shape(), self.confidence_threshold)?;
        let kept = non_max_suppression(candidates, self.iou_threshold, self.max_detections);
        log::debug!("{} detections after suppression", kept.len());

        Ok(kept
            .into_iter()
            .map(|cand| Detection::new(self.labels.name(cand.class_id), cand.score))
            .collect())
    }
}
