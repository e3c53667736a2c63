use anyhow::Result;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;
use crate::frame::RgbFrame;

/// Stub backend for testing. Returns the same fixed detections for every frame.
pub struct StubBackend {
    detections: Vec<Detection>,
}

impl StubBackend {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _frame: &RgbFrame) -> Result<Vec<Detection>> {
        Ok(self.detections.clone())
    }
}
