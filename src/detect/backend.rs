use anyhow::Result;

use crate::detect::result::Detection;
use crate::frame::RgbFrame;

/// Detector backend trait.
///
/// A backend owns whatever model state it needs and turns one decoded
/// frame into a list of labelled detections. Implementations must not
/// retain the frame past the `detect` call and must not write anything
/// to stdout, which carries the JSON result.
pub trait DetectorBackend {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on a frame.
    fn detect(&mut self, frame: &RgbFrame) -> Result<Vec<Detection>>;

    /// Optional warm-up hook, run once before the first `detect`.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
