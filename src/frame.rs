//! Decoded input images.
//!
//! `RgbFrame` is the only pixel container the detectors see. It is built
//! from a file on disk, decoded in-memory, and dropped when the invocation
//! ends. `write_gray_jpeg` is the reverse path used by callers that hand
//! grayscale keyframes to the CLI through a temporary file.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::{GrayImage, ImageFormat};

/// Packed RGB8 image.
#[derive(Clone, Debug)]
pub struct RgbFrame {
    data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RgbFrame {
    /// Wrap packed RGB8 bytes. Fails when the length does not match the
    /// dimensions.
    pub fn from_rgb(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(anyhow!("image has zero size ({}x{})", width, height));
        }
        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("image dimensions overflow"))?;
        if data.len() != expected_len {
            return Err(anyhow!(
                "expected {} RGB bytes, received {}",
                expected_len,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }
}

/// Read and decode an image file. The format is guessed from content, not
/// from the extension.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<RgbFrame> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read image {}", path.display()))?;
    decode_image(&bytes).with_context(|| format!("failed to decode image {}", path.display()))
}

/// Decode an in-memory encoded image to RGB8.
pub fn decode_image(bytes: &[u8]) -> Result<RgbFrame> {
    let image = image::load_from_memory(bytes).context("unsupported or corrupt image data")?;
    let rgb = image.into_rgb8();
    let (width, height) = rgb.dimensions();
    RgbFrame::from_rgb(rgb.into_raw(), width, height)
}

/// Encode a grayscale frame as JPEG at `path`.
pub fn write_gray_jpeg<P: AsRef<Path>>(path: P, frame: &GrayImage) -> Result<()> {
    let path = path.as_ref();
    frame
        .save_with_format(path, ImageFormat::Jpeg)
        .with_context(|| format!("failed to save image to {}", path.display()))
}
