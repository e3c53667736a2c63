use anyhow::{anyhow, Result};
use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::frame::RgbFrame;

/// Padding value used by the YOLO letterbox.
const PAD_VALUE: u8 = 114;

/// Scale `frame` into a square `size` canvas, preserving aspect ratio, and
/// center it on a gray background.
///
/// Returns planar CHW floats in `[0, 1]`, ready for a `(1, 3, size, size)`
/// input tensor.
pub fn letterbox(frame: &RgbFrame, size: u32) -> Result<Vec<f32>> {
    if size == 0 {
        return Err(anyhow!("model input size must be positive"));
    }

    let scale = f32::min(
        size as f32 / frame.width as f32,
        size as f32 / frame.height as f32,
    );
    let new_w = ((frame.width as f32 * scale).round() as u32).clamp(1, size);
    let new_h = ((frame.height as f32 * scale).round() as u32).clamp(1, size);
    let pad_x = (size - new_w) / 2;
    let pad_y = (size - new_h) / 2;

    let source = RgbImage::from_raw(frame.width, frame.height, frame.pixels().to_vec())
        .ok_or_else(|| anyhow!("frame buffer does not match its dimensions"))?;
    let resized = if (new_w, new_h) == (frame.width, frame.height) {
        source
    } else {
        imageops::resize(&source, new_w, new_h, FilterType::Triangle)
    };

    let side = size as usize;
    let plane = side * side;
    let mut data = vec![PAD_VALUE as f32 / 255.0; plane * 3];
    for (x, y, pixel) in resized.enumerate_pixels() {
        let offset = (y + pad_y) as usize * side + (x + pad_x) as usize;
        for channel in 0..3 {
            data[channel * plane + offset] = pixel[channel] as f32 / 255.0;
        }
    }

    Ok(data)
}
