use serde::{Deserialize, Serialize};

/// One detected object: label and confidence.
///
/// This is the only shape that crosses the process boundary. Boxes stay
/// internal to post-processing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Detection {
    pub class: String,
    pub confidence: f32,
}

impl Detection {
    pub fn new(class: impl Into<String>, confidence: f32) -> Self {
        Self {
            class: class.into(),
            confidence,
        }
    }

    /// True when this detection has the given label and strictly exceeds
    /// `min_confidence`.
    pub fn is_class_above(&self, class: &str, min_confidence: f32) -> bool {
        self.class == class && self.confidence > min_confidence
    }
}

/// A detection before suppression, in model input coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub class_id: usize,
    pub score: f32,
    pub bbox: BoundingBox,
}

/// Axis-aligned box as corners (x1, y1) to (x2, y2).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    /// Build from YOLO center format.
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
        }
    }

    pub fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    pub fn intersection_area(&self, other: &BoundingBox) -> f32 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        if x2 > x1 && y2 > y1 {
            (x2 - x1) * (y2 - y1)
        } else {
            0.0
        }
    }

    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let intersection = self.intersection_area(other);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }
}
