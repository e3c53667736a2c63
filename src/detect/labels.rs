use std::path::Path;

use anyhow::{anyhow, Context, Result};

/// COCO class names, in the index order used by the stock YOLOv8 heads.
pub const COCO_LABELS: [&str; 80] = [
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "airplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "couch",
    "potted plant",
    "bed",
    "dining table",
    "toilet",
    "tv",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];

/// Ordered class labels for a model head.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Labels {
    names: Vec<String>,
}

impl Labels {
    pub fn coco() -> Self {
        Self {
            names: COCO_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Parse a label list, one name per line. Blank lines are skipped.
    pub fn parse(text: &str) -> Result<Self> {
        let names: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        if names.is_empty() {
            return Err(anyhow!("label list is empty"));
        }
        Ok(Self { names })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read labels file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid labels file {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name for a class index. Indices the list does not cover get a
    /// synthetic `class_<n>` name.
    pub fn name(&self, class_id: usize) -> String {
        self.names
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{}", class_id))
    }
}

impl Default for Labels {
    fn default() -> Self {
        Self::coco()
    }
}
