//! YOLOv8 head decoding and non-maximum suppression.
//!
//! The stock YOLOv8 detection head emits one tensor of shape
//! `(1, 4 + C, N)`: for each of `N` anchors, a center-format box followed
//! by `C` class scores (already sigmoid-activated, no objectness column).
//! Some exports transpose it to `(1, N, 4 + C)`; both layouts are accepted.

use std::cmp::Ordering;

use anyhow::{anyhow, Result};

use crate::detect::result::{BoundingBox, Candidate};

/// Memory layout of the raw head output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Layout {
    /// `(1, 4 + C, N)`
    ChannelMajor,
    /// `(1, N, 4 + C)`
    RowMajor,
}

/// Turn a raw head output into scored candidates above `confidence_threshold`.
///
/// The class count comes from the output shape: the feature axis is the
/// shorter of the two, since a head has far more anchors than classes.
/// Naming the classes is left to the caller.
pub fn decode_predictions(
    data: &[f32],
    shape: &[usize],
    confidence_threshold: f32,
) -> Result<Vec<Candidate>> {
    let (layout, features, anchors) = match shape {
        [1, a, b] if a <= b => (Layout::ChannelMajor, *a, *b),
        [1, a, b] => (Layout::RowMajor, *b, *a),
        _ => return Err(anyhow!("unexpected model output shape {:?}", shape)),
    };
    if features <= 4 {
        return Err(anyhow!(
            "model output shape {:?} has no class scores",
            shape
        ));
    }
    let num_classes = features - 4;
    if data.len() != features * anchors {
        return Err(anyhow!(
            "model output has {} values, shape {:?} implies {}",
            data.len(),
            shape,
            features * anchors
        ));
    }

    let at = |anchor: usize, feature: usize| match layout {
        Layout::ChannelMajor => data[feature * anchors + anchor],
        Layout::RowMajor => data[anchor * features + feature],
    };

    let mut candidates = Vec::new();
    for anchor in 0..anchors {
        let mut best_class = 0;
        let mut best_score = f32::NEG_INFINITY;
        for class_id in 0..num_classes {
            let score = at(anchor, 4 + class_id);
            if score > best_score {
                best_score = score;
                best_class = class_id;
            }
        }
        if !best_score.is_finite() || best_score < confidence_threshold {
            continue;
        }
        candidates.push(Candidate {
            class_id: best_class,
            score: best_score.min(1.0),
            bbox: BoundingBox::from_center(
                at(anchor, 0),
                at(anchor, 1),
                at(anchor, 2),
                at(anchor, 3),
            ),
        });
    }
    Ok(candidates)
}

/// Class-aware greedy NMS. Output is sorted by descending score, ties by
/// class index, and truncated to `max_detections`.
pub fn non_max_suppression(
    mut candidates: Vec<Candidate>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.class_id.cmp(&b.class_id))
    });

    let mut kept: Vec<Candidate> = Vec::new();
    for cand in candidates {
        if kept.len() >= max_detections {
            break;
        }
        let suppressed = kept
            .iter()
            .any(|k| k.class_id == cand.class_id && k.bbox.iou(&cand.bbox) > iou_threshold);
        if !suppressed {
            kept.push(cand);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::labels::Labels;

    const ANCHORS: usize = 8;

    /// Channel-major head with `classes` classes. Each row is
    /// `[cx, cy, w, h, scores...]`; anchors not listed score zero.
    fn channel_major(classes: usize, rows: &[&[f32]]) -> Vec<f32> {
        let features = 4 + classes;
        let mut data = vec![0.0; features * ANCHORS];
        for (anchor, row) in rows.iter().enumerate() {
            for (feature, value) in row.iter().enumerate() {
                data[feature * ANCHORS + anchor] = *value;
            }
        }
        data
    }

    fn two_class_head() -> Vec<f32> {
        channel_major(
            2,
            &[
                &[10.0, 10.0, 8.0, 8.0, 0.9, 0.05],
                &[12.0, 10.0, 8.0, 8.0, 0.8, 0.1],
                &[50.0, 50.0, 4.0, 4.0, 0.1, 0.3],
            ],
        )
    }

    #[test]
    fn decodes_channel_major_head() {
        let cands = decode_predictions(&two_class_head(), &[1, 6, ANCHORS], 0.25).unwrap();
        assert_eq!(cands.len(), 3);
        assert_eq!(cands[0].class_id, 0);
        assert_eq!(cands[0].score, 0.9);
        assert_eq!(cands[0].bbox.x1, 6.0);
        assert_eq!(cands[2].class_id, 1);
        assert_eq!(cands[2].score, 0.3);
    }

    #[test]
    fn decodes_row_major_head() {
        let data = two_class_head();
        let mut transposed = vec![0.0; data.len()];
        for f in 0..6 {
            for a in 0..ANCHORS {
                transposed[a * 6 + f] = data[f * ANCHORS + a];
            }
        }
        let a = decode_predictions(&data, &[1, 6, ANCHORS], 0.0).unwrap();
        let b = decode_predictions(&transposed, &[1, ANCHORS, 6], 0.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn threshold_filters_candidates() {
        let cands = decode_predictions(&two_class_head(), &[1, 6, ANCHORS], 0.5).unwrap();
        assert_eq!(cands.len(), 2);
        assert!(cands.iter().all(|c| c.score >= 0.5));
    }

    #[test]
    fn head_wider_than_label_list_gets_synthetic_names() {
        let data = channel_major(3, &[&[10.0, 10.0, 8.0, 8.0, 0.1, 0.2, 0.7]]);
        let cands = decode_predictions(&data, &[1, 7, ANCHORS], 0.25).unwrap();
        assert_eq!(cands.len(), 1);
        assert_eq!(cands[0].class_id, 2);

        let labels = Labels::parse("person\nbicycle\n").unwrap();
        assert_eq!(labels.name(cands[0].class_id), "class_2");
    }

    #[test]
    fn rejects_unexpected_shape() {
        let data = two_class_head();
        assert!(decode_predictions(&data, &[6, ANCHORS], 0.25).is_err());
        assert!(decode_predictions(&data, &[1, 7, ANCHORS], 0.25).is_err());
        assert!(decode_predictions(&[0.0; 16], &[1, 4, 4], 0.25).is_err());
    }

    #[test]
    fn nms_suppresses_overlapping_same_class() {
        let cands = decode_predictions(&two_class_head(), &[1, 6, ANCHORS], 0.25).unwrap();
        let kept = non_max_suppression(cands, 0.45, 300);
        // anchors 0 and 1 overlap heavily; the weaker one is dropped
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].score, 0.9);
        assert_eq!(kept[1].class_id, 1);
    }

    #[test]
    fn nms_keeps_overlapping_different_classes() {
        let bbox = BoundingBox::from_center(5.0, 5.0, 4.0, 4.0);
        let cands = vec![
            Candidate {
                class_id: 1,
                score: 0.7,
                bbox,
            },
            Candidate {
                class_id: 0,
                score: 0.7,
                bbox,
            },
        ];
        let kept = non_max_suppression(cands, 0.45, 300);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].class_id, 0);
    }

    #[test]
    fn nms_respects_max_detections() {
        let cands = (0..10)
            .map(|i| Candidate {
                class_id: 0,
                score: 0.5 + i as f32 * 0.01,
                bbox: BoundingBox::from_center(i as f32 * 100.0, 0.0, 10.0, 10.0),
            })
            .collect();
        let kept = non_max_suppression(cands, 0.45, 3);
        assert_eq!(kept.len(), 3);
        assert!(kept[0].score > kept[1].score);
    }
}
