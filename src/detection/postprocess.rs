// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLOv8 output decoding and non-maximum suppression

use anyhow::{Context, Result};
use ndarray::{ArrayViewD, Ix3};

use super::types::{ClassId, RawDetection};
use crate::vision::Letterbox;

/// Thresholds applied while turning the raw head output into detections.
///
/// Defaults follow Ultralytics `predict`: `conf=0.25`, `iou=0.7`, `max_det=300`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodeParams {
    pub score_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            score_threshold: 0.25,
            iou_threshold: 0.7,
            max_detections: 300,
        }
    }
}

/// Decode a YOLOv8 detection head into detections in original image space.
///
/// Accepts `[1, 4 + nc, N]` (the default export) or the transposed
/// `[1, N, 4 + nc]`. Boxes are `(cx, cy, w, h)` in model input pixels.
/// The result is sorted by confidence, highest first.
pub fn decode_yolov8_output(
    output: ArrayViewD<f32>,
    geometry: &Letterbox,
    params: &DecodeParams,
) -> Result<Vec<RawDetection>> {
    let shape = output.shape().to_vec();
    let output = output
        .into_dimensionality::<Ix3>()
        .with_context(|| format!("Unexpected detector output shape: {:?}", shape))?;

    if shape[0] != 1 {
        anyhow::bail!("Expected batch size 1, got output shape {:?}", shape);
    }

    let channels_first = shape[1] < shape[2];
    let (num_attrs, num_anchors) = if channels_first {
        (shape[1], shape[2])
    } else {
        (shape[2], shape[1])
    };

    if num_attrs <= 4 {
        anyhow::bail!("Detector output has no class scores: {:?}", shape);
    }

    let at = |attr: usize, anchor: usize| {
        if channels_first {
            output[[0, attr, anchor]]
        } else {
            output[[0, anchor, attr]]
        }
    };

    let mut candidates = Vec::new();
    for anchor in 0..num_anchors {
        let (class_idx, score) = (4..num_attrs)
            .map(|attr| (attr - 4, at(attr, anchor)))
            .fold((0, f32::NEG_INFINITY), |best, (idx, score)| {
                if score > best.1 {
                    (idx, score)
                } else {
                    best
                }
            });

        if !score.is_finite() || score < params.score_threshold {
            continue;
        }

        let (cx, cy, w, h) = (
            at(0, anchor),
            at(1, anchor),
            at(2, anchor),
            at(3, anchor),
        );

        candidates.push(RawDetection {
            bbox: [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
            confidence: score,
            class_id: class_idx as ClassId,
        });
    }

    let mut kept = non_maximum_suppression(candidates, params.iou_threshold);
    kept.truncate(params.max_detections);

    Ok(kept
        .into_iter()
        .map(|det| RawDetection {
            bbox: geometry.to_original(det.bbox),
            ..det
        })
        .collect())
}

/// Intersection over union of two `[x1, y1, x2, y2]` boxes.
pub fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let inter_x1 = a[0].max(b[0]);
    let inter_y1 = a[1].max(b[1]);
    let inter_x2 = a[2].min(b[2]);
    let inter_y2 = a[3].min(b[3]);

    let inter_area = (inter_x2 - inter_x1).max(0.0) * (inter_y2 - inter_y1).max(0.0);
    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union_area = area_a + area_b - inter_area;

    if union_area <= 0.0 {
        0.0
    } else {
        inter_area / union_area
    }
}

/// Greedy per-class NMS. Returns survivors sorted by confidence, highest first.
pub fn non_maximum_suppression(
    mut candidates: Vec<RawDetection>,
    iou_threshold: f32,
) -> Vec<RawDetection> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<RawDetection> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let suppressed = kept.iter().any(|k| {
            k.class_id == candidate.class_id && iou(&k.bbox, &candidate.bbox) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}
