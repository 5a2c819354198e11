// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection records and the per-request result

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::errors::PipelineError;

/// Integer index identifying a detectable object category
pub type ClassId = u32;

/// Class index to name mapping, fixed for the lifetime of a model
pub type ClassNames = BTreeMap<ClassId, String>;

/// Detections at or below this confidence are discarded
pub const CONFIDENCE_THRESHOLD: f32 = 0.5;

/// One object reported by the model before thresholding
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    /// `[x1, y1, x2, y2]` in original image pixels
    pub bbox: [f32; 4],
    pub confidence: f32,
    pub class_id: ClassId,
}

/// A detection that passed the confidence filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    /// `[x1, y1, x2, y2]` in original image pixels
    pub bbox: [f32; 4],
    /// Confidence score (0.0-1.0)
    pub confidence: f32,
    pub class_id: ClassId,
    pub class_name: String,
}

/// Outcome of one detection call
///
/// Serialized with a `status` tag of `success` or `error`. Build it through
/// [`DetectionResult::success`] and [`DetectionResult::failure`] so the
/// counts always agree with the detections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DetectionResult {
    Success {
        is_car: bool,
        detections: Vec<DetectionRecord>,
        total_detections: usize,
        processing_time_ms: u64,
    },
    Error {
        error: String,
        processing_time_ms: u64,
    },
}

impl DetectionResult {
    pub fn success(detections: Vec<DetectionRecord>, processing_time_ms: u64) -> Self {
        let total_detections = detections.len();
        DetectionResult::Success {
            is_car: total_detections > 0,
            detections,
            total_detections,
            processing_time_ms,
        }
    }

    pub fn failure(error: &PipelineError, processing_time_ms: u64) -> Self {
        DetectionResult::Error {
            error: error.to_string(),
            processing_time_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DetectionResult::Success { .. })
    }

    /// True iff at least one detection survived the confidence filter
    pub fn is_car(&self) -> bool {
        matches!(self, DetectionResult::Success { is_car: true, .. })
    }

    pub fn detections(&self) -> &[DetectionRecord] {
        match self {
            DetectionResult::Success { detections, .. } => detections,
            DetectionResult::Error { .. } => &[],
        }
    }

    pub fn total_detections(&self) -> usize {
        match self {
            DetectionResult::Success {
                total_detections, ..
            } => *total_detections,
            DetectionResult::Error { .. } => 0,
        }
    }

    pub fn processing_time_ms(&self) -> u64 {
        match self {
            DetectionResult::Success {
                processing_time_ms, ..
            }
            | DetectionResult::Error {
                processing_time_ms, ..
            } => *processing_time_ms,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            DetectionResult::Error { error, .. } => Some(error),
            DetectionResult::Success { .. } => None,
        }
    }
}
