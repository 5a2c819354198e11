// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Detection pipeline behaviour against a fake detector
//!
//! These tests verify that:
//! - Result counts always agree with the detections
//! - The 0.5 confidence cutoff is strict
//! - Decode and inference failures become error results
//! - A pipeline can be shared across threads

use bytes::Bytes;
use car_parts_detector::detection::{DetectionResult, ImageInput, UploadedPart};
use std::sync::Arc;

use crate::common::{pipeline, png_bytes, raw, FailingDetector, FakeDetector};

fn assert_invariants(result: &DetectionResult) {
    assert_eq!(result.total_detections(), result.detections().len());
    assert_eq!(result.is_car(), result.total_detections() > 0);
    assert!(result.detections().iter().all(|d| d.confidence > 0.5));
}

#[test]
fn test_invariants_hold_for_mixed_confidences() {
    let cases = vec![
        vec![],
        vec![raw([0.0, 0.0, 4.0, 4.0], 0.2, 0)],
        vec![
            raw([0.0, 0.0, 4.0, 4.0], 0.5, 0),
            raw([1.0, 1.0, 5.0, 5.0], 0.500_01, 1),
        ],
        vec![
            raw([0.0, 0.0, 4.0, 4.0], 0.99, 2),
            raw([0.0, 0.0, 4.0, 4.0], 0.75, 1),
            raw([0.0, 0.0, 4.0, 4.0], 0.1, 0),
        ],
    ];

    for detections in cases {
        let result = pipeline(FakeDetector::new(detections))
            .detect(ImageInput::RawBytes(Bytes::from(png_bytes(16, 16))));
        assert!(result.is_success());
        assert_invariants(&result);
    }
}

#[test]
fn test_known_overlap_keeps_only_confident_detection() {
    let detector = FakeDetector::new(vec![
        raw([10.0, 10.0, 60.0, 40.0], 0.9, 0),
        raw([12.0, 11.0, 58.0, 42.0], 0.3, 0),
    ]);
    let result = pipeline(detector.clone())
        .detect(ImageInput::RawBytes(Bytes::from(png_bytes(64, 48))));

    assert_eq!(detector.calls(), 1);
    assert_eq!(result.total_detections(), 1);
    assert!(result.is_car());
    let record = &result.detections()[0];
    assert_eq!(record.confidence, 0.9);
    assert_eq!(record.class_name, "front_bumper");
    assert_eq!(record.bbox, [10.0, 10.0, 60.0, 40.0]);
}

#[test]
fn test_confidence_exactly_half_is_excluded() {
    let result = pipeline(FakeDetector::new(vec![raw([0.0, 0.0, 1.0, 1.0], 0.5, 1)]))
        .detect(ImageInput::RawBytes(Bytes::from(png_bytes(8, 8))));

    assert!(result.is_success());
    assert_eq!(result.total_detections(), 0);
    assert!(!result.is_car());
}

#[test]
fn test_undecodable_bytes_are_error_with_timing() {
    let detector = FakeDetector::new(vec![raw([0.0, 0.0, 1.0, 1.0], 0.9, 0)]);
    let pipeline = pipeline(detector.clone());

    for bytes in [Bytes::new(), Bytes::from_static(b"definitely not an image")] {
        let result = pipeline.detect(ImageInput::RawBytes(bytes));
        assert!(!result.is_success());
        assert!(result.error_message().is_some());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "error");
        assert!(json["processing_time_ms"].as_u64().is_some());
    }

    assert_eq!(detector.calls(), 0);
}

#[test]
fn test_truncated_png_is_error() {
    let mut bytes = png_bytes(32, 32);
    bytes.truncate(bytes.len() / 2);

    let result = pipeline(FakeDetector::new(vec![])).detect(ImageInput::RawBytes(Bytes::from(bytes)));
    assert!(!result.is_success());
    assert!(result
        .error_message()
        .unwrap()
        .starts_with("Failed to decode image"));
}

#[test]
fn test_unsupported_upload_skips_model() {
    let detector = FakeDetector::new(vec![raw([0.0, 0.0, 1.0, 1.0], 0.9, 0)]);
    let result = pipeline(detector.clone()).detect_upload(UploadedPart {
        file_name: None,
        content_type: None,
        data: Bytes::from_static(b"12345"),
    });

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["status"], "error");
    assert_eq!(json["error"], "Unsupported image data type");
    assert_eq!(detector.calls(), 0);
}

#[test]
fn test_file_path_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("car_test.jpg.png");
    std::fs::write(&path, png_bytes(20, 10)).unwrap();

    let result = pipeline(FakeDetector::new(vec![raw([1.0, 1.0, 9.0, 9.0], 0.8, 2)]))
        .detect(ImageInput::FilePath(path));

    assert!(result.is_car());
    assert_eq!(result.detections()[0].class_name, "front_left_door");
}

#[test]
fn test_inference_failure_is_error_result() {
    let result = pipeline(Arc::new(FailingDetector))
        .detect(ImageInput::RawBytes(Bytes::from(png_bytes(8, 8))));

    assert_eq!(result.error_message(), Some("Inference failed: device lost"));
    assert_eq!(result.total_detections(), 0);
}

#[test]
fn test_pipeline_shared_across_threads() {
    let detector = FakeDetector::new(vec![raw([0.0, 0.0, 2.0, 2.0], 0.7, 1)]);
    let pipeline = pipeline(detector.clone());
    let image = Bytes::from(png_bytes(12, 12));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pipeline = pipeline.clone();
            let image = image.clone();
            std::thread::spawn(move || pipeline.detect(ImageInput::RawBytes(image)))
        })
        .collect();

    for handle in handles {
        let result = handle.join().unwrap();
        assert_eq!(result.total_detections(), 1);
    }
    assert_eq!(detector.calls(), 4);
}
