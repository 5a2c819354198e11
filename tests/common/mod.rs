// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared fixtures for integration tests

#![allow(dead_code)]

use anyhow::Result;
use car_parts_detector::detection::{
    ClassNames, DetectionPipeline, ModelHandle, NoopObserver, ObjectDetector, RawDetection,
};
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const BOUNDARY: &str = "X-CAR-PARTS-BOUNDARY";

/// Detector returning a fixed list and counting calls
pub struct FakeDetector {
    detections: Vec<RawDetection>,
    calls: AtomicUsize,
}

impl FakeDetector {
    pub fn new(detections: Vec<RawDetection>) -> Arc<Self> {
        Arc::new(Self {
            detections,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ObjectDetector for FakeDetector {
    fn detect(&self, _image: &DynamicImage) -> Result<Vec<RawDetection>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.detections.clone())
    }
}

/// Detector that always fails
pub struct FailingDetector;

impl ObjectDetector for FailingDetector {
    fn detect(&self, _image: &DynamicImage) -> Result<Vec<RawDetection>> {
        anyhow::bail!("device lost")
    }
}

pub fn raw(bbox: [f32; 4], confidence: f32, class_id: u32) -> RawDetection {
    RawDetection {
        bbox,
        confidence,
        class_id,
    }
}

pub fn class_names() -> ClassNames {
    let mut names = ClassNames::new();
    names.insert(0, "front_bumper".to_string());
    names.insert(1, "hood".to_string());
    names.insert(2, "front_left_door".to_string());
    names
}

pub fn handle(detector: Arc<dyn ObjectDetector>) -> Arc<ModelHandle> {
    Arc::new(ModelHandle::new(
        detector,
        class_names(),
        "models/car_parts_detector.onnx",
        1_048_576,
        "cpu",
    ))
}

pub fn pipeline(detector: Arc<dyn ObjectDetector>) -> Arc<DetectionPipeline> {
    Arc::new(DetectionPipeline::with_observer(
        handle(detector),
        Arc::new(NoopObserver),
    ))
}

/// Pipeline whose decode cap matches a configured upload limit
pub fn pipeline_with_limit(
    detector: Arc<dyn ObjectDetector>,
    max_image_bytes: usize,
) -> Arc<DetectionPipeline> {
    Arc::new(
        DetectionPipeline::with_observer(handle(detector), Arc::new(NoopObserver))
            .with_max_image_bytes(max_image_bytes),
    )
}

/// Uncompressed BMP, so the encoded size tracks the pixel count
pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([90, 90, 90])));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Bmp).unwrap();
    buf.into_inner()
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([90, 90, 90])));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// Single-part `multipart/form-data` body
pub fn multipart_body(field: &str, file_name: Option<&str>, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    match file_name {
        Some(name) => {
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    field, name
                )
                .as_bytes(),
            );
            body.extend_from_slice(b"Content-Type: image/png\r\n");
        }
        None => {
            body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n", field).as_bytes(),
            );
        }
    }
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}
