// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Car parts detection
//!
//! This module provides:
//! - `ModelLoader` / `ModelHandle`: one-shot model loading at startup
//! - `DetectionPipeline`: decode, infer, confidence filtering and timing
//! - `OnnxDetector`: YOLOv8 inference through ONNX Runtime
//! - `DetectionObserver`: injected event hooks for logging

pub mod class_names;
pub mod detector;
pub mod errors;
pub mod loader;
pub mod observer;
pub mod onnx;
pub mod pipeline;
pub mod postprocess;
pub mod types;

pub use detector::ObjectDetector;
pub use errors::{PipelineError, StartupError};
pub use loader::{ModelHandle, ModelLoader, DEFAULT_MODEL_FILE, MODEL_TYPE};
pub use observer::{DetectionObserver, NoopObserver, TracingObserver};
pub use onnx::OnnxDetector;
pub use pipeline::{filter_detections, DetectionPipeline, ImageInput, UploadedPart};
pub use postprocess::DecodeParams;
pub use types::{
    ClassId, ClassNames, DetectionRecord, DetectionResult, RawDetection, CONFIDENCE_THRESHOLD,
};
