// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Loader and pipeline event hooks
//!
//! The detection core never configures logging itself. Hosts hand an
//! observer to [`ModelLoader`](super::ModelLoader) and
//! [`DetectionPipeline`](super::DetectionPipeline); the binaries use
//! [`TracingObserver`].

use std::path::Path;
use tracing::{debug, error, info};

use super::errors::PipelineError;
use super::types::{ClassNames, DetectionResult};

/// Receives detection lifecycle events. Every method defaults to a no-op.
pub trait DetectionObserver: Send + Sync {
    fn model_loaded(&self, _path: &Path, _class_names: &ClassNames, _device: &str) {}

    /// `source` is `"bytes"` or the file path that was decoded
    fn image_decoded(&self, _source: &str, _width: u32, _height: u32) {}

    fn inference_started(&self) {}

    fn detection_completed(&self, _result: &DetectionResult) {}

    fn detection_failed(&self, _error: &PipelineError, _elapsed_ms: u64) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl DetectionObserver for NoopObserver {}

/// Observer writing `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl DetectionObserver for TracingObserver {
    fn model_loaded(&self, path: &Path, class_names: &ClassNames, device: &str) {
        info!("✅ Model loaded from {} on {}", path.display(), device);
        info!(
            "   {} classes: {:?}",
            class_names.len(),
            class_names.values().collect::<Vec<_>>()
        );
    }

    fn image_decoded(&self, source: &str, width: u32, height: u32) {
        debug!("Decoded image from {}: {}x{}", source, width, height);
    }

    fn inference_started(&self) {
        debug!("Running detection");
    }

    fn detection_completed(&self, result: &DetectionResult) {
        info!(
            "Detection complete: {} parts, is_car={}, {}ms",
            result.total_detections(),
            result.is_car(),
            result.processing_time_ms()
        );
    }

    fn detection_failed(&self, err: &PipelineError, elapsed_ms: u64) {
        error!("Detection failed ({}) after {}ms: {}", err.kind(), elapsed_ms, err);
    }
}
