// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection pipeline: decode, infer, filter, time
//!
//! Every call produces a [`DetectionResult`]. Failures inside the pipeline
//! become the `error` variant and are never propagated to the caller.

use bytes::Bytes;
use image::DynamicImage;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use super::class_names::class_name;
use super::errors::PipelineError;
use super::loader::ModelHandle;
use super::observer::{DetectionObserver, TracingObserver};
use super::types::{ClassNames, DetectionRecord, DetectionResult, RawDetection, CONFIDENCE_THRESHOLD};
use crate::vision::{decode_image_bytes, decode_image_file, MAX_IMAGE_SIZE};

/// Image handed to the pipeline
#[derive(Debug, Clone)]
pub enum ImageInput {
    /// Encoded image (PNG, JPEG, ...)
    RawBytes(Bytes),
    /// Image file on disk
    FilePath(PathBuf),
}

impl From<Bytes> for ImageInput {
    fn from(bytes: Bytes) -> Self {
        ImageInput::RawBytes(bytes)
    }
}

impl From<Vec<u8>> for ImageInput {
    fn from(bytes: Vec<u8>) -> Self {
        ImageInput::RawBytes(Bytes::from(bytes))
    }
}

impl From<PathBuf> for ImageInput {
    fn from(path: PathBuf) -> Self {
        ImageInput::FilePath(path)
    }
}

/// One field of a multipart upload as received by the HTTP layer
#[derive(Debug, Clone)]
pub struct UploadedPart {
    /// Set for file parts, absent for plain form values
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl TryFrom<UploadedPart> for ImageInput {
    type Error = PipelineError;

    fn try_from(part: UploadedPart) -> Result<Self, Self::Error> {
        match part.file_name {
            Some(_) => Ok(ImageInput::RawBytes(part.data)),
            None => Err(PipelineError::UnsupportedInput),
        }
    }
}

/// Runs detection against a shared model
pub struct DetectionPipeline {
    model: Arc<ModelHandle>,
    observer: Arc<dyn DetectionObserver>,
    /// Largest encoded image accepted for decoding
    max_image_bytes: usize,
}

impl DetectionPipeline {
    /// Pipeline logging through `tracing`
    pub fn new(model: Arc<ModelHandle>) -> Self {
        Self::with_observer(model, Arc::new(TracingObserver))
    }

    pub fn with_observer(model: Arc<ModelHandle>, observer: Arc<dyn DetectionObserver>) -> Self {
        Self {
            model,
            observer,
            max_image_bytes: MAX_IMAGE_SIZE,
        }
    }

    /// Match the decode cap to the upload limit the server accepts
    pub fn with_max_image_bytes(mut self, max_image_bytes: usize) -> Self {
        self.max_image_bytes = max_image_bytes;
        self
    }

    pub fn model(&self) -> &Arc<ModelHandle> {
        &self.model
    }

    pub fn max_image_bytes(&self) -> usize {
        self.max_image_bytes
    }

    /// Detect car parts in one image
    pub fn detect(&self, input: ImageInput) -> DetectionResult {
        let start = Instant::now();
        let outcome = self.try_detect(input);
        self.finish(start, outcome)
    }

    /// Detect car parts in an uploaded form part.
    ///
    /// Parts that carry no file are rejected without running the model.
    pub fn detect_upload(&self, part: UploadedPart) -> DetectionResult {
        let start = Instant::now();
        let outcome = ImageInput::try_from(part).and_then(|input| self.try_detect(input));
        self.finish(start, outcome)
    }

    /// Decode, infer and filter, returning the first failure
    pub fn try_detect(&self, input: ImageInput) -> Result<Vec<DetectionRecord>, PipelineError> {
        let image = self.decode(input)?;

        self.observer.inference_started();
        let raw = self
            .model
            .detector()
            .detect(&image)
            .map_err(|e| PipelineError::Inference(format!("{:#}", e)))?;

        Ok(filter_detections(raw, self.model.class_names()))
    }

    fn decode(&self, input: ImageInput) -> Result<DynamicImage, PipelineError> {
        let (image, info, source) = match input {
            ImageInput::RawBytes(bytes) => {
                let (image, info) = decode_image_bytes(&bytes, self.max_image_bytes)?;
                (image, info, "bytes".to_string())
            }
            ImageInput::FilePath(path) => {
                let (image, info) = decode_image_file(&path, self.max_image_bytes)?;
                (image, info, path.display().to_string())
            }
        };

        self.observer.image_decoded(&source, info.width, info.height);
        Ok(image)
    }

    fn finish(
        &self,
        start: Instant,
        outcome: Result<Vec<DetectionRecord>, PipelineError>,
    ) -> DetectionResult {
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(records) => {
                let result = DetectionResult::success(records, elapsed_ms);
                self.observer.detection_completed(&result);
                result
            }
            Err(err) => {
                self.observer.detection_failed(&err, elapsed_ms);
                DetectionResult::failure(&err, elapsed_ms)
            }
        }
    }
}

/// Keep detections strictly above the confidence threshold, in model order
pub fn filter_detections(raw: Vec<RawDetection>, class_names: &ClassNames) -> Vec<DetectionRecord> {
    raw.into_iter()
        .filter(|det| det.confidence > CONFIDENCE_THRESHOLD)
        .map(|det| DetectionRecord {
            bbox: det.bbox,
            confidence: det.confidence,
            class_id: det.class_id,
            class_name: class_name(class_names, det.class_id),
        })
        .collect()
}
