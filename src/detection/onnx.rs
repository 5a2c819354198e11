// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ONNX Runtime backed YOLOv8 detector
//!
//! Loads an Ultralytics detection export and runs it on CUDA when available,
//! otherwise on CPU.

use anyhow::{Context, Result};
use image::DynamicImage;
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::class_names::{parse_input_size, parse_ultralytics_names};
use super::detector::ObjectDetector;
use super::postprocess::{decode_yolov8_output, DecodeParams};
use super::types::{ClassNames, RawDetection};
use crate::vision::{preprocess_for_detection, DETECTOR_INPUT_SIZE};

/// Device label reported when the CUDA provider registered
pub const DEVICE_CUDA: &str = "cuda:0";
/// Device label reported for CPU execution
pub const DEVICE_CPU: &str = "cpu";

/// YOLOv8 detection model running in ONNX Runtime
pub struct OnnxDetector {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    input_name: String,
    output_name: String,
    input_size: u32,
    device: &'static str,
    /// Class names embedded in the export, if any
    metadata_names: Option<ClassNames>,
    params: DecodeParams,
}

impl std::fmt::Debug for OnnxDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxDetector")
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .field("input_size", &self.input_size)
            .field("device", &self.device)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl OnnxDetector {
    /// Load a detection export from disk
    ///
    /// # Errors
    /// Returns error if the file is missing or ONNX Runtime cannot build a
    /// session on either CUDA or CPU.
    pub fn load<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("ONNX model file not found: {}", model_path.display());
        }

        info!("🚀 Loading detection model from {}", model_path.display());

        let cuda_result = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CUDAExecutionProvider::default()
                .build()
                .error_on_failure()])
            .and_then(|builder| builder.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|builder| builder.with_intra_threads(4))
            .and_then(|builder| builder.commit_from_file(model_path));

        let (session, device) = match cuda_result {
            Ok(session) => {
                info!("✅ CUDA execution provider initialized");
                (session, DEVICE_CUDA)
            }
            Err(e) => {
                warn!("⚠️  CUDA execution provider unavailable: {}", e);
                warn!("   Falling back to CPU execution provider");
                let session = Session::builder()
                    .context("Failed to create session builder")?
                    .with_execution_providers([CPUExecutionProvider::default().build()])
                    .context("Failed to set CPU execution provider")?
                    .with_optimization_level(GraphOptimizationLevel::Level3)
                    .context("Failed to set optimization level")?
                    .with_intra_threads(4)
                    .context("Failed to set intra threads")?
                    .commit_from_file(model_path)
                    .with_context(|| {
                        format!("Failed to load ONNX model from {}", model_path.display())
                    })?;
                (session, DEVICE_CPU)
            }
        };

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());
        let output_name = first_output_name(session.outputs.iter().map(|o| o.name.as_str()))?;

        let (metadata_names, input_size) = match session.metadata() {
            Ok(metadata) => {
                let names = metadata
                    .custom("names")
                    .ok()
                    .flatten()
                    .and_then(|raw| parse_ultralytics_names(&raw));
                let imgsz = metadata
                    .custom("imgsz")
                    .ok()
                    .flatten()
                    .and_then(|raw| parse_input_size(&raw));
                (names, imgsz.unwrap_or(DETECTOR_INPUT_SIZE))
            }
            Err(e) => {
                warn!("⚠️  Could not read model metadata: {}", e);
                (None, DETECTOR_INPUT_SIZE)
            }
        };

        debug!(
            "Detection model input: {} ({}x{}), output: {}, embedded classes: {}",
            input_name,
            input_size,
            input_size,
            output_name,
            metadata_names.as_ref().map(|n| n.len()).unwrap_or(0)
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            output_name,
            input_size,
            device,
            metadata_names,
            params: DecodeParams::default(),
        })
    }

    /// `cuda:0` or `cpu`
    pub fn device(&self) -> &'static str {
        self.device
    }

    /// Class names from the export's `names` metadata
    pub fn metadata_names(&self) -> Option<&ClassNames> {
        self.metadata_names.as_ref()
    }
}

/// Detection head the decoder reads. A graph without outputs cannot be used.
fn first_output_name<'a>(mut names: impl Iterator<Item = &'a str>) -> Result<String> {
    names
        .next()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Detection model declares no outputs"))
}

impl ObjectDetector for OnnxDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<RawDetection>> {
        let (tensor, geometry) = preprocess_for_detection(image, self.input_size);
        let input_value = Value::from_array(tensor).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Detection session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_value])
            .context("Detection inference failed")?;

        let output = outputs[self.output_name.as_str()]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        debug!("Detection output shape: {:?}", output.shape());

        let detections = decode_yolov8_output(output.view(), &geometry, &self.params)?;
        Ok(detections)
    }
}
