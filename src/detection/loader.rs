// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Model loading at process startup

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::class_names::find_labels_file;
use super::detector::ObjectDetector;
use super::errors::StartupError;
use super::observer::{DetectionObserver, TracingObserver};
use super::onnx::OnnxDetector;
use super::types::ClassNames;

/// File name of the detector inside the models directory
pub const DEFAULT_MODEL_FILE: &str = "car_parts_detector.onnx";

/// Model type reported by `/model-info`
pub const MODEL_TYPE: &str = "YOLOv8";

/// A loaded detection model, read-only and shared by every request
pub struct ModelHandle {
    detector: Arc<dyn ObjectDetector>,
    class_names: ClassNames,
    model_path: PathBuf,
    size_bytes: u64,
    device: String,
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("model_path", &self.model_path)
            .field("size_bytes", &self.size_bytes)
            .field("device", &self.device)
            .field("classes", &self.class_names.len())
            .finish_non_exhaustive()
    }
}

impl ModelHandle {
    pub fn new(
        detector: Arc<dyn ObjectDetector>,
        class_names: ClassNames,
        model_path: impl Into<PathBuf>,
        size_bytes: u64,
        device: impl Into<String>,
    ) -> Self {
        Self {
            detector,
            class_names,
            model_path: model_path.into(),
            size_bytes,
            device: device.into(),
        }
    }

    pub fn detector(&self) -> &dyn ObjectDetector {
        self.detector.as_ref()
    }

    pub fn class_names(&self) -> &ClassNames {
        &self.class_names
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Size on disk formatted as `"12.34 MB"`
    pub fn size_label(&self) -> String {
        format!("{:.2} MB", self.size_bytes as f64 / (1024.0 * 1024.0))
    }

    pub fn device(&self) -> &str {
        &self.device
    }
}

/// Loads the detection model once per process
pub struct ModelLoader {
    observer: Arc<dyn DetectionObserver>,
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new(Arc::new(TracingObserver))
    }
}

impl ModelLoader {
    pub fn new(observer: Arc<dyn DetectionObserver>) -> Self {
        Self { observer }
    }

    /// Explicit path if configured, otherwise `<models_dir>/car_parts_detector.onnx`
    pub fn resolve_path(configured: Option<&Path>, models_dir: &Path) -> PathBuf {
        configured
            .map(Path::to_path_buf)
            .unwrap_or_else(|| models_dir.join(DEFAULT_MODEL_FILE))
    }

    /// Load the ONNX detector and its class names.
    ///
    /// # Errors
    /// Any failure is fatal for the caller: missing file, a session ONNX
    /// Runtime cannot build, or a model with no class names.
    pub fn load(&self, path: &Path) -> Result<ModelHandle, StartupError> {
        let display = path.display().to_string();

        if !path.is_file() {
            return Err(StartupError::ModelNotFound(display));
        }

        let size_bytes = std::fs::metadata(path)
            .map_err(|source| StartupError::Io {
                path: display.clone(),
                source,
            })?
            .len();

        let detector = OnnxDetector::load(path).map_err(|e| StartupError::SessionBuild {
            path: display.clone(),
            message: format!("{:#}", e),
        })?;

        let class_names = resolve_class_names(path, detector.metadata_names())?;
        let device = detector.device();

        self.observer.model_loaded(path, &class_names, device);

        Ok(ModelHandle::new(
            Arc::new(detector),
            class_names,
            path,
            size_bytes,
            device,
        ))
    }
}

/// Embedded metadata wins; otherwise a labels file next to the model.
pub fn resolve_class_names(
    model_path: &Path,
    embedded: Option<&ClassNames>,
) -> Result<ClassNames, StartupError> {
    if let Some(names) = embedded.filter(|names| !names.is_empty()) {
        return Ok(names.clone());
    }

    match find_labels_file(model_path) {
        Some((labels_path, names)) => {
            tracing::info!("Using class names from {}", labels_path.display());
            Ok(names)
        }
        None => Err(StartupError::MissingClassNames(
            model_path.display().to_string(),
        )),
    }
}
