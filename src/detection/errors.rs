// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use thiserror::Error;

use crate::vision::ImageError;

/// Model could not be made ready; the service must not start
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Model file not found: {0}")]
    ModelNotFound(String),

    #[error("Failed to load model from {path}: {message}")]
    SessionBuild { path: String, message: String },

    #[error("Model {0} has no class names (expected 'names' metadata or a labels file)")]
    MissingClassNames(String),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Per-request failure, always converted into an error result
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Unsupported image data type")]
    UnsupportedInput,

    #[error(transparent)]
    Decode(#[from] ImageError),

    #[error("Inference failed: {0}")]
    Inference(String),
}

impl PipelineError {
    /// Short machine-readable kind used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::UnsupportedInput => "unsupported_input",
            PipelineError::Decode(_) => "decode",
            PipelineError::Inference(_) => "inference",
        }
    }
}
