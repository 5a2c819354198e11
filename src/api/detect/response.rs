// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection response types

use serde::Serialize;

use crate::detection::DetectionResult;

/// Successful detection: the pipeline result plus a response timestamp
#[derive(Debug, Clone, Serialize)]
pub struct DetectResponse {
    #[serde(flatten)]
    pub result: DetectionResult,
    pub timestamp: String,
}

/// Body returned with HTTP 500 when the pipeline reports an error
#[derive(Debug, Clone, Serialize)]
pub struct DetectErrorResponse {
    /// Always `"error"`
    pub status: String,
    pub message: String,
    pub timestamp: String,
}

impl DetectErrorResponse {
    pub fn new(message: impl Into<String>, timestamp: String) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            timestamp,
        }
    }
}
