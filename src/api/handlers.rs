// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use super::errors::ApiError;
use super::http_server::AppState;
use crate::detection::MODEL_TYPE;
use crate::version;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Endpoints {
    pub health: String,
    pub detect: String,
    pub model_info: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            health: "/health".to_string(),
            detect: "/detect".to_string(),
            model_info: "/model-info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub status: String,
    pub message: String,
    pub version: String,
    pub timestamp: String,
    pub endpoints: Endpoints,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfoResponse {
    pub model_type: String,
    pub model_path: String,
    /// Size on disk, e.g. `"52.01 MB"`
    pub model_size: String,
    /// `cuda:0` or `cpu`
    pub device: String,
    /// Class id (as string key) to name
    pub classes: BTreeMap<String, String>,
}

/// Local time in RFC 3339, as attached to every response
pub fn timestamp() -> String {
    chrono::Local::now().to_rfc3339()
}

/// GET / - Service metadata
pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        status: "online".to_string(),
        message: format!("{} is running", version::SERVICE_NAME),
        version: version::VERSION.to_string(),
        timestamp: timestamp(),
        endpoints: Endpoints::default(),
    })
}

/// GET /health - Whether a model is loaded
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        model_loaded: state.pipeline().await.is_some(),
        timestamp: timestamp(),
    })
}

/// GET /model-info - Artifact path, size, device and class mapping
///
/// # Errors
/// - 503 Service Unavailable: no model loaded
pub async fn model_info_handler(
    State(state): State<AppState>,
) -> Result<Json<ModelInfoResponse>, ApiError> {
    let pipeline = state.pipeline().await.ok_or_else(|| {
        warn!("Model info requested without a loaded model");
        ApiError::ServiceUnavailable("Model not loaded".to_string())
    })?;
    let model = pipeline.model();

    Ok(Json(ModelInfoResponse {
        model_type: MODEL_TYPE.to_string(),
        model_path: model.model_path().display().to_string(),
        model_size: model.size_label(),
        device: model.device().to_string(),
        classes: model
            .class_names()
            .iter()
            .map(|(id, name)| (id.to_string(), name.clone()))
            .collect(),
    }))
}
