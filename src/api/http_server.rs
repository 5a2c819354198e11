// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::detect::detect_handler;
use super::handlers::{health_handler, model_info_handler, root_handler};
use crate::config::ServiceConfig;
use crate::detection::DetectionPipeline;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RwLock<Option<Arc<DetectionPipeline>>>>,
    pub config: Arc<ServiceConfig>,
}

impl AppState {
    pub fn new(pipeline: Arc<DetectionPipeline>, config: ServiceConfig) -> Self {
        Self {
            pipeline: Arc::new(RwLock::new(Some(pipeline))),
            config: Arc::new(config),
        }
    }

    /// State with no model loaded and default configuration
    pub fn new_for_test() -> Self {
        Self {
            pipeline: Arc::new(RwLock::new(None)),
            config: Arc::new(ServiceConfig::default()),
        }
    }

    pub async fn set_pipeline(&self, pipeline: Arc<DetectionPipeline>) {
        *self.pipeline.write().await = Some(pipeline);
    }

    pub async fn pipeline(&self) -> Option<Arc<DetectionPipeline>> {
        self.pipeline.read().await.clone()
    }
}

/// Build the router with CORS, request tracing and the upload size cap
pub fn create_app(state: AppState) -> Router {
    let max_upload = state.config.server.max_upload_bytes;

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/model-info", get(model_info_handler))
        .route("/detect", post(detect_handler))
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(state: AppState) -> anyhow::Result<()> {
    let addr = state.config.server.bind_address();
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Car Parts Detection API listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
