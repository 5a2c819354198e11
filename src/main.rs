// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use car_parts_detector::{
    api::{start_server, AppState},
    config::ServiceConfig,
    detection::{DetectionPipeline, ModelLoader},
    version,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    tracing::info!("🚀 Starting {}...", version::get_version_string());

    let config = ServiceConfig::load()?;
    let model_path = config.model.resolved_path();
    tracing::info!("Initializing car detector with model at: {}", model_path.display());

    // The service never runs without a model
    let model = match ModelLoader::default().load(&model_path) {
        Ok(model) => model,
        Err(e) => {
            tracing::error!("❌ Failed to initialize car detector: {}", e);
            std::process::exit(1);
        }
    };

    let pipeline = Arc::new(
        DetectionPipeline::new(Arc::new(model))
            .with_max_image_bytes(config.server.max_upload_bytes),
    );
    let state = AppState::new(pipeline, config);

    start_server(state).await
}
