// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection test harness
//!
//! Runs the pipeline once against an image given on the command line, or
//! the first image found in the test images directory.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::config::ServiceConfig;
use crate::detection::{DetectionPipeline, DetectionResult, ImageInput, ModelLoader};
use crate::vision::has_image_extension;

/// Car Parts Detection test harness
#[derive(Parser, Debug)]
#[command(name = "detect-cli")]
#[command(version)]
#[command(about = "Run car parts detection once against a test image", long_about = None)]
pub struct Cli {
    /// Image to test; defaults to the first image in the test images directory
    pub image: Option<PathBuf>,

    /// Model file (overrides MODEL_PATH and the models directory)
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Directory scanned when no image is given
    #[arg(long)]
    pub test_images_dir: Option<PathBuf>,
}

/// Execute the harness and return the detection result
pub fn execute(cli: Cli, mut config: ServiceConfig) -> Result<DetectionResult> {
    if let Some(model) = cli.model {
        config.model.path = Some(model);
    }
    if let Some(dir) = cli.test_images_dir {
        config.cli.test_images_dir = dir;
    }

    let test_images_dir = &config.cli.test_images_dir;
    std::fs::create_dir_all(test_images_dir).with_context(|| {
        format!(
            "Failed to create test images directory {}",
            test_images_dir.display()
        )
    })?;

    info!("Initializing car detector...");
    let model = ModelLoader::default()
        .load(&config.model.resolved_path())
        .context("Failed to initialize car detector")?;
    info!("Car detector initialized successfully");

    let image_path = select_image(cli.image.as_deref(), test_images_dir)?;

    info!("Testing with image: {}", image_path.display());
    let pipeline = DetectionPipeline::new(model.into())
        .with_max_image_bytes(config.server.max_upload_bytes);
    let result = pipeline.detect(ImageInput::FilePath(image_path));

    for line in summarize(&result) {
        info!("{}", line);
    }

    Ok(result)
}

/// The explicit image if it exists, otherwise the first image in `dir`
pub fn select_image(explicit: Option<&Path>, dir: &Path) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if !path.exists() {
            error!("Test image not found: {}", path.display());
            anyhow::bail!("Test image not found: {}", path.display());
        }
        return Ok(path.to_path_buf());
    }

    match find_first_image(dir)? {
        Some(path) => Ok(path),
        None => {
            error!("No test images found in {}", dir.display());
            info!("Please add some test images or provide an image path as an argument");
            anyhow::bail!("No test images found in {}", dir.display())
        }
    }
}

/// First `.png`/`.jpg`/`.jpeg` file in `dir` by name (extension case ignored)
pub fn find_first_image(dir: &Path) -> Result<Option<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?;

    let mut images: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && has_image_extension(path))
        .collect();
    images.sort();

    Ok(images.into_iter().next())
}

/// Human-readable result lines logged by the harness
pub fn summarize(result: &DetectionResult) -> Vec<String> {
    let status = if result.is_success() { "success" } else { "error" };

    let mut lines = vec![
        "Detection results:".to_string(),
        format!("Status: {}", status),
        format!("Is car: {}", result.is_car()),
        format!("Total detections: {}", result.total_detections()),
    ];

    if let Some(message) = result.error_message() {
        lines.push(format!("Error: {}", message));
    }

    if !result.detections().is_empty() {
        lines.push("Detected parts:".to_string());
        for (i, detection) in result.detections().iter().enumerate() {
            lines.push(format!(
                "  {}. {} (confidence: {:.2})",
                i + 1,
                detection.class_name,
                detection.confidence
            ));
        }
    }

    lines
}
