// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use image::DynamicImage;

use super::types::RawDetection;

/// Object detector seam between the pipeline and the inference runtime.
///
/// Implementations take a decoded image and return every object the model
/// reports, with boxes in the image's own pixel coordinates. One synchronous
/// call, no retries. Implementations must be shareable across request threads.
#[cfg_attr(test, mockall::automock)]
pub trait ObjectDetector: Send + Sync {
    /// Run the model on one image.
    fn detect(&self, image: &DynamicImage) -> Result<Vec<RawDetection>>;
}
