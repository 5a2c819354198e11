// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod detection;
pub mod version;
pub mod vision;

pub use config::ServiceConfig;
pub use detection::{
    DetectionPipeline, DetectionRecord, DetectionResult, ImageInput, ModelHandle, ModelLoader,
};
