// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration
//!
//! Resolution order: built-in defaults, then an optional TOML file, then
//! environment variables.
//!
//! Relative directories loaded from a config file are anchored at that
//! file's directory. Defaults and environment values stay relative to the
//! working directory, so run the binaries from the project root or set
//! absolute paths.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::detection::ModelLoader;
use crate::vision::MAX_IMAGE_SIZE;

/// Environment variable naming the TOML config file
pub const CONFIG_PATH_ENV: &str = "DETECTOR_CONFIG";

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_upload_bytes: MAX_IMAGE_SIZE,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Model artifact location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Explicit model file; overrides `models_dir`
    pub path: Option<PathBuf>,
    pub models_dir: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: None,
            models_dir: PathBuf::from("./models"),
        }
    }
}

impl ModelConfig {
    /// Path the loader should open
    pub fn resolved_path(&self) -> PathBuf {
        ModelLoader::resolve_path(self.path.as_deref(), &self.models_dir)
    }
}

/// Test harness settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub test_images_dir: PathBuf,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            test_images_dir: PathBuf::from("./test_images"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub cli: CliConfig,
}

impl ServiceConfig {
    /// Load configuration from a TOML file; missing sections keep defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        if let Some(base) = path.parent() {
            config.anchor_paths(base);
        }
        Ok(config)
    }

    /// Resolve relative model and test-image locations against `base`
    pub fn anchor_paths(&mut self, base: &Path) {
        fn anchor(base: &Path, path: &mut PathBuf) {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }

        if let Some(model_path) = self.model.path.as_mut() {
            anchor(base, model_path);
        }
        anchor(base, &mut self.model.models_dir);
        anchor(base, &mut self.cli.test_images_dir);
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Full resolution: `DETECTOR_CONFIG` file if set, then environment
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup. Unparseable values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }

        if let Some(port) = lookup("API_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid API_PORT: {}", port),
            }
        }

        if let Some(limit) = lookup("MAX_UPLOAD_BYTES") {
            match limit.parse() {
                Ok(limit) => self.server.max_upload_bytes = limit,
                Err(_) => tracing::warn!("Ignoring invalid MAX_UPLOAD_BYTES: {}", limit),
            }
        }

        if let Some(path) = lookup("MODEL_PATH") {
            self.model.path = Some(PathBuf::from(path));
        }

        if let Some(dir) = lookup("MODELS_DIR") {
            self.model.models_dir = PathBuf::from(dir);
        }

        if let Some(dir) = lookup("TEST_IMAGES_DIR") {
            self.cli.test_images_dir = PathBuf::from(dir);
        }
    }
}
