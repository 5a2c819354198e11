// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the Car Parts Detection API

/// Human-readable service name
pub const SERVICE_NAME: &str = "Car Parts Detection API";

/// Semantic version number, reported by `GET /`
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("{} v{}", SERVICE_NAME, VERSION)
}
