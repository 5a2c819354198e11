// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection endpoint module
//!
//! Provides POST /detect for finding car parts in an uploaded image.

pub mod handler;
pub mod response;

pub use handler::detect_handler;
pub use response::{DetectErrorResponse, DetectResponse};
