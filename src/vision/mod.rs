// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image decoding and detector preprocessing
//!
//! This module provides:
//! - Decoding of uploaded bytes and image files into `DynamicImage`
//! - Letterbox preprocessing into the detector's NCHW input tensor

pub mod image_utils;
pub mod preprocessing;

pub use image_utils::{
    decode_image_bytes, decode_image_file, has_image_extension, sniff_format, ImageError,
    ImageInfo, MAX_IMAGE_SIZE,
};
pub use preprocessing::{letterbox, preprocess_for_detection, Letterbox, DETECTOR_INPUT_SIZE};
