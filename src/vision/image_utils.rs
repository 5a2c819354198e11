// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image loading for uploaded bytes and on-disk files

use std::path::Path;

use image::{DynamicImage, ImageFormat};
use thiserror::Error;

/// Default cap on encoded image size (20MB)
pub const MAX_IMAGE_SIZE: usize = 20 * 1024 * 1024;

/// Extensions the test harness treats as images
const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image data is empty")]
    EmptyData,

    #[error("Image is {size} bytes, larger than the {max} byte limit")]
    TooLarge { size: usize, max: usize },

    #[error("Unrecognized image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Cannot read image file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// What was learned about an image while decoding it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    /// Encoded size
    pub size_bytes: usize,
}

/// Decode an encoded image held in memory, refusing more than `max_bytes`.
///
/// The container format is sniffed from the content, never taken from a
/// file name or content type.
pub fn decode_image_bytes(
    bytes: &[u8],
    max_bytes: usize,
) -> Result<(DynamicImage, ImageInfo), ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }
    if bytes.len() > max_bytes {
        return Err(ImageError::TooLarge {
            size: bytes.len(),
            max: max_bytes,
        });
    }

    let format = sniff_format(bytes)?;
    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;

    let info = ImageInfo {
        width: decoded.width(),
        height: decoded.height(),
        format,
        size_bytes: bytes.len(),
    };
    Ok((decoded, info))
}

/// Read an image file and decode it like an upload
pub fn decode_image_file(
    path: &Path,
    max_bytes: usize,
) -> Result<(DynamicImage, ImageInfo), ImageError> {
    let bytes = std::fs::read(path).map_err(|source| ImageError::Io {
        path: path.display().to_string(),
        source,
    })?;
    decode_image_bytes(&bytes, max_bytes)
}

/// Identify the container format from its signature bytes.
///
/// Formats the `image` build cannot read count as unsupported.
pub fn sniff_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    image::guess_format(bytes)
        .ok()
        .filter(|format| format.reading_enabled())
        .ok_or(ImageError::UnsupportedFormat)
}

/// `.png`, `.jpg` or `.jpeg`, any case
pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}
