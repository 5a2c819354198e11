// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for the YOLOv8 detector

use image::{imageops::FilterType, DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::Array4;

/// Default square input size of the exported detector
pub const DETECTOR_INPUT_SIZE: u32 = 640;

/// Gray level used to pad letterboxed images (Ultralytics default)
pub const PAD_VALUE: u8 = 114;

/// Geometry of a letterbox transform, kept to map boxes back
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    /// Resize ratio applied to the original image
    pub scale: f32,
    /// Left padding in model input pixels
    pub pad_x: f32,
    /// Top padding in model input pixels
    pub pad_y: f32,
    pub orig_width: u32,
    pub orig_height: u32,
}

impl Letterbox {
    /// Compute the transform that fits `orig_width x orig_height` into a
    /// `target_size` square while preserving aspect ratio.
    pub fn new(orig_width: u32, orig_height: u32, target_size: u32) -> Self {
        let scale = (target_size as f32 / orig_width.max(1) as f32)
            .min(target_size as f32 / orig_height.max(1) as f32);
        let (new_w, new_h) = scaled_dims(orig_width, orig_height, scale);

        let dw = (target_size - new_w.min(target_size)) as f32 / 2.0;
        let dh = (target_size - new_h.min(target_size)) as f32 / 2.0;

        Self {
            scale,
            pad_x: (dw - 0.1).round().max(0.0),
            pad_y: (dh - 0.1).round().max(0.0),
            orig_width,
            orig_height,
        }
    }

    /// Map an `[x1, y1, x2, y2]` box from model input space back to the
    /// original image, clipped to its bounds.
    pub fn to_original(&self, bbox: [f32; 4]) -> [f32; 4] {
        let w = self.orig_width as f32;
        let h = self.orig_height as f32;
        [
            ((bbox[0] - self.pad_x) / self.scale).clamp(0.0, w),
            ((bbox[1] - self.pad_y) / self.scale).clamp(0.0, h),
            ((bbox[2] - self.pad_x) / self.scale).clamp(0.0, w),
            ((bbox[3] - self.pad_y) / self.scale).clamp(0.0, h),
        ]
    }
}

fn scaled_dims(width: u32, height: u32, scale: f32) -> (u32, u32) {
    (
        ((width as f32 * scale).round() as u32).max(1),
        ((height as f32 * scale).round() as u32).max(1),
    )
}

/// Resize with aspect ratio preservation and center the result on a
/// `target_size` square padded with [`PAD_VALUE`].
pub fn letterbox(image: &DynamicImage, target_size: u32) -> (RgbImage, Letterbox) {
    let (orig_w, orig_h) = image.dimensions();
    let geometry = Letterbox::new(orig_w, orig_h, target_size);

    let mut canvas = RgbImage::from_pixel(
        target_size,
        target_size,
        Rgb([PAD_VALUE, PAD_VALUE, PAD_VALUE]),
    );

    if orig_w == 0 || orig_h == 0 {
        return (canvas, geometry);
    }

    let (new_w, new_h) = scaled_dims(orig_w, orig_h, geometry.scale);
    let resized = image
        .resize_exact(
            new_w.min(target_size),
            new_h.min(target_size),
            FilterType::Triangle,
        )
        .to_rgb8();

    image::imageops::overlay(
        &mut canvas,
        &resized,
        geometry.pad_x as i64,
        geometry.pad_y as i64,
    );

    (canvas, geometry)
}

/// Preprocess an image for the detector
///
/// Steps:
/// 1. Letterbox to `target_size` (aspect preserved, gray padding)
/// 2. Scale pixels to `[0, 1]`
/// 3. Convert to NCHW tensor format `[1, 3, H, W]`
pub fn preprocess_for_detection(image: &DynamicImage, target_size: u32) -> (Array4<f32>, Letterbox) {
    let (rgb, geometry) = letterbox(image, target_size);
    let size = target_size as usize;

    let mut tensor = Array4::zeros((1, 3, size, size));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }

    (tensor, geometry)
}
