// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rotate executor. Rotation is about the image center with scale 1; positive
// degrees turn the content counter-clockwise on screen. Output keeps the
// source size: corners are clipped and exposed areas are filled with zero.

use bildwerk_core::config::RotateParams;
use bildwerk_core::error::Result;
use bildwerk_core::types::{NormalizedLabel, TransformKind};
use image::{DynamicImage, Luma, Rgb};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use tracing::{debug, instrument};

use super::Frame;
use crate::collector::AugmentedSample;
use crate::sampling::ParamSampler;

/// Produce one rotated sample per configured bound.
///
/// Labels pass through unchanged unless `remap_labels` is set.
#[instrument(skip_all, fields(bounds = params.degrees.len(), randomize = params.randomize))]
pub fn apply(
    frame: Frame<'_>,
    params: &RotateParams,
    sampler: &mut ParamSampler,
) -> Result<Vec<AugmentedSample>> {
    frame.ensure_not_empty(TransformKind::Rotate)?;
    let (width, height) = (frame.width(), frame.height());
    let samples = params
        .degrees
        .iter()
        .map(|&bound| {
            let degrees = effective_degrees(bound, params.randomize, sampler);
            debug!(bound, degrees, "Rotating");
            let labels = if params.remap_labels {
                frame.labels_mapped(|l| rotate_label(l, degrees, width, height))
            } else {
                frame.labels_unchanged()
            };
            AugmentedSample::from_dynamic(&rotated(frame.image, degrees), labels)
        })
        .collect();
    Ok(samples)
}

/// `bound` itself, or a draw between `0` and `bound` when randomized.
pub fn effective_degrees(bound: f32, randomize: bool, sampler: &mut ParamSampler) -> f32 {
    if !randomize {
        bound
    } else if bound < 0.0 {
        sampler.uniform(bound, 0.0)
    } else {
        sampler.uniform(0.0, bound)
    }
}

/// Rotate `image` about its center by `degrees` counter-clockwise.
///
/// Exactly zero degrees returns the image untouched (bilinear sampling would
/// otherwise blank the last row and column).
pub fn rotated(image: &DynamicImage, degrees: f32) -> DynamicImage {
    if degrees == 0.0 {
        return image.clone();
    }
    // imageproc turns clockwise for positive angles.
    let theta = -degrees.to_radians();
    match image {
        DynamicImage::ImageLuma8(gray) => DynamicImage::ImageLuma8(rotate_about_center(
            gray,
            theta,
            Interpolation::Bilinear,
            Luma([0u8]),
        )),
        other => DynamicImage::ImageRgb8(rotate_about_center(
            &other.to_rgb8(),
            theta,
            Interpolation::Bilinear,
            Rgb([0u8, 0, 0]),
        )),
    }
}

/// Rotate a label about the center of a `width` x `height` image with the
/// same matrix as [`rotated`]. The result is not clamped to the frame.
pub fn rotate_label(label: NormalizedLabel, degrees: f32, width: u32, height: u32) -> NormalizedLabel {
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let (px, py) = label.to_pixel(width, height);
    let (sin, cos) = degrees.to_radians().sin_cos();
    let (dx, dy) = (px - cx, py - cy);
    NormalizedLabel::from_pixel(
        cx + cos * dx + sin * dy,
        cy - sin * dx + cos * dy,
        width,
        height,
    )
}
