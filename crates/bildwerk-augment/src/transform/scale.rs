// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scale executor. Every output keeps the source's dimensions:
//
// - factor < 1: the shrunken image is centered on a zero-filled canvas
//   (letterboxing); labels shrink by `content / canvas` per axis.
// - factor >= 1: the centered source region the enlargement would keep is
//   cropped and enlarged to the source size, so nothing larger than the
//   output is ever allocated; labels shrink by `source / scaled` per axis.
//
// Centering offsets are `floor((container - content) / 2)` on each axis.
// Label factors scale toward the origin and do not add the centering offset.

use bildwerk_core::config::ScaleParams;
use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::types::TransformKind;
use image::imageops;
use image::{DynamicImage, GrayImage, RgbImage};
use tracing::{debug, instrument};

use super::{Frame, RESAMPLE_FILTER};
use crate::collector::AugmentedSample;
use crate::sampling::ParamSampler;

/// A scaled frame and the per-axis label factors that go with it.
#[derive(Debug, Clone)]
pub struct Scaled {
    pub image: DynamicImage,
    pub label_fx: f32,
    pub label_fy: f32,
}

/// Produce one sample per configured factor.
#[instrument(skip_all, fields(factors = params.factors.len(), randomize = params.randomize))]
pub fn apply(
    frame: Frame<'_>,
    params: &ScaleParams,
    sampler: &mut ParamSampler,
) -> Result<Vec<AugmentedSample>> {
    frame.ensure_not_empty(TransformKind::Scale)?;
    params
        .factors
        .iter()
        .map(|&factor| {
            let effective = effective_factor(factor, params.randomize, sampler);
            let scaled = scale_frame(frame.image, effective)?;
            Ok(AugmentedSample::from_dynamic(
                &scaled.image,
                frame.labels_mapped(|l| l.scaled(scaled.label_fx, scaled.label_fy)),
            ))
        })
        .collect()
}

/// The factor actually applied: `factor` itself, or a draw between it and
/// `1.0` when randomized.
pub fn effective_factor(factor: f32, randomize: bool, sampler: &mut ParamSampler) -> f32 {
    if !randomize {
        factor
    } else if factor < 1.0 {
        sampler.uniform(factor, 1.0)
    } else {
        sampler.uniform(1.0, factor)
    }
}

/// Scale `image` by `factor` on both axes and bring it back to the original
/// frame size.
pub fn scale_frame(image: &DynamicImage, factor: f32) -> Result<Scaled> {
    let (width, height) = (image.width(), image.height());
    let scaled_w = (f64::from(width) * f64::from(factor)).floor();
    let scaled_h = (f64::from(height) * f64::from(factor)).floor();
    if scaled_w < 1.0 || scaled_h < 1.0 {
        return Err(BildwerkError::transform(
            TransformKind::Scale,
            format!("factor {factor} shrinks {width}x{height} to nothing"),
        ));
    }
    debug!(factor, scaled_w, scaled_h, "Scaling");

    if factor < 1.0 {
        let (content_w, content_h) = (scaled_w as u32, scaled_h as u32);
        let resized = image.resize_exact(content_w, content_h, RESAMPLE_FILTER);
        let x = centered_offset(width, content_w);
        let y = centered_offset(height, content_h);
        Ok(Scaled {
            image: letterbox(&resized, width, height, x, y),
            label_fx: content_w as f32 / width as f32,
            label_fy: content_h as f32 / height as f32,
        })
    } else {
        let fx = f64::from(width) / scaled_w;
        let fy = f64::from(height) / scaled_h;
        let crop_w = ((f64::from(width) * fx).round() as u32).clamp(1, width);
        let crop_h = ((f64::from(height) * fy).round() as u32).clamp(1, height);
        let region = image.crop_imm(
            centered_offset(width, crop_w),
            centered_offset(height, crop_h),
            crop_w,
            crop_h,
        );
        Ok(Scaled {
            image: region.resize_exact(width, height, RESAMPLE_FILTER),
            label_fx: fx as f32,
            label_fy: fy as f32,
        })
    }
}

/// `floor((container - content) / 2)`, zero when the content is larger.
pub fn centered_offset(container: u32, content: u32) -> u32 {
    container.saturating_sub(content) / 2
}

/// Place `content` at `(x, y)` on a zero-filled `width` x `height` canvas of
/// the same color type.
fn letterbox(content: &DynamicImage, width: u32, height: u32, x: u32, y: u32) -> DynamicImage {
    match content {
        DynamicImage::ImageLuma8(gray) => {
            let mut canvas = GrayImage::new(width, height);
            imageops::replace(&mut canvas, gray, x as i64, y as i64);
            DynamicImage::ImageLuma8(canvas)
        }
        other => {
            let mut canvas = RgbImage::new(width, height);
            imageops::replace(&mut canvas, &other.to_rgb8(), x as i64, y as i64);
            DynamicImage::ImageRgb8(canvas)
        }
    }
}
