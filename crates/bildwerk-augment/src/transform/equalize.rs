// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Global histogram equalization executor.

use bildwerk_core::error::Result;
use bildwerk_core::types::TransformKind;
use image::DynamicImage;
use imageproc::contrast::equalize_histogram;
use tracing::instrument;

use super::Frame;
use crate::collector::AugmentedSample;

/// Produce exactly one equalized sample of the grayscale source.
#[instrument(skip_all)]
pub fn apply(frame: Frame<'_>) -> Result<Vec<AugmentedSample>> {
    frame.ensure_not_empty(TransformKind::Equalize)?;
    let equalized = equalize_histogram(&frame.image.to_luma8());
    Ok(vec![AugmentedSample::from_dynamic(
        &DynamicImage::ImageLuma8(equalized),
        frame.labels_unchanged(),
    )])
}
