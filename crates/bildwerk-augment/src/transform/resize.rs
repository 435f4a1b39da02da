// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Resize executor. Normalized labels are resolution-independent, so they pass
// through unchanged.

use bildwerk_core::config::ResizeParams;
use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::types::TransformKind;
use image::DynamicImage;
use tracing::{debug, instrument};

use super::{Frame, RESAMPLE_FILTER, ensure_pixel_budget};
use crate::collector::AugmentedSample;

/// Resize `image` to exactly the configured size, ignoring aspect ratio.
#[instrument(skip(image), fields(from_w = image.width(), from_h = image.height()))]
pub fn resized(image: &DynamicImage, params: &ResizeParams) -> Result<DynamicImage> {
    if params.width == 0 || params.height == 0 || image.width() == 0 || image.height() == 0 {
        return Err(BildwerkError::transform(
            TransformKind::Resize,
            format!(
                "cannot resize {}x{} to {}x{}",
                image.width(),
                image.height(),
                params.width,
                params.height
            ),
        ));
    }
    ensure_pixel_budget(TransformKind::Resize, params.width, params.height)?;
    let out = image.resize_exact(params.width, params.height, RESAMPLE_FILTER);
    debug!(new_w = out.width(), new_h = out.height(), "Resize complete");
    Ok(out)
}

/// Produce exactly one resized sample, handing back the resized image too.
pub fn apply(
    frame: Frame<'_>,
    params: &ResizeParams,
) -> Result<(Vec<AugmentedSample>, DynamicImage)> {
    let out = resized(frame.image, params)?;
    let sample = AugmentedSample::from_dynamic(&out, frame.labels_unchanged());
    Ok((vec![sample], out))
}
