// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transform executors — resize, flip, contrast enhancement (CLAHE), histogram
// equalization, scale, and rotation. Each executor reads the source frame and
// returns the samples it produced; it never mutates the source.

pub mod contrast;
pub mod equalize;
pub mod flip;
pub mod resize;
pub mod rotate;
pub mod scale;

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::types::{NormalizedLabel, TransformKind};
use image::imageops::FilterType;
use image::DynamicImage;

/// Interpolation used for every resampling step (resize and scale).
pub const RESAMPLE_FILTER: FilterType = FilterType::Triangle;

/// Largest output, in pixels, an executor will allocate.
pub const MAX_OUTPUT_PIXELS: u64 = 1 << 26;

/// Fail with a transform error when a `width` x `height` output would exceed
/// [`MAX_OUTPUT_PIXELS`].
pub fn ensure_pixel_budget(kind: TransformKind, width: u32, height: u32) -> Result<()> {
    let pixels = u64::from(width) * u64::from(height);
    if pixels > MAX_OUTPUT_PIXELS {
        return Err(BildwerkError::transform(
            kind,
            format!("{width}x{height} output exceeds {MAX_OUTPUT_PIXELS} pixels"),
        ));
    }
    Ok(())
}

/// The input every executor reads: the source image plus its optional labels.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub image: &'a DynamicImage,
    pub labels: Option<&'a [NormalizedLabel]>,
}

impl<'a> Frame<'a> {
    pub fn new(image: &'a DynamicImage, labels: Option<&'a [NormalizedLabel]>) -> Self {
        Self { image, labels }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Labels for a transform that does not move pixels.
    pub fn labels_unchanged(&self) -> Option<Vec<NormalizedLabel>> {
        self.labels.map(<[_]>::to_vec)
    }

    /// Labels with `remap` applied to each one. Absent stays absent.
    pub fn labels_mapped(
        &self,
        remap: impl Fn(NormalizedLabel) -> NormalizedLabel,
    ) -> Option<Vec<NormalizedLabel>> {
        self.labels
            .map(|labels| labels.iter().copied().map(&remap).collect())
    }

    /// Fail with a transform error when the source has no pixels.
    pub fn ensure_not_empty(&self, kind: TransformKind) -> Result<()> {
        if self.width() == 0 || self.height() == 0 {
            return Err(BildwerkError::transform(
                kind,
                format!("source is zero-sized ({}x{})", self.width(), self.height()),
            ));
        }
        Ok(())
    }
}
