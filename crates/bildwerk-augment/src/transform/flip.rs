// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Flip executor. One output per configured axis code.
//
// Labels are always remapped with horizontal-flip semantics, `(x, y) ->
// (1 - x, y)`, whatever the axis. A vertical flip therefore does not move
// label `y`; existing label sets depend on this.

use bildwerk_core::config::FlipParams;
use bildwerk_core::error::Result;
use bildwerk_core::types::{FlipAxis, NormalizedLabel, TransformKind};
use image::DynamicImage;
use tracing::{debug, instrument};

use super::Frame;
use crate::collector::AugmentedSample;

/// Mirror `image` about `axis`.
pub fn flipped(image: &DynamicImage, axis: FlipAxis) -> DynamicImage {
    match axis {
        FlipAxis::Vertical => image.flipv(),
        FlipAxis::Horizontal => image.fliph(),
        FlipAxis::Both => image.rotate180(),
    }
}

/// Label remap shared by every axis.
pub fn flip_label(label: NormalizedLabel) -> NormalizedLabel {
    NormalizedLabel::new(1.0 - label.x, label.y)
}

#[instrument(skip_all, fields(axes = params.axes.len()))]
pub fn apply(frame: Frame<'_>, params: &FlipParams) -> Result<Vec<AugmentedSample>> {
    frame.ensure_not_empty(TransformKind::Flip)?;
    let samples = params
        .axes
        .iter()
        .map(|axis| {
            debug!(code = axis.code(), "Flipping");
            AugmentedSample::from_dynamic(
                &flipped(frame.image, *axis),
                frame.labels_mapped(flip_label),
            )
        })
        .collect();
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    /// 2x2 image with distinct corners: [[1, 2], [3, 4]].
    fn corners() -> DynamicImage {
        let mut img = GrayImage::new(2, 2);
        img.put_pixel(0, 0, Luma([1]));
        img.put_pixel(1, 0, Luma([2]));
        img.put_pixel(0, 1, Luma([3]));
        img.put_pixel(1, 1, Luma([4]));
        DynamicImage::ImageLuma8(img)
    }

    fn top_left(image: &DynamicImage) -> u8 {
        image.to_luma8().get_pixel(0, 0).0[0]
    }

    #[test]
    fn axis_codes_move_pixels() {
        let image = corners();
        assert_eq!(top_left(&flipped(&image, FlipAxis::Horizontal)), 2);
        assert_eq!(top_left(&flipped(&image, FlipAxis::Vertical)), 3);
        assert_eq!(top_left(&flipped(&image, FlipAxis::Both)), 4);
    }

    #[test]
    fn labels_mirror_x_for_every_axis() {
        let image = corners();
        let labels = [NormalizedLabel::new(0.2, 0.3), NormalizedLabel::new(0.9, 0.1)];
        let params = FlipParams {
            axes: vec![FlipAxis::Horizontal, FlipAxis::Vertical, FlipAxis::Both],
        };
        let samples = apply(Frame::new(&image, Some(&labels)), &params).expect("flip");
        assert_eq!(samples.len(), 3);
        for sample in &samples {
            let out = sample.labels.as_ref().expect("labels");
            for (before, after) in labels.iter().zip(out) {
                assert!((after.x - (1.0 - before.x)).abs() < 1e-6);
                assert_eq!(after.y, before.y);
            }
        }
    }

    #[test]
    fn absent_labels_stay_absent() {
        let image = corners();
        let params = FlipParams {
            axes: vec![FlipAxis::Horizontal],
        };
        let samples = apply(Frame::new(&image, None), &params).expect("flip");
        assert!(samples[0].labels.is_none());
    }
}
