// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Label overlay — draws a marker at every label's pixel position so outputs
// can be inspected by eye.

use std::path::{Path, PathBuf};

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::types::NormalizedLabel;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;
use tracing::{info, instrument};

use crate::collector::ResultCollector;

/// Marker radius in pixels.
pub const MARKER_RADIUS: i32 = 3;

pub const MARKER_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Copy of `image` with a filled marker at each label.
pub fn draw_labels(image: &RgbImage, labels: Option<&[NormalizedLabel]>) -> RgbImage {
    let mut canvas = image.clone();
    let (width, height) = image.dimensions();
    for label in labels.unwrap_or_default() {
        let (px, py) = label.to_pixel(width, height);
        draw_filled_circle_mut(&mut canvas, (px as i32, py as i32), MARKER_RADIUS, MARKER_COLOR);
    }
    canvas
}

/// Write `<stem>_<bucket><i>_preview.png` for every sample, labels drawn in.
#[instrument(skip(results), fields(samples = results.len()))]
pub fn save_previews(results: &ResultCollector, dir: &Path, stem: &str) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(results.len());
    for (bucket, samples) in results.iter() {
        for (i, sample) in samples.iter().enumerate() {
            let path = dir.join(format!("{stem}_{bucket}{i}_preview.png"));
            draw_labels(&sample.image, sample.labels.as_deref())
                .save(&path)
                .map_err(|err| {
                    BildwerkError::ImageError(format!(
                        "failed to save preview to {}: {}",
                        path.display(),
                        err
                    ))
                })?;
            written.push(path);
        }
    }
    info!(written = written.len(), "Previews saved");
    Ok(written)
}
