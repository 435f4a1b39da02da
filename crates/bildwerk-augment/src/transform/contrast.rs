// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contrast-limited adaptive histogram equalization (CLAHE).
//
// The image is split into a grid of tiles; each tile gets its own clipped,
// equalized lookup table, and every pixel is bilinearly blended between the
// tables of the four nearest tile centers so tile seams do not show.

use bildwerk_core::config::{Compatibility, ContrastParams};
use bildwerk_core::error::Result;
use bildwerk_core::types::TransformKind;
use image::{DynamicImage, GrayImage, Luma};
use tracing::{debug, instrument};

use super::Frame;
use crate::collector::AugmentedSample;
use crate::sampling::ParamSampler;

/// Tiles per axis.
pub const TILE_GRID: u32 = 8;

const BINS: usize = 256;

/// Produce one CLAHE sample per clip limit.
///
/// With `randomize`, each effective clip is drawn from `[clip - 1, clip]`.
/// In legacy mode nothing is emitted unless `randomize` is set.
#[instrument(skip_all, fields(clips = params.clip_limits.len(), randomize = params.randomize))]
pub fn apply(
    frame: Frame<'_>,
    params: &ContrastParams,
    sampler: &mut ParamSampler,
    compatibility: Compatibility,
) -> Result<Vec<AugmentedSample>> {
    if compatibility == Compatibility::Legacy && !params.randomize {
        debug!("legacy mode: contrast enhancement without randomize emits nothing");
        return Ok(Vec::new());
    }
    frame.ensure_not_empty(TransformKind::ContrastEnhance)?;

    let gray = frame.image.to_luma8();
    let samples = params
        .clip_limits
        .iter()
        .map(|&clip| {
            let effective = effective_clip(clip, params.randomize, sampler);
            debug!(clip, effective, "Applying CLAHE");
            let out = DynamicImage::ImageLuma8(clahe(&gray, effective, TILE_GRID));
            AugmentedSample::from_dynamic(&out, frame.labels_unchanged())
        })
        .collect();
    Ok(samples)
}

/// `clip` itself, or a draw from `[clip - 1, clip]` when randomized.
pub fn effective_clip(clip: f32, randomize: bool, sampler: &mut ParamSampler) -> f32 {
    if randomize {
        sampler.uniform(clip - 1.0, clip)
    } else {
        clip
    }
}

/// Apply CLAHE with a `grid` x `grid` tile layout and `clip_limit`.
///
/// A non-positive `clip_limit` disables clipping (plain adaptive
/// equalization). The grid shrinks on axes shorter than `grid` pixels.
pub fn clahe(image: &GrayImage, clip_limit: f32, grid: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || grid == 0 {
        return image.clone();
    }

    let layout = TileLayout::new(width, height, grid);
    let luts = tile_luts(image, &layout, clip_limit);

    // Per-column interpolation parameters are shared by every row.
    let columns: Vec<(usize, usize, f32)> = (0..width)
        .map(|x| blend_position(x, layout.tile_w, layout.tiles_x))
        .collect();

    let mut output = GrayImage::new(width, height);
    for y in 0..height {
        let (ty1, ty2, ya) = blend_position(y, layout.tile_h, layout.tiles_y);
        let row1 = ty1 * layout.tiles_x as usize;
        let row2 = ty2 * layout.tiles_x as usize;
        for (x, &(tx1, tx2, xa)) in columns.iter().enumerate() {
            let v = image.get_pixel(x as u32, y).0[0] as usize;
            let top = luts[row1 + tx1][v] as f32 * (1.0 - xa) + luts[row1 + tx2][v] as f32 * xa;
            let bottom = luts[row2 + tx1][v] as f32 * (1.0 - xa) + luts[row2 + tx2][v] as f32 * xa;
            let blended = top * (1.0 - ya) + bottom * ya;
            output.put_pixel(x as u32, y, Luma([blended.round().clamp(0.0, 255.0) as u8]));
        }
    }
    output
}

// -- Tile helpers -------------------------------------------------------------

/// Tile sizes and counts covering a `width` x `height` image.
///
/// Tiles are ceil-sized so the last row/column may be smaller; the count is
/// recomputed from the tile size so no tile is empty.
#[derive(Debug, Clone, Copy)]
struct TileLayout {
    width: u32,
    height: u32,
    tile_w: u32,
    tile_h: u32,
    tiles_x: u32,
    tiles_y: u32,
}

impl TileLayout {
    fn new(width: u32, height: u32, grid: u32) -> Self {
        let tile_w = width.div_ceil(grid.min(width));
        let tile_h = height.div_ceil(grid.min(height));
        Self {
            width,
            height,
            tile_w,
            tile_h,
            tiles_x: width.div_ceil(tile_w),
            tiles_y: height.div_ceil(tile_h),
        }
    }
}

/// One lookup table per tile, row-major.
fn tile_luts(image: &GrayImage, layout: &TileLayout, clip_limit: f32) -> Vec<[u8; BINS]> {
    let mut luts = Vec::with_capacity((layout.tiles_x * layout.tiles_y) as usize);
    for ty in 0..layout.tiles_y {
        let y0 = ty * layout.tile_h;
        let y1 = (y0 + layout.tile_h).min(layout.height);
        for tx in 0..layout.tiles_x {
            let x0 = tx * layout.tile_w;
            let x1 = (x0 + layout.tile_w).min(layout.width);

            let mut histogram = [0u32; BINS];
            for y in y0..y1 {
                for x in x0..x1 {
                    histogram[image.get_pixel(x, y).0[0] as usize] += 1;
                }
            }
            let area = (x1 - x0) * (y1 - y0);
            if clip_limit > 0.0 {
                let limit = ((clip_limit * area as f32 / BINS as f32) as u32).max(1);
                clip_histogram(&mut histogram, limit);
            }
            luts.push(equalization_lut(&histogram, area));
        }
    }
    luts
}

/// Clip every bin at `limit` and hand the excess back out evenly; whatever
/// does not divide evenly is spread one count at a time with a fixed stride.
fn clip_histogram(histogram: &mut [u32; BINS], limit: u32) {
    let mut excess = 0u32;
    for bin in histogram.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }

    let batch = excess / BINS as u32;
    let mut residual = excess % BINS as u32;
    for bin in histogram.iter_mut() {
        *bin += batch;
    }
    if residual > 0 {
        let step = (BINS as u32 / residual).max(1) as usize;
        let mut i = 0;
        while residual > 0 && i < BINS {
            histogram[i] += 1;
            residual -= 1;
            i += step;
        }
    }
}

/// Scaled cumulative histogram.
fn equalization_lut(histogram: &[u32; BINS], area: u32) -> [u8; BINS] {
    let scale = 255.0 / area.max(1) as f32;
    let mut lut = [0u8; BINS];
    let mut sum = 0u32;
    for (entry, &count) in lut.iter_mut().zip(histogram) {
        sum += count;
        *entry = (sum as f32 * scale).round().min(255.0) as u8;
    }
    lut
}

/// Neighbouring tile indices and blend weight for pixel coordinate `pos`,
/// measured from tile centers and clamped at the borders.
fn blend_position(pos: u32, tile_size: u32, tiles: u32) -> (usize, usize, f32) {
    let t = pos as f32 / tile_size as f32 - 0.5;
    let t1 = t.floor();
    let weight = t - t1;
    let last = tiles as i64 - 1;
    let i1 = (t1 as i64).clamp(0, last) as usize;
    let i2 = (t1 as i64 + 1).clamp(0, last) as usize;
    (i1, i2, weight)
}
