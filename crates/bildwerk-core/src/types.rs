// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Bildwerk.

use serde::{Deserialize, Serialize};

/// A point label expressed as a fraction of image width (`x`) and height (`y`).
///
/// Components are conceptually in `[0.0, 1.0]` but are never clamped: a
/// remapped label that falls outside the frame keeps its out-of-range value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedLabel {
    pub x: f32,
    pub y: f32,
}

impl NormalizedLabel {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Convert a pixel position in a `width` x `height` image to a label.
    pub fn from_pixel(px: f32, py: f32, width: u32, height: u32) -> Self {
        Self {
            x: px / width as f32,
            y: py / height as f32,
        }
    }

    /// Denormalize to a pixel position in a `width` x `height` image.
    pub fn to_pixel(self, width: u32, height: u32) -> (f32, f32) {
        (self.x * width as f32, self.y * height as f32)
    }

    /// Multiply both components independently.
    pub fn scaled(self, fx: f32, fy: f32) -> Self {
        Self {
            x: self.x * fx,
            y: self.y * fy,
        }
    }
}

impl From<(f32, f32)> for NormalizedLabel {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl From<[f32; 2]> for NormalizedLabel {
    fn from([x, y]: [f32; 2]) -> Self {
        Self { x, y }
    }
}

/// The fixed set of transform kinds, in pipeline execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    Resize,
    Flip,
    ContrastEnhance,
    Equalize,
    Scale,
    Rotate,
}

impl TransformKind {
    /// Every kind, in the order the pipeline runs them.
    pub const ALL: [TransformKind; 6] = [
        Self::Resize,
        Self::Flip,
        Self::ContrastEnhance,
        Self::Equalize,
        Self::Scale,
        Self::Rotate,
    ];

    /// Configuration key for this kind.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Resize => "resize",
            Self::Flip => "flip",
            Self::ContrastEnhance => "contrast_enhance",
            Self::Equalize => "equalize",
            Self::Scale => "scale",
            Self::Rotate => "rotate",
        }
    }

    /// Name of the result bucket this kind appends to.
    pub fn bucket(&self) -> &'static str {
        match self {
            Self::Resize => "resized",
            Self::Flip => "flipped",
            Self::ContrastEnhance => "contrast_enhanced",
            Self::Equalize => "equalized",
            Self::Scale => "scaled",
            Self::Rotate => "rotated",
        }
    }
}

impl std::fmt::Display for TransformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Flip axis, derived from an integer code by sign (`0` vertical, positive
/// horizontal, negative both).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum FlipAxis {
    /// Mirror top-to-bottom (about the x axis).
    Vertical,
    /// Mirror left-to-right (about the y axis).
    Horizontal,
    /// Mirror about both axes.
    Both,
}

impl FlipAxis {
    pub fn code(&self) -> i32 {
        match self {
            Self::Vertical => 0,
            Self::Horizontal => 1,
            Self::Both => -1,
        }
    }
}

impl From<i32> for FlipAxis {
    fn from(code: i32) -> Self {
        match code {
            0 => Self::Vertical,
            c if c > 0 => Self::Horizontal,
            _ => Self::Both,
        }
    }
}

impl From<FlipAxis> for i32 {
    fn from(axis: FlipAxis) -> Self {
        axis.code()
    }
}
