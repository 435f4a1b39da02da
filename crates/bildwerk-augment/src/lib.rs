// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// bildwerk-augment — The augmentation pipeline for Bildwerk.
//
// Resolves a transform configuration, runs the executors (resize, flip,
// CLAHE, histogram equalization, scale, rotate) over one source image with
// label-consistent geometry, collects the outputs per transform kind, and
// exports them as JPEGs with a CSV manifest or as labelled previews.

pub mod collector;
pub mod export;
pub mod pipeline;
pub mod plan;
pub mod sampling;
pub mod source;
pub mod transform;

// Re-export the primary structs so callers can use `bildwerk_augment::Augmenter` etc.
pub use collector::{AugmentedSample, ResultCollector, TransformFailure, Watermark};
pub use export::CsvExporter;
pub use pipeline::Augmenter;
pub use plan::AugmentPlan;
pub use source::SourceImage;
