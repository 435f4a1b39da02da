// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Augmentation pipeline — loads a source image, runs every active executor in
// a fixed order against it, and collects the outputs per transform kind.

use std::path::Path;

use bildwerk_core::config::{AugmentConfig, Compatibility};
use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::types::{NormalizedLabel, TransformKind};
use image::DynamicImage;
use tracing::{debug, info, instrument, warn};

use crate::collector::{ResultCollector, Watermark};
use crate::plan::AugmentPlan;
use crate::sampling::ParamSampler;
use crate::source::SourceImage;
use crate::transform::{self, Frame};

/// Runs a resolved transform set over one source image at a time.
///
/// ```ignore
/// let config = AugmentConfig::default()
///     .with(TransformSpec::Resize(ResizeParams { width: 64, height: 64 }));
/// let mut augmenter = Augmenter::new(&config)?;
/// let results = augmenter.perform("lena.png", None)?;
/// assert_eq!(results.bucket("resized").map(<[_]>::len), Some(1));
/// ```
pub struct Augmenter {
    plan: AugmentPlan,
    sampler: ParamSampler,
    /// The most recently loaded source.
    source: Option<SourceImage>,
    results: ResultCollector,
    /// Collector state when the latest run started.
    run_start: Watermark,
}

impl Augmenter {
    /// Resolve `config` and build a pipeline for it.
    pub fn new(config: &AugmentConfig) -> Result<Self> {
        let plan = AugmentPlan::resolve(config)?;
        Ok(Self::from_plan(plan))
    }

    pub fn from_plan(plan: AugmentPlan) -> Self {
        Self {
            sampler: ParamSampler::new(plan.seed),
            plan,
            source: None,
            results: ResultCollector::new(),
            run_start: Watermark::default(),
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn plan(&self) -> &AugmentPlan {
        &self.plan
    }

    /// Advisory per-image output count; see [`AugmentPlan::expected_outputs`].
    pub fn expected_outputs(&self) -> usize {
        self.plan.expected_outputs()
    }

    pub fn results(&self) -> &ResultCollector {
        &self.results
    }

    /// Samples and failures of the latest run only. In corrected mode this
    /// equals [`results`](Self::results); in legacy mode it leaves out what
    /// earlier runs accumulated.
    pub fn latest_results(&self) -> ResultCollector {
        self.results.since(&self.run_start)
    }

    pub fn into_results(self) -> ResultCollector {
        self.results
    }

    /// The source image of the last run, if any.
    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    /// Drop every collected sample and failure.
    pub fn reset(&mut self) {
        self.results.clear();
        self.run_start = Watermark::default();
    }

    // -- Running --------------------------------------------------------------

    /// Load `path` and run every active executor against it.
    ///
    /// In corrected mode the collector is reset first, so the returned
    /// results belong to this image only, and a missing file is
    /// [`BildwerkError::SourceNotFound`]. In legacy mode results accumulate
    /// across calls and a missing file is skipped with a warning.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn perform(
        &mut self,
        path: impl AsRef<Path>,
        labels: Option<Vec<NormalizedLabel>>,
    ) -> Result<&ResultCollector> {
        if self.plan.compatibility == Compatibility::Corrected {
            self.results.clear();
        }
        let source = match SourceImage::load(path.as_ref(), self.plan.gray) {
            Ok(source) => source,
            Err(BildwerkError::SourceNotFound { path })
                if self.plan.compatibility == Compatibility::Legacy =>
            {
                warn!(path = %path.display(), "legacy mode: source missing, skipping image");
                self.run_start = self.results.watermark();
                return Ok(&self.results);
            }
            Err(err) => return Err(err),
        };
        Ok(self.run(source, labels))
    }

    /// Run every active executor against an already-loaded source.
    pub fn perform_image(
        &mut self,
        source: SourceImage,
        labels: Option<Vec<NormalizedLabel>>,
    ) -> &ResultCollector {
        if self.plan.compatibility == Compatibility::Corrected {
            self.results.clear();
        }
        self.run(source, labels)
    }

    fn run(&mut self, source: SourceImage, labels: Option<Vec<NormalizedLabel>>) -> &ResultCollector {
        let legacy = self.plan.compatibility == Compatibility::Legacy;
        let before = self.results.len();
        self.run_start = self.results.watermark();
        // Legacy mode lets the resized image replace the source for the
        // executors that follow it.
        let mut working = source.image().clone();

        for kind in self.plan.active_kinds() {
            if legacy && kind == TransformKind::Equalize {
                debug!("legacy mode: equalize is configured but never run");
                continue;
            }

            let mut replacement: Option<DynamicImage> = None;
            let frame = Frame::new(&working, labels.as_deref());
            let outcome = match kind {
                TransformKind::Resize => match &self.plan.resize {
                    Some(params) => transform::resize::apply(frame, params).map(|(samples, out)| {
                        if legacy {
                            replacement = Some(out);
                        }
                        samples
                    }),
                    None => continue,
                },
                TransformKind::Flip => match &self.plan.flip {
                    Some(params) => transform::flip::apply(frame, params),
                    None => continue,
                },
                TransformKind::ContrastEnhance => match &self.plan.contrast {
                    Some(params) => transform::contrast::apply(
                        frame,
                        params,
                        &mut self.sampler,
                        self.plan.compatibility,
                    ),
                    None => continue,
                },
                TransformKind::Equalize => transform::equalize::apply(frame),
                TransformKind::Scale => match &self.plan.scale {
                    Some(params) => transform::scale::apply(frame, params, &mut self.sampler),
                    None => continue,
                },
                TransformKind::Rotate => match &self.plan.rotate {
                    Some(params) => transform::rotate::apply(frame, params, &mut self.sampler),
                    None => continue,
                },
            };

            match outcome {
                Ok(samples) => {
                    debug!(%kind, produced = samples.len(), "Executor finished");
                    self.results.append(kind, samples);
                }
                Err(err) => {
                    warn!(%kind, error = %err, "Executor failed; skipping its outputs");
                    self.results.record_failure(kind, &err);
                }
            }
            if let Some(image) = replacement {
                working = image;
            }
        }

        info!(
            produced = self.results.len() - before,
            expected = self.plan.expected_outputs(),
            "Augmentation complete"
        );
        self.source = Some(source);
        &self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bildwerk_core::config::{
        ContrastParams, FlipParams, ResizeParams, RotateParams, ScaleParams, TransformSpec,
    };
    use bildwerk_core::types::FlipAxis;
    use image::{GrayImage, Luma};

    fn white_png(dir: &Path, name: &str, width: u32, height: u32) -> std::path::PathBuf {
        let path = dir.join(name);
        GrayImage::from_pixel(width, height, Luma([255]))
            .save(&path)
            .expect("save");
        path
    }

    fn white_source(width: u32, height: u32) -> SourceImage {
        SourceImage::from_dynamic(
            DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([255]))),
            true,
        )
    }

    fn resize_64() -> TransformSpec {
        TransformSpec::Resize(ResizeParams { width: 64, height: 64 })
    }

    #[test]
    fn resize_only_scenario() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = white_png(dir.path(), "white.png", 100, 100);
        let mut augmenter = Augmenter::new(&AugmentConfig::default().with(resize_64())).expect("new");

        let results = augmenter.perform(&path, None).expect("perform");
        assert_eq!(results.bucket_names(), vec!["resized"]);
        let resized = results.bucket("resized").expect("bucket");
        assert_eq!(resized.len(), 1);
        assert_eq!(resized[0].image.dimensions(), (64, 64));
        assert!(resized[0].labels.is_none());
    }

    #[test]
    fn flip_scenario() {
        let config = AugmentConfig::default().with(TransformSpec::Flip(FlipParams {
            axes: vec![FlipAxis::from(1)],
        }));
        let mut augmenter = Augmenter::new(&config).expect("new");
        let results =
            augmenter.perform_image(white_source(10, 10), Some(vec![NormalizedLabel::new(0.2, 0.3)]));

        let flipped = results.bucket("flipped").expect("bucket");
        assert_eq!(flipped.len(), 1);
        let label = flipped[0].labels.as_ref().expect("labels")[0];
        assert!((label.x - 0.8).abs() < 1e-6);
        assert_eq!(label.y, 0.3);
    }

    #[test]
    fn scale_scenario() {
        let config = AugmentConfig::default().with(TransformSpec::Scale(ScaleParams {
            factors: vec![0.5],
            randomize: false,
        }));
        let mut augmenter = Augmenter::new(&config).expect("new");
        let results =
            augmenter.perform_image(white_source(100, 100), Some(vec![NormalizedLabel::new(0.5, 0.5)]));

        let scaled = results.bucket("scaled").expect("bucket");
        assert_eq!(scaled.len(), 1);
        let image = &scaled[0].image;
        assert_eq!(image.dimensions(), (100, 100));
        assert_eq!(image.get_pixel(50, 50).0, [255, 255, 255]);
        assert_eq!(image.get_pixel(24, 50).0, [0, 0, 0]);
        assert_eq!(image.get_pixel(75, 75).0, [0, 0, 0]);
        assert_eq!(
            scaled[0].labels.as_deref(),
            Some(&[NormalizedLabel::new(0.25, 0.25)][..])
        );
    }

    #[test]
    fn every_executor_runs_in_order() {
        let config = AugmentConfig::default()
            .with(TransformSpec::Rotate(RotateParams {
                degrees: vec![15.0],
                randomize: false,
                remap_labels: false,
            }))
            .with(TransformSpec::Equalize)
            .with(resize_64())
            .with(TransformSpec::Scale(ScaleParams {
                factors: vec![0.5, 1.5],
                randomize: true,
            }))
            .with(TransformSpec::ContrastEnhance(ContrastParams {
                clip_limits: vec![2.0],
                randomize: false,
            }))
            .with(TransformSpec::Flip(FlipParams {
                axes: vec![FlipAxis::Horizontal, FlipAxis::Vertical],
            }))
            .with_seed(1);
        let mut augmenter = Augmenter::new(&config).expect("new");
        let expected = augmenter.expected_outputs();
        let results = augmenter.perform_image(white_source(40, 30), None);

        assert_eq!(
            results.bucket_names(),
            vec!["resized", "flipped", "contrast_enhanced", "equalized", "scaled", "rotated"]
        );
        assert_eq!(results.len(), expected);
        // Every executor read the original 40x30 source, not the resized one.
        assert_eq!(results.bucket("rotated").expect("rotated")[0].image.dimensions(), (40, 30));
    }

    #[test]
    fn corrected_mode_resets_between_runs() {
        let mut augmenter = Augmenter::new(&AugmentConfig::default().with(resize_64())).expect("new");
        augmenter.perform_image(white_source(10, 10), None);
        let results = augmenter.perform_image(white_source(10, 10), None);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn legacy_mode_accumulates_and_reset_clears() {
        let config = AugmentConfig::default()
            .with(resize_64())
            .with_compatibility(Compatibility::Legacy);
        let mut augmenter = Augmenter::new(&config).expect("new");
        augmenter.perform_image(white_source(10, 10), None);
        let results = augmenter.perform_image(white_source(10, 10), None);
        assert_eq!(results.bucket("resized").map(<[_]>::len), Some(2));

        augmenter.reset();
        assert!(augmenter.results().is_empty());
    }

    #[test]
    fn latest_results_skip_earlier_legacy_runs() {
        let config = AugmentConfig::default()
            .with(resize_64())
            .with_compatibility(Compatibility::Legacy);
        let mut augmenter = Augmenter::new(&config).expect("new");
        augmenter.perform_image(white_source(10, 10), None);
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(10, 10, Luma([40])));
        augmenter.perform_image(SourceImage::from_dynamic(gray, true), None);

        assert_eq!(augmenter.results().len(), 2);
        let latest = augmenter.latest_results();
        let resized = latest.bucket("resized").expect("resized");
        assert_eq!(resized.len(), 1);
        assert_eq!(resized[0].image.get_pixel(0, 0).0, [40, 40, 40]);

        let dir = tempfile::tempdir().expect("tempdir");
        augmenter.perform(dir.path().join("missing.png"), None).expect("silent skip");
        assert!(augmenter.latest_results().is_empty());
        assert_eq!(augmenter.results().len(), 2);
    }

    #[test]
    fn legacy_mode_quirks() {
        let config = AugmentConfig::default()
            .with(resize_64())
            .with(TransformSpec::Equalize)
            .with(TransformSpec::Scale(ScaleParams {
                factors: vec![0.5],
                randomize: false,
            }))
            .with(TransformSpec::ContrastEnhance(ContrastParams {
                clip_limits: vec![2.0],
                randomize: false,
            }))
            .with_compatibility(Compatibility::Legacy);
        let mut augmenter = Augmenter::new(&config).expect("new");
        let results = augmenter.perform_image(white_source(100, 100), None);

        // Equalize never runs and contrast without randomize emits nothing.
        assert_eq!(results.bucket_names(), vec!["resized", "scaled"]);
        // Scale read the resized 64x64 image.
        assert_eq!(results.bucket("scaled").expect("scaled")[0].image.dimensions(), (64, 64));
    }

    #[test]
    fn missing_source_corrected_vs_legacy() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("missing.png");

        let mut corrected = Augmenter::new(&AugmentConfig::default().with(resize_64())).expect("new");
        let err = corrected.perform(&missing, None).unwrap_err();
        assert!(matches!(err, BildwerkError::SourceNotFound { .. }));

        let legacy_config = AugmentConfig::default()
            .with(resize_64())
            .with_compatibility(Compatibility::Legacy);
        let mut legacy = Augmenter::new(&legacy_config).expect("new");
        let results = legacy.perform(&missing, None).expect("silent skip");
        assert!(results.is_empty());
    }

    #[test]
    fn failing_executor_does_not_stop_the_rest() {
        let config = AugmentConfig::default()
            .with(TransformSpec::Scale(ScaleParams {
                factors: vec![0.5, 0.01],
                randomize: false,
            }))
            .with(TransformSpec::Flip(FlipParams {
                axes: vec![FlipAxis::Horizontal],
            }))
            .with(TransformSpec::Rotate(RotateParams {
                degrees: vec![10.0],
                randomize: false,
                remap_labels: false,
            }));
        let mut augmenter = Augmenter::new(&config).expect("new");
        let results = augmenter.perform_image(white_source(20, 20), None);

        // The 0.01 factor collapses a 20px side, so scale contributes nothing.
        assert!(results.bucket("scaled").is_none());
        assert_eq!(results.bucket_names(), vec!["flipped", "rotated"]);
        assert_eq!(results.failures().len(), 1);
        assert_eq!(results.failures()[0].kind, TransformKind::Scale);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let config = AugmentConfig::default()
            .with(TransformSpec::Rotate(RotateParams {
                degrees: vec![-30.0, 30.0],
                randomize: true,
                remap_labels: true,
            }))
            .with_seed(99);
        let labels = Some(vec![NormalizedLabel::new(0.9, 0.1)]);

        let mut a = Augmenter::new(&config).expect("new");
        let mut b = Augmenter::new(&config).expect("new");
        let first = a.perform_image(white_source(16, 16), labels.clone()).clone();
        let second = b.perform_image(white_source(16, 16), labels);
        assert_eq!(first.bucket("rotated"), second.bucket("rotated"));
    }

    #[test]
    fn source_is_kept_after_run() {
        let mut augmenter = Augmenter::new(&AugmentConfig::default()).expect("new");
        assert!(augmenter.source().is_none());
        let results = augmenter.perform_image(white_source(3, 4), None);
        assert!(results.is_empty());
        assert_eq!(augmenter.source().map(|s| (s.width(), s.height())), Some((3, 4)));
    }
}
