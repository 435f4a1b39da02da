// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Result collector — insertion-ordered, append-only buckets of augmented
// samples keyed by transform kind, plus the per-run record of executors that
// failed.

use bildwerk_core::error::BildwerkError;
use bildwerk_core::types::{NormalizedLabel, TransformKind};
use image::{DynamicImage, RgbImage};

/// One produced output: the 3-channel image and its (possibly remapped)
/// labels.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedSample {
    pub image: RgbImage,
    pub labels: Option<Vec<NormalizedLabel>>,
}

impl AugmentedSample {
    /// Convert `image` to RGB and pair it with `labels`.
    pub fn from_dynamic(image: &DynamicImage, labels: Option<Vec<NormalizedLabel>>) -> Self {
        Self {
            image: image.to_rgb8(),
            labels,
        }
    }
}

/// An executor that produced nothing for an image because it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformFailure {
    pub kind: TransformKind,
    pub message: String,
}

/// Per-bucket sample counts and the failure count at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watermark {
    buckets: Vec<(TransformKind, usize)>,
    failures: usize,
}

/// Mapping from bucket name to the samples appended to it, in the order the
/// buckets first received a sample.
#[derive(Debug, Clone, Default)]
pub struct ResultCollector {
    buckets: Vec<(TransformKind, Vec<AugmentedSample>)>,
    failures: Vec<TransformFailure>,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `samples` to the bucket of `kind`. A bucket only comes into
    /// existence once it holds at least one sample.
    pub fn append(&mut self, kind: TransformKind, samples: impl IntoIterator<Item = AugmentedSample>) {
        for sample in samples {
            self.push(kind, sample);
        }
    }

    pub fn push(&mut self, kind: TransformKind, sample: AugmentedSample) {
        match self.buckets.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, samples)) => samples.push(sample),
            None => self.buckets.push((kind, vec![sample])),
        }
    }

    pub fn record_failure(&mut self, kind: TransformKind, err: &BildwerkError) {
        self.failures.push(TransformFailure {
            kind,
            message: err.to_string(),
        });
    }

    /// Samples for `kind`, if its bucket exists.
    pub fn get(&self, kind: TransformKind) -> Option<&[AugmentedSample]> {
        self.buckets
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, samples)| samples.as_slice())
    }

    /// Samples for a bucket by name (`"resized"`, `"flipped"`, ...).
    pub fn bucket(&self, name: &str) -> Option<&[AugmentedSample]> {
        self.buckets
            .iter()
            .find(|(k, _)| k.bucket() == name)
            .map(|(_, samples)| samples.as_slice())
    }

    /// Bucket names in insertion order.
    pub fn bucket_names(&self) -> Vec<&'static str> {
        self.buckets.iter().map(|(k, _)| k.bucket()).collect()
    }

    /// `(bucket name, samples)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[AugmentedSample])> {
        self.buckets
            .iter()
            .map(|(k, samples)| (k.bucket(), samples.as_slice()))
    }

    pub fn failures(&self) -> &[TransformFailure] {
        &self.failures
    }

    /// Total number of samples across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|(_, samples)| samples.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.failures.clear();
    }

    pub fn watermark(&self) -> Watermark {
        Watermark {
            buckets: self
                .buckets
                .iter()
                .map(|(kind, samples)| (*kind, samples.len()))
                .collect(),
            failures: self.failures.len(),
        }
    }

    /// Copy of the samples and failures added after `mark` was taken.
    pub fn since(&self, mark: &Watermark) -> ResultCollector {
        let mut out = ResultCollector::new();
        for (kind, samples) in &self.buckets {
            let seen = mark
                .buckets
                .iter()
                .find(|(k, _)| k == kind)
                .map_or(0, |(_, n)| *n);
            out.append(*kind, samples.iter().skip(seen).cloned());
        }
        out.failures = self.failures.iter().skip(mark.failures).cloned().collect();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn sample(value: u8) -> AugmentedSample {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(2, 2, Luma([value])));
        AugmentedSample::from_dynamic(&gray, None)
    }

    #[test]
    fn buckets_keep_first_insertion_order() {
        let mut results = ResultCollector::new();
        results.push(TransformKind::Scale, sample(1));
        results.push(TransformKind::Resize, sample(2));
        results.push(TransformKind::Scale, sample(3));

        assert_eq!(results.bucket_names(), vec!["scaled", "resized"]);
        assert_eq!(results.bucket("scaled").map(<[_]>::len), Some(2));
        assert_eq!(results.get(TransformKind::Resize).map(<[_]>::len), Some(1));
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn empty_append_creates_no_bucket() {
        let mut results = ResultCollector::new();
        results.append(TransformKind::Flip, Vec::new());
        assert!(results.bucket("flipped").is_none());
        assert!(results.is_empty());
    }

    #[test]
    fn gray_samples_become_rgb() {
        let s = sample(77);
        assert_eq!(s.image.get_pixel(0, 0).0, [77, 77, 77]);
    }

    #[test]
    fn clear_drops_buckets_and_failures() {
        let mut results = ResultCollector::new();
        results.push(TransformKind::Rotate, sample(0));
        results.record_failure(
            TransformKind::Scale,
            &BildwerkError::transform(TransformKind::Scale, "boom"),
        );
        assert_eq!(results.failures().len(), 1);
        results.clear();
        assert!(results.is_empty());
        assert!(results.failures().is_empty());
    }

    #[test]
    fn since_returns_only_later_additions() {
        let mut results = ResultCollector::new();
        results.push(TransformKind::Resize, sample(1));
        results.record_failure(
            TransformKind::Scale,
            &BildwerkError::transform(TransformKind::Scale, "first"),
        );
        let mark = results.watermark();

        results.push(TransformKind::Resize, sample(2));
        results.push(TransformKind::Flip, sample(3));
        let later = results.since(&mark);

        assert_eq!(later.bucket_names(), vec!["resized", "flipped"]);
        assert_eq!(later.bucket("resized"), Some(&[sample(2)][..]));
        assert!(later.failures().is_empty());
        assert_eq!(results.since(&results.watermark()).len(), 0);
        assert_eq!(results.since(&Watermark::default()).len(), 3);
    }
}
