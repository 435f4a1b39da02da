// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// CSV exporter — writes every collected sample as a JPEG next to an
// append-only manifest of `index,filename,label,...` rows.

use std::borrow::Cow;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::types::NormalizedLabel;
use tracing::{debug, info, instrument};

use crate::collector::ResultCollector;

/// Persists collected samples. The row index keeps counting across calls
/// for the lifetime of the exporter.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    output_dir: PathBuf,
    manifest: PathBuf,
    next_index: usize,
}

impl CsvExporter {
    /// Images go to `output_dir`; rows are appended to `manifest`.
    pub fn new(output_dir: impl Into<PathBuf>, manifest: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            manifest: manifest.into(),
            next_index: 0,
        }
    }

    /// Index the next written row will get.
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    pub fn manifest(&self) -> &Path {
        &self.manifest
    }

    /// Write every sample in `results` as `<stem>_<bucket><i>.jpg`, where
    /// `stem` is the source file name without extension and `i` the
    /// sample's position in its bucket. Returns the written image paths.
    #[instrument(skip(self, results), fields(samples = results.len()))]
    pub fn export(&mut self, results: &ResultCollector, source: &Path) -> Result<Vec<PathBuf>> {
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                BildwerkError::ImageError(format!(
                    "cannot derive an output name from {}",
                    source.display()
                ))
            })?;

        std::fs::create_dir_all(&self.output_dir)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.manifest)?;
        let mut rows = BufWriter::new(file);

        let mut written = Vec::with_capacity(results.len());
        for (bucket, samples) in results.iter() {
            for (i, sample) in samples.iter().enumerate() {
                let filename = format!("{stem}_{bucket}{i}.jpg");
                let path = self.output_dir.join(&filename);
                sample.image.save(&path).map_err(|err| {
                    BildwerkError::ImageError(format!(
                        "failed to save image to {}: {}",
                        path.display(),
                        err
                    ))
                })?;
                writeln!(
                    rows,
                    "{}",
                    format_row(self.next_index, &filename, sample.labels.as_deref())
                )?;
                debug!(index = self.next_index, file = %filename, "Sample exported");
                self.next_index += 1;
                written.push(path);
            }
        }
        rows.flush()?;

        info!(
            written = written.len(),
            manifest = %self.manifest.display(),
            "Export complete"
        );
        Ok(written)
    }
}

/// `index,filename` followed by one `x;y` column per label.
pub fn format_row(index: usize, filename: &str, labels: Option<&[NormalizedLabel]>) -> String {
    let mut row = format!("{index},{}", quote_field(filename));
    for label in labels.unwrap_or_default() {
        row.push_str(&format!(",{};{}", label.x, label.y));
    }
    row
}

/// Wrap `field` in double quotes, doubling inner quotes, when it cannot
/// stand as a bare CSV field.
fn quote_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::AugmentedSample;
    use bildwerk_core::types::TransformKind;
    use image::{DynamicImage, GrayImage, Luma};

    fn sample(labels: Option<Vec<NormalizedLabel>>) -> AugmentedSample {
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([128])));
        AugmentedSample::from_dynamic(&image, labels)
    }

    #[test]
    fn row_format() {
        assert_eq!(format_row(3, "a_resized0.jpg", None), "3,a_resized0.jpg");
        let labels = [NormalizedLabel::new(0.5, 0.25), NormalizedLabel::new(1.0, 0.0)];
        assert_eq!(
            format_row(0, "a_flipped1.jpg", Some(&labels)),
            "0,a_flipped1.jpg,0.5;0.25,1;0"
        );
    }

    #[test]
    fn filenames_with_delimiters_are_quoted() {
        let labels = [NormalizedLabel::new(0.5, 0.5)];
        assert_eq!(
            format_row(1, "a,b_resized0.jpg", Some(&labels)),
            "1,\"a,b_resized0.jpg\",0.5;0.5"
        );
        assert_eq!(
            format_row(2, "say \"hi\"_resized0.jpg", None),
            "2,\"say \"\"hi\"\"_resized0.jpg\""
        );
    }

    #[test]
    fn export_writes_images_and_appends_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("out");
        let manifest = dir.path().join("output.csv");

        let mut results = ResultCollector::new();
        results.push(TransformKind::Resize, sample(None));
        results.push(TransformKind::Flip, sample(Some(vec![NormalizedLabel::new(0.8, 0.3)])));
        results.push(TransformKind::Flip, sample(None));

        let mut exporter = CsvExporter::new(&out, &manifest);
        let written = exporter
            .export(&results, Path::new("/data/lena.png"))
            .expect("export");
        assert_eq!(written.len(), 3);
        assert!(out.join("lena_resized0.jpg").exists());
        assert!(out.join("lena_flipped0.jpg").exists());
        assert!(out.join("lena_flipped1.jpg").exists());

        // A second image keeps counting rows.
        exporter
            .export(&results, Path::new("other.png"))
            .expect("export again");
        assert_eq!(exporter.next_index(), 6);

        let text = std::fs::read_to_string(&manifest).expect("read manifest");
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "0,lena_resized0.jpg");
        assert_eq!(lines[1], "1,lena_flipped0.jpg,0.8;0.3");
        assert_eq!(lines[5], "5,other_flipped1.jpg");
    }
}
