// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bildwerk — command-line image augmentation.
//
// Entry point. Initialises logging, reads the transform configuration and
// optional labels, then augments each input image and exports the results.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::Parser;

use bildwerk_augment::export::save_previews;
use bildwerk_augment::{Augmenter, CsvExporter};
use bildwerk_core::types::NormalizedLabel;
use bildwerk_core::{AugmentConfig, Compatibility};

/// Generate augmented variants of images, keeping point labels consistent.
#[derive(Debug, Parser)]
#[command(name = "bildwerk", version, about)]
struct Cli {
    /// Transform configuration (JSON mapping or typed form).
    #[arg(short, long)]
    config: PathBuf,

    /// Directory for augmented images.
    #[arg(short, long, default_value = "augmented")]
    output: PathBuf,

    /// Manifest to append rows to. Defaults to `<output>/output.csv`.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// JSON object mapping image file names to `[[x, y], ...]` labels.
    #[arg(short, long)]
    labels: Option<PathBuf>,

    /// Also write label overlay previews to `<output>/preview`.
    #[arg(long)]
    preview: bool,

    /// Seed for randomized parameters (overrides the configuration).
    #[arg(long)]
    seed: Option<u64>,

    /// Use legacy-compatible behavior (see `Compatibility::Legacy`).
    #[arg(long)]
    legacy: bool,

    /// Input images.
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    tracing::info!(images = cli.images.len(), "Bildwerk starting");
    run(&cli)
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut config = AugmentConfig::from_json_file(&cli.config)
        .with_context(|| format!("reading configuration {}", cli.config.display()))?;
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if cli.legacy {
        config.compatibility = Compatibility::Legacy;
    }

    let labels = match &cli.labels {
        Some(path) => read_labels(path)?,
        None => HashMap::new(),
    };

    let mut augmenter = Augmenter::new(&config).context("resolving configuration")?;
    let manifest = cli
        .csv
        .clone()
        .unwrap_or_else(|| cli.output.join("output.csv"));
    let mut exporter = CsvExporter::new(&cli.output, manifest);

    let mut failed = 0usize;
    for image in &cli.images {
        if let Err(err) = augment_one(cli, &mut augmenter, &mut exporter, &labels, image) {
            tracing::error!(image = %image.display(), error = %format!("{err:#}"), "image failed");
            failed += 1;
        }
    }

    tracing::info!(
        images = cli.images.len(),
        failed,
        rows = exporter.next_index(),
        "Bildwerk finished"
    );
    if failed > 0 {
        bail!("{failed} of {} images failed", cli.images.len());
    }
    Ok(())
}

fn augment_one(
    cli: &Cli,
    augmenter: &mut Augmenter,
    exporter: &mut CsvExporter,
    labels: &HashMap<String, Vec<NormalizedLabel>>,
    image: &Path,
) -> anyhow::Result<()> {
    let image_labels = image
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| labels.get(name))
        .cloned();

    augmenter.perform(image, image_labels)?;
    // Legacy runs accumulate; only this image's outputs are exported.
    let results = augmenter.latest_results();
    for failure in results.failures() {
        tracing::warn!(kind = %failure.kind, reason = %failure.message, "transform skipped");
    }

    exporter.export(&results, image)?;
    if cli.preview {
        let stem = image
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image");
        save_previews(&results, &cli.output.join("preview"), stem)?;
    }
    Ok(())
}

/// Read `{"name.png": [[x, y], ...], ...}`.
fn read_labels(path: &Path) -> anyhow::Result<HashMap<String, Vec<NormalizedLabel>>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading labels {}", path.display()))?;
    parse_labels(&text).with_context(|| format!("parsing labels {}", path.display()))
}

fn parse_labels(text: &str) -> anyhow::Result<HashMap<String, Vec<NormalizedLabel>>> {
    let raw: HashMap<String, Vec<[f32; 2]>> = serde_json::from_str(text)?;
    Ok(raw
        .into_iter()
        .map(|(name, points)| (name, points.into_iter().map(NormalizedLabel::from).collect()))
        .collect())
}
