// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Source image loading. Every source is normalized to 8-bit samples, either
// single-channel luma or RGB, before any transform sees it.

use std::path::{Path, PathBuf};

use bildwerk_core::error::{BildwerkError, Result};
use image::DynamicImage;
use tracing::{debug, info, instrument};

/// The decoded input image all executors read from.
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// Where the image was loaded from, if it came from disk.
    path: Option<PathBuf>,
    image: DynamicImage,
}

impl SourceImage {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path, as grayscale when `gray` is set.
    ///
    /// A missing path is [`BildwerkError::SourceNotFound`]; a file that
    /// exists but cannot be decoded is [`BildwerkError::ImageError`].
    #[instrument(skip_all, fields(path = %path.as_ref().display(), gray))]
    pub fn load(path: impl AsRef<Path>, gray: bool) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(BildwerkError::SourceNotFound {
                path: path.to_path_buf(),
            });
        }
        let image = image::open(path).map_err(|err| {
            BildwerkError::ImageError(format!("failed to open {}: {}", path.display(), err))
        })?;
        info!(
            width = image.width(),
            height = image.height(),
            "Source image loaded"
        );
        Ok(Self {
            path: Some(path.to_path_buf()),
            image: normalize(image, gray),
        })
    }

    /// Wrap an already-decoded image.
    pub fn from_dynamic(image: DynamicImage, gray: bool) -> Self {
        Self {
            path: None,
            image: normalize(image, gray),
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_gray(&self) -> bool {
        matches!(self.image, DynamicImage::ImageLuma8(_))
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }
}

fn normalize(image: DynamicImage, gray: bool) -> DynamicImage {
    match (gray, image) {
        (true, img @ DynamicImage::ImageLuma8(_)) => img,
        (false, img @ DynamicImage::ImageRgb8(_)) => img,
        (true, other) => {
            debug!(color = ?other.color(), "Converting source to luma8");
            DynamicImage::ImageLuma8(other.to_luma8())
        }
        (false, other) => {
            debug!(color = ?other.color(), "Converting source to rgb8");
            DynamicImage::ImageRgb8(other.to_rgb8())
        }
    }
}
