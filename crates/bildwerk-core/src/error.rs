// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Bildwerk.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::TransformKind;

/// Top-level error type for all Bildwerk operations.
#[derive(Debug, Error)]
pub enum BildwerkError {
    // -- Source errors --
    #[error("source image not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Configuration errors --
    #[error("invalid configuration: {0}")]
    Configuration(String),

    // -- Transform errors --
    #[error("{kind} transform failed: {reason}")]
    Transform { kind: TransformKind, reason: String },

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BildwerkError {
    /// Shorthand for a [`BildwerkError::Transform`] raised by `kind`.
    pub fn transform(kind: TransformKind, reason: impl Into<String>) -> Self {
        Self::Transform {
            kind,
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`BildwerkError::Configuration`].
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Configuration(reason.into())
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BildwerkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_error_names_the_kind() {
        let err = BildwerkError::transform(TransformKind::Scale, "content is zero-sized");
        assert_eq!(err.to_string(), "scale transform failed: content is zero-sized");
    }

    #[test]
    fn source_not_found_shows_path() {
        let err = BildwerkError::SourceNotFound {
            path: PathBuf::from("/tmp/missing.png"),
        };
        assert!(err.to_string().contains("/tmp/missing.png"));
    }
}
