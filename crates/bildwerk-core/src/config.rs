// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Augmentation configuration.
//
// The typed form is a list of tagged transform variants. The loose mapping
// form (`{"resize": [128, 128], "clahe": [[1, 2], true], ...}`) used by
// existing configuration files is parsed into the same typed structure by
// `AugmentConfig::from_mapping`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{BildwerkError, Result};
use crate::types::{FlipAxis, TransformKind};

/// Which behavior set the pipeline follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compatibility {
    /// Documented, corrected behavior.
    #[default]
    Corrected,
    /// Behavior existing label sets were produced with: missing files are
    /// skipped silently, contrast emits only when randomized, scale needs
    /// equalize, equalize never runs, results accumulate across runs, and
    /// the resized image feeds later transforms.
    Legacy,
}

/// Target size for the resize transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeParams {
    pub width: u32,
    pub height: u32,
}

/// Flip axes; one output per entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlipParams {
    pub axes: Vec<FlipAxis>,
}

/// CLAHE clip limits; one output per entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContrastParams {
    pub clip_limits: Vec<f32>,
    /// Draw each effective clip from `[clip - 1, clip]`.
    #[serde(default)]
    pub randomize: bool,
}

/// Scale factors; one output per entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleParams {
    pub factors: Vec<f32>,
    /// Draw each effective factor between the configured one and `1.0`.
    #[serde(default)]
    pub randomize: bool,
}

/// Rotation bounds in degrees; one output per entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotateParams {
    pub degrees: Vec<f32>,
    /// Draw each effective angle between `0` and the configured bound.
    #[serde(default)]
    pub randomize: bool,
    /// Rotate labels about the image center along with the image. Off by
    /// default: labels pass through a rotation unchanged.
    #[serde(default)]
    pub remap_labels: bool,
}

/// One requested transform with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformSpec {
    Resize(ResizeParams),
    Flip(FlipParams),
    ContrastEnhance(ContrastParams),
    Equalize,
    Scale(ScaleParams),
    Rotate(RotateParams),
}

impl TransformSpec {
    pub fn kind(&self) -> TransformKind {
        match self {
            Self::Resize(_) => TransformKind::Resize,
            Self::Flip(_) => TransformKind::Flip,
            Self::ContrastEnhance(_) => TransformKind::ContrastEnhance,
            Self::Equalize => TransformKind::Equalize,
            Self::Scale(_) => TransformKind::Scale,
            Self::Rotate(_) => TransformKind::Rotate,
        }
    }
}

/// Full pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentConfig {
    /// Requested transforms. Order is irrelevant; the pipeline runs kinds in
    /// a fixed order and each kind may appear at most once.
    #[serde(default)]
    pub transforms: Vec<TransformSpec>,
    /// Load sources as single-channel grayscale.
    #[serde(default = "default_gray")]
    pub gray: bool,
    #[serde(default)]
    pub compatibility: Compatibility,
    /// Seed for randomized parameter draws. `None` seeds from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_gray() -> bool {
    true
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            transforms: Vec::new(),
            gray: true,
            compatibility: Compatibility::Corrected,
            seed: None,
        }
    }
}

impl AugmentConfig {
    /// Add a transform (builder style).
    pub fn with(mut self, spec: TransformSpec) -> Self {
        self.transforms.push(spec);
        self
    }

    pub fn with_compatibility(mut self, compatibility: Compatibility) -> Self {
        self.compatibility = compatibility;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Read a configuration file. A JSON object with a `transforms` key is
    /// read as the typed form; anything else as the loose mapping form.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let value: Value = serde_json::from_str(&text)?;
        if value.get("transforms").is_some() {
            debug!("reading typed configuration");
            Ok(serde_json::from_value(value)?)
        } else {
            debug!("reading mapping configuration");
            Self::from_mapping(&value)
        }
    }

    /// Build a configuration from the loose key/parameter mapping.
    ///
    /// Recognized transform keys: `resize` (`[w, h]`), `flip` (`[codes]`),
    /// `contrast_enhance` or `clahe` (`[[clips], randomize]`), `equalize` or
    /// `equilize` (any value), `scale` (`[[factors], randomize]`) and `rotate`
    /// (`[[degrees], randomize]`, optional third element `remap_labels`).
    /// `gray`, `seed` and `compatibility` set the pipeline-wide fields.
    /// Unrecognized keys are ignored.
    pub fn from_mapping(value: &Value) -> Result<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| BildwerkError::config("configuration must be a JSON object"))?;

        let mut config = Self::default();
        for (key, params) in map {
            let spec = match key.as_str() {
                "resize" => {
                    let size = number_list(key, params)?;
                    let [width, height] = size[..] else {
                        return Err(BildwerkError::config(format!(
                            "`{key}` expects [width, height], got {} values",
                            size.len()
                        )));
                    };
                    TransformSpec::Resize(ResizeParams {
                        width: dimension(key, width)?,
                        height: dimension(key, height)?,
                    })
                }
                "flip" => {
                    let codes = params.as_array().ok_or_else(|| {
                        BildwerkError::config(format!("`{key}` expects a list of axis codes"))
                    })?;
                    let axes = codes
                        .iter()
                        .map(|code| {
                            code.as_i64()
                                .and_then(|c| i32::try_from(c).ok())
                                .map(FlipAxis::from)
                                .ok_or_else(|| {
                                    BildwerkError::config(format!(
                                        "`{key}` axis code must be an integer, got {code}"
                                    ))
                                })
                        })
                        .collect::<Result<Vec<_>>>()?;
                    TransformSpec::Flip(FlipParams { axes })
                }
                "contrast_enhance" | "clahe" => {
                    let (clip_limits, randomize, _) = values_with_flags(key, params, 2)?;
                    TransformSpec::ContrastEnhance(ContrastParams {
                        clip_limits,
                        randomize,
                    })
                }
                "equalize" | "equilize" => TransformSpec::Equalize,
                "scale" => {
                    let (factors, randomize, _) = values_with_flags(key, params, 2)?;
                    TransformSpec::Scale(ScaleParams { factors, randomize })
                }
                "rotate" => {
                    let (degrees, randomize, remap_labels) = values_with_flags(key, params, 3)?;
                    TransformSpec::Rotate(RotateParams {
                        degrees,
                        randomize,
                        remap_labels: remap_labels.unwrap_or(false),
                    })
                }
                "gray" => {
                    config.gray = truthy(key, params)?;
                    continue;
                }
                "seed" => {
                    config.seed = Some(params.as_u64().ok_or_else(|| {
                        BildwerkError::config("`seed` must be a non-negative integer")
                    })?);
                    continue;
                }
                "compatibility" => {
                    config.compatibility = serde_json::from_value(params.clone())?;
                    continue;
                }
                other => {
                    debug!(key = other, "ignoring unrecognized configuration key");
                    continue;
                }
            };
            config.transforms.push(spec);
        }

        Ok(config)
    }
}

// -- Mapping helpers ----------------------------------------------------------

fn number_list(key: &str, value: &Value) -> Result<Vec<f64>> {
    let items = value
        .as_array()
        .ok_or_else(|| BildwerkError::config(format!("`{key}` expects a list of numbers")))?;
    items
        .iter()
        .map(|item| {
            item.as_f64().ok_or_else(|| {
                BildwerkError::config(format!("`{key}` expects numbers, got {item}"))
            })
        })
        .collect()
}

fn dimension(key: &str, value: f64) -> Result<u32> {
    if value.fract() != 0.0 || value < 0.0 || value > u32::MAX as f64 {
        return Err(BildwerkError::config(format!(
            "`{key}` dimensions must be non-negative integers, got {value}"
        )));
    }
    Ok(value as u32)
}

fn truthy(key: &str, value: &Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|v| v != 0.0)),
        other => Err(BildwerkError::config(format!(
            "`{key}` expects a boolean, got {other}"
        ))),
    }
}

/// Parse `[[values...], randomize]` with up to `max_len - 2` extra trailing
/// boolean flags (only one is ever used).
fn values_with_flags(
    key: &str,
    value: &Value,
    max_len: usize,
) -> Result<(Vec<f32>, bool, Option<bool>)> {
    let parts = value.as_array().ok_or_else(|| {
        BildwerkError::config(format!("`{key}` expects [[values], randomize]"))
    })?;
    if parts.len() < 2 || parts.len() > max_len {
        return Err(BildwerkError::config(format!(
            "`{key}` expects [[values], randomize], got {} elements",
            parts.len()
        )));
    }
    let values = number_list(key, &parts[0])?
        .into_iter()
        .map(|v| v as f32)
        .collect();
    let randomize = truthy(key, &parts[1])?;
    let extra = parts.get(2).map(|flag| truthy(key, flag)).transpose()?;
    Ok((values, randomize, extra))
}
