// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Configuration resolver — validates the requested transform set once, marks
// each kind active, and precomputes the advisory expected output count.

use std::collections::HashSet;

use bildwerk_core::config::{
    AugmentConfig, Compatibility, ContrastParams, FlipParams, ResizeParams, RotateParams,
    ScaleParams, TransformSpec,
};
use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::types::TransformKind;
use tracing::{debug, info, instrument};

/// A validated configuration with one slot per transform kind.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentPlan {
    pub resize: Option<ResizeParams>,
    pub flip: Option<FlipParams>,
    pub contrast: Option<ContrastParams>,
    pub equalize: bool,
    pub scale: Option<ScaleParams>,
    pub rotate: Option<RotateParams>,
    pub gray: bool,
    pub compatibility: Compatibility,
    pub seed: Option<u64>,
    expected_outputs: usize,
}

impl AugmentPlan {
    /// Validate `config` and resolve it into a plan.
    ///
    /// Fails with [`BildwerkError::Configuration`] on duplicate kinds,
    /// zero resize dimensions, non-finite parameters, or non-positive scale
    /// factors.
    #[instrument(skip_all, fields(transforms = config.transforms.len()))]
    pub fn resolve(config: &AugmentConfig) -> Result<Self> {
        let mut plan = Self {
            resize: None,
            flip: None,
            contrast: None,
            equalize: false,
            scale: None,
            rotate: None,
            gray: config.gray,
            compatibility: config.compatibility,
            seed: config.seed,
            expected_outputs: 0,
        };

        let mut seen = HashSet::new();
        for spec in &config.transforms {
            let kind = spec.kind();
            if !seen.insert(kind) {
                return Err(BildwerkError::config(format!(
                    "transform `{kind}` is configured more than once"
                )));
            }
            validate(spec)?;
            match spec {
                TransformSpec::Resize(p) => plan.resize = Some(*p),
                TransformSpec::Flip(p) => plan.flip = Some(p.clone()),
                TransformSpec::ContrastEnhance(p) => plan.contrast = Some(p.clone()),
                TransformSpec::Equalize => plan.equalize = true,
                TransformSpec::Scale(p) => plan.scale = Some(p.clone()),
                TransformSpec::Rotate(p) => plan.rotate = Some(p.clone()),
            }
        }

        if plan.compatibility == Compatibility::Legacy && !plan.equalize && plan.scale.is_some() {
            // Legacy configs only enable scale alongside equalize.
            debug!("legacy mode: scale is inactive without equalize");
            plan.scale = None;
        }

        plan.expected_outputs = plan.count_expected();
        info!(
            expected = plan.expected_outputs,
            active = ?plan.active_kinds(),
            compatibility = ?plan.compatibility,
            "expected augmentations"
        );
        Ok(plan)
    }

    /// Advisory count of outputs per image. Not a guarantee: randomization,
    /// legacy quirks and executor failures can change the produced count.
    pub fn expected_outputs(&self) -> usize {
        self.expected_outputs
    }

    pub fn is_active(&self, kind: TransformKind) -> bool {
        match kind {
            TransformKind::Resize => self.resize.is_some(),
            TransformKind::Flip => self.flip.is_some(),
            TransformKind::ContrastEnhance => self.contrast.is_some(),
            TransformKind::Equalize => self.equalize,
            TransformKind::Scale => self.scale.is_some(),
            TransformKind::Rotate => self.rotate.is_some(),
        }
    }

    /// Active kinds in execution order.
    pub fn active_kinds(&self) -> Vec<TransformKind> {
        TransformKind::ALL
            .into_iter()
            .filter(|kind| self.is_active(*kind))
            .collect()
    }

    fn count_expected(&self) -> usize {
        match self.compatibility {
            // One per active key, except the multi-valued contrast and scale
            // (scale is already gated on equalize at this point). Rotate is
            // never counted.
            Compatibility::Legacy => {
                usize::from(self.resize.is_some())
                    + usize::from(self.flip.is_some())
                    + self.contrast.as_ref().map_or(0, |p| p.clip_limits.len())
                    + usize::from(self.equalize)
                    + self.scale.as_ref().map_or(0, |p| p.factors.len())
            }
            Compatibility::Corrected => {
                usize::from(self.resize.is_some())
                    + self.flip.as_ref().map_or(0, |p| p.axes.len())
                    + self.contrast.as_ref().map_or(0, |p| p.clip_limits.len())
                    + usize::from(self.equalize)
                    + self.scale.as_ref().map_or(0, |p| p.factors.len())
                    + self.rotate.as_ref().map_or(0, |p| p.degrees.len())
            }
        }
    }
}

fn validate(spec: &TransformSpec) -> Result<()> {
    let kind = spec.kind();
    match spec {
        TransformSpec::Resize(p) => {
            if p.width == 0 || p.height == 0 {
                return Err(BildwerkError::config(format!(
                    "`{kind}` target must be non-zero, got {}x{}",
                    p.width, p.height
                )));
            }
        }
        TransformSpec::Flip(_) | TransformSpec::Equalize => {}
        TransformSpec::ContrastEnhance(p) => all_finite(kind, &p.clip_limits)?,
        TransformSpec::Scale(p) => {
            all_finite(kind, &p.factors)?;
            if let Some(bad) = p.factors.iter().find(|f| **f <= 0.0) {
                return Err(BildwerkError::config(format!(
                    "`{kind}` factors must be positive, got {bad}"
                )));
            }
        }
        TransformSpec::Rotate(p) => all_finite(kind, &p.degrees)?,
    }
    Ok(())
}

fn all_finite(kind: TransformKind, values: &[f32]) -> Result<()> {
    match values.iter().find(|v| !v.is_finite()) {
        Some(bad) => Err(BildwerkError::config(format!(
            "`{kind}` parameters must be finite, got {bad}"
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bildwerk_core::types::FlipAxis;

    fn full_config() -> AugmentConfig {
        AugmentConfig::default()
            .with(TransformSpec::Resize(ResizeParams { width: 128, height: 128 }))
            .with(TransformSpec::Flip(FlipParams {
                axes: vec![FlipAxis::Horizontal, FlipAxis::Vertical],
            }))
            .with(TransformSpec::ContrastEnhance(ContrastParams {
                clip_limits: vec![1.0, 2.0, 3.0],
                randomize: true,
            }))
            .with(TransformSpec::Scale(ScaleParams {
                factors: vec![0.8, 1.2],
                randomize: true,
            }))
            .with(TransformSpec::Rotate(RotateParams {
                degrees: vec![-30.0, 30.0],
                randomize: true,
                remap_labels: false,
            }))
    }

    #[test]
    fn corrected_counts_every_output() {
        let plan = AugmentPlan::resolve(&full_config()).expect("resolve");
        // 1 resize + 2 flips + 3 clahe + 2 scales + 2 rotations
        assert_eq!(plan.expected_outputs(), 10);
        assert!(plan.is_active(TransformKind::Scale));
        assert!(!plan.is_active(TransformKind::Equalize));
    }

    #[test]
    fn legacy_scale_requires_equalize() {
        let config = full_config().with_compatibility(Compatibility::Legacy);
        let plan = AugmentPlan::resolve(&config).expect("resolve");
        assert!(!plan.is_active(TransformKind::Scale));
        // 1 resize + 1 flip + 3 clahe; rotate is not counted
        assert_eq!(plan.expected_outputs(), 5);

        let plan = AugmentPlan::resolve(&config.with(TransformSpec::Equalize)).expect("resolve");
        assert!(plan.is_active(TransformKind::Scale));
        // ... + 1 equalize + 2 scales
        assert_eq!(plan.expected_outputs(), 8);
    }

    #[test]
    fn active_kinds_in_execution_order() {
        let config = AugmentConfig::default()
            .with(TransformSpec::Equalize)
            .with(TransformSpec::Resize(ResizeParams { width: 4, height: 4 }));
        let plan = AugmentPlan::resolve(&config).expect("resolve");
        assert_eq!(
            plan.active_kinds(),
            vec![TransformKind::Resize, TransformKind::Equalize]
        );
    }

    #[test]
    fn duplicate_kind_rejected() {
        let config = AugmentConfig::default()
            .with(TransformSpec::Equalize)
            .with(TransformSpec::Equalize);
        let err = AugmentPlan::resolve(&config).unwrap_err();
        assert!(matches!(err, BildwerkError::Configuration(_)));
    }

    #[test]
    fn invalid_parameters_rejected() {
        let bad = [
            TransformSpec::Resize(ResizeParams { width: 0, height: 10 }),
            TransformSpec::Scale(ScaleParams {
                factors: vec![0.5, 0.0],
                randomize: false,
            }),
            TransformSpec::Rotate(RotateParams {
                degrees: vec![f32::NAN],
                randomize: false,
                remap_labels: false,
            }),
            TransformSpec::ContrastEnhance(ContrastParams {
                clip_limits: vec![f32::INFINITY],
                randomize: false,
            }),
        ];
        for spec in bad {
            let config = AugmentConfig::default().with(spec.clone());
            let err = AugmentPlan::resolve(&config).unwrap_err();
            assert!(
                matches!(err, BildwerkError::Configuration(_)),
                "{spec:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn empty_config_is_valid() {
        let plan = AugmentPlan::resolve(&AugmentConfig::default()).expect("resolve");
        assert_eq!(plan.expected_outputs(), 0);
        assert!(plan.active_kinds().is_empty());
    }
}
