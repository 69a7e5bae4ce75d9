//! Layer weight resolution.
//!
//! Quality functions scale with edge count in different ways, so the weight
//! a layer is declared with cannot be handed to the multiplex optimizer
//! as-is. This module turns declared weights and per-layer edge counts into
//! the coefficients the optimizer multiplies each layer's quality by.
//!
//! With `E_i` the edge count of layer `i`, `T = Σ E_i` and `d_i` the declared
//! weight:
//!
//! | Family | Normalized | Asymmetric negative (sign split, 2 layers) |
//! |--------|------------|-------------------------------------------|
//! | modularity | `d_i · E_i / T` | `(1, -E_1 / T)` |
//! | rbconfiguration, rber, cpm, surprise | `d_i / T` | `(1 / E_0, -1 / T)` |
//! | significance | `1 / T` | n/a |
//!
//! A single layer always resolves to `1`.
//!
//! Modularity is already normalized by each layer's own edge weight, so
//! the positive layer keeps weight 1 and the negative layer is shrunk to its
//! share of all edges. The unnormalized families instead divide the positive
//! layer by its own size and the negative layer by the total.

use crate::error::{Error, Result};
use crate::layers::SplittingMode;
use crate::quality::QualityFunction;

/// How declared layer weights are rescaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightPolicy {
    /// Declared weights normalized by the family rule.
    Normalized,
    /// Rebalance a sign split so a small negative layer is not swamped by
    /// (or does not swamp) a large positive one.
    #[default]
    AsymmetricNegative,
}

impl WeightPolicy {
    /// Policy selected by the `assymetric-negative` flag.
    pub fn from_flag(asymmetric_negative: bool) -> Self {
        if asymmetric_negative {
            WeightPolicy::AsymmetricNegative
        } else {
            WeightPolicy::Normalized
        }
    }
}

/// Resolve the per-layer coefficients.
///
/// `declared` and `edge_counts` are parallel, one entry per layer. The
/// asymmetric branch only applies to a two-layer [`SplittingMode::Sign`]
/// split; every other combination takes the normalized branch.
///
/// A network whose layers carry no edges at all resolves to zero weights,
/// and in the asymmetric branch an empty positive layer gets weight zero.
pub fn resolve(
    quality: QualityFunction,
    declared: &[f64],
    edge_counts: &[usize],
    mode: SplittingMode,
    policy: WeightPolicy,
) -> Result<Vec<f64>> {
    if declared.is_empty() {
        return Err(Error::EmptyInput);
    }
    if declared.len() != edge_counts.len() {
        return Err(Error::DimensionMismatch {
            expected: declared.len(),
            found: edge_counts.len(),
        });
    }
    if declared.len() == 1 {
        return Ok(vec![1.0]);
    }

    let total = edge_counts.iter().sum::<usize>() as f64;
    if total == 0.0 {
        return Ok(vec![0.0; declared.len()]);
    }

    let asymmetric = policy == WeightPolicy::AsymmetricNegative
        && mode == SplittingMode::Sign
        && declared.len() == 2;

    let weights = match quality {
        QualityFunction::Modularity if asymmetric => {
            vec![1.0, -(edge_counts[1] as f64 / total)]
        }
        QualityFunction::Modularity => declared
            .iter()
            .zip(edge_counts)
            .map(|(&d, &e)| d * e as f64 / total)
            .collect(),
        QualityFunction::Significance => vec![1.0 / total; declared.len()],
        QualityFunction::RbConfiguration
        | QualityFunction::Rber
        | QualityFunction::Cpm
        | QualityFunction::Surprise
            if asymmetric =>
        {
            let positive = match edge_counts[0] {
                0 => 0.0,
                e => 1.0 / e as f64,
            };
            vec![positive, -1.0 / total]
        }
        QualityFunction::RbConfiguration
        | QualityFunction::Rber
        | QualityFunction::Cpm
        | QualityFunction::Surprise => declared.iter().map(|&d| d / total).collect(),
    };
    Ok(weights)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    fn close(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < TOL)
    }

    #[test]
    fn test_single_layer_is_one() {
        for q in QualityFunction::ALL {
            let w = resolve(q, &[7.0], &[3], SplittingMode::Tag, WeightPolicy::Normalized)
                .unwrap();
            assert_eq!(w, vec![1.0]);
        }
    }

    #[test]
    fn test_modularity_asymmetric() {
        let w = resolve(
            QualityFunction::Modularity,
            &[1.0, -1.0],
            &[6, 1],
            SplittingMode::Sign,
            WeightPolicy::AsymmetricNegative,
        )
        .unwrap();
        assert_eq!(w[0], 1.0);
        assert!((w[1] + 1.0 / 7.0).abs() < TOL);
    }

    #[test]
    fn test_modularity_normalized() {
        let w = resolve(
            QualityFunction::Modularity,
            &[1.0, -1.0],
            &[6, 2],
            SplittingMode::Sign,
            WeightPolicy::Normalized,
        )
        .unwrap();
        assert!(close(&w, &[0.75, -0.25]));
    }

    #[test]
    fn test_unnormalized_families_asymmetric() {
        for q in [
            QualityFunction::RbConfiguration,
            QualityFunction::Rber,
            QualityFunction::Cpm,
            QualityFunction::Surprise,
        ] {
            let w = resolve(
                q,
                &[1.0, -1.0],
                &[6, 1],
                SplittingMode::Sign,
                WeightPolicy::AsymmetricNegative,
            )
            .unwrap();
            assert!(close(&w, &[1.0 / 6.0, -1.0 / 7.0]), "{q}: {w:?}");
        }
    }

    #[test]
    fn test_unnormalized_families_normalized() {
        let w = resolve(
            QualityFunction::Cpm,
            &[1.0, -1.0],
            &[6, 2],
            SplittingMode::Sign,
            WeightPolicy::Normalized,
        )
        .unwrap();
        assert!(close(&w, &[0.125, -0.125]));
    }

    #[test]
    fn test_tag_mode_ignores_asymmetric_policy() {
        let w = resolve(
            QualityFunction::Modularity,
            &[2.0, 1.0],
            &[3, 1],
            SplittingMode::Tag,
            WeightPolicy::AsymmetricNegative,
        )
        .unwrap();
        assert!(close(&w, &[1.5, 0.25]));
    }

    #[test]
    fn test_significance_uses_unit_weights() {
        let w = resolve(
            QualityFunction::Significance,
            &[5.0, 2.0, 1.0],
            &[2, 1, 1],
            SplittingMode::Tag,
            WeightPolicy::Normalized,
        )
        .unwrap();
        assert!(close(&w, &[0.25, 0.25, 0.25]));
    }

    #[test]
    fn test_empty_positive_layer() {
        let w = resolve(
            QualityFunction::Rber,
            &[1.0, -1.0],
            &[0, 4],
            SplittingMode::Sign,
            WeightPolicy::AsymmetricNegative,
        )
        .unwrap();
        assert!(close(&w, &[0.0, -0.25]));
    }

    #[test]
    fn test_no_edges_anywhere() {
        let w = resolve(
            QualityFunction::Modularity,
            &[1.0, 1.0],
            &[0, 0],
            SplittingMode::Tag,
            WeightPolicy::Normalized,
        )
        .unwrap();
        assert_eq!(w, vec![0.0, 0.0]);
    }

    #[test]
    fn test_length_mismatch() {
        let err = resolve(
            QualityFunction::Modularity,
            &[1.0, 1.0],
            &[1],
            SplittingMode::Tag,
            WeightPolicy::Normalized,
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::DimensionMismatch {
                expected: 2,
                found: 1
            }
        );
    }
}
