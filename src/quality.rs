//! Quality function families.
//!
//! Each family is a closed variant with a capability table: whether it takes
//! a resolution parameter, and whether it rejects weighted input. Parsing
//! an unknown name is an error rather than a silent fallback.
//!
//! | Family | Resolution | Weighted input |
//! |--------|------------|----------------|
//! | `modularity` | no (fixed at 1) | yes |
//! | `rbconfiguration` | yes | yes |
//! | `rber` | yes | yes |
//! | `cpm` | yes | yes |
//! | `significance` | no | **no** |
//! | `surprise` | no | yes |

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A partition quality function family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualityFunction {
    /// Newman-Girvan modularity.
    Modularity,
    /// Reichardt-Bornholdt with configuration null model.
    RbConfiguration,
    /// Reichardt-Bornholdt with Erdős-Rényi null model.
    Rber,
    /// Constant Potts model.
    Cpm,
    /// Significance (Traag et al. 2013).
    Significance,
    /// Asymptotic surprise.
    Surprise,
}

impl QualityFunction {
    /// Every family, in canonical order.
    pub const ALL: [QualityFunction; 6] = [
        QualityFunction::Modularity,
        QualityFunction::RbConfiguration,
        QualityFunction::Rber,
        QualityFunction::Cpm,
        QualityFunction::Significance,
        QualityFunction::Surprise,
    ];

    /// Configuration name.
    pub fn name(self) -> &'static str {
        match self {
            QualityFunction::Modularity => "modularity",
            QualityFunction::RbConfiguration => "rbconfiguration",
            QualityFunction::Rber => "rber",
            QualityFunction::Cpm => "cpm",
            QualityFunction::Significance => "significance",
            QualityFunction::Surprise => "surprise",
        }
    }

    /// Whether the family takes a resolution parameter.
    pub fn has_resolution(self) -> bool {
        matches!(
            self,
            QualityFunction::RbConfiguration | QualityFunction::Rber | QualityFunction::Cpm
        )
    }

    /// Whether the family is undefined for weighted input.
    pub fn forbids_weights(self) -> bool {
        matches!(self, QualityFunction::Significance)
    }
}

impl fmt::Display for QualityFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QualityFunction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        QualityFunction::ALL
            .into_iter()
            .find(|q| q.name() == lowered)
            .ok_or_else(|| Error::InvalidQualityFunction(s.to_string()))
    }
}

/// A quality family together with its resolution, when it has one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualitySpec {
    /// Family.
    pub function: QualityFunction,
    resolution: f64,
}

impl QualitySpec {
    /// Build a spec. The resolution is ignored by families without one.
    pub fn new(function: QualityFunction, resolution: f64) -> Result<Self> {
        if function.has_resolution() && !(resolution.is_finite() && resolution > 0.0) {
            return Err(Error::InvalidParameter {
                name: "louvain-resolution",
                message: format!("must be a positive number, got {resolution}"),
            });
        }
        Ok(Self {
            function,
            resolution,
        })
    }

    /// Whether the family takes a resolution parameter.
    pub fn has_resolution(&self) -> bool {
        self.function.has_resolution()
    }

    /// Resolution passed to the optimizer, `None` for families without one.
    pub fn resolution(&self) -> Option<f64> {
        self.has_resolution().then_some(self.resolution)
    }

    /// Resolution used inside the objective: 1 for families without one.
    pub(crate) fn gamma(&self) -> f64 {
        self.resolution().unwrap_or(1.0)
    }
}

impl From<QualityFunction> for QualitySpec {
    fn from(function: QualityFunction) -> Self {
        Self {
            function,
            resolution: 1.0,
        }
    }
}
