//! Community detection traits.

use super::graph::WeightedGraph;
use crate::error::Result;
use crate::quality::QualitySpec;

/// Optimizer for a named quality function.
pub trait PartitionOptimizer {
    /// Partition a single graph.
    ///
    /// Returns a mapping from node index to community ID.
    fn optimize(
        &self,
        graph: &WeightedGraph,
        quality: QualitySpec,
        seed: Option<u64>,
    ) -> Result<Vec<usize>>;

    /// Partition several layers over the same vertices jointly, maximizing
    /// `Σ_l w_l · Q_l`.
    ///
    /// Returns the membership and the improvement of the weighted quality
    /// over the all-singletons partition.
    fn optimize_multiplex(
        &self,
        layers: &[WeightedGraph],
        layer_weights: &[f64],
        quality: QualitySpec,
        seed: Option<u64>,
    ) -> Result<(Vec<usize>, f64)>;
}

/// Flow-based detector run over independent trials.
pub trait FlowDetector {
    /// Detect modules; the best of `trials` runs is kept.
    fn detect_flow(
        &self,
        graph: &WeightedGraph,
        trials: usize,
        seed: Option<u64>,
    ) -> Result<Vec<usize>>;
}
