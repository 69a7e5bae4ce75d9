//! Louvain optimization for single-layer and multiplex partitions.
//!
//! Fast quality optimization through local node moves and graph aggregation.
//!
//! ## The Algorithm (Blondel et al. 2008)
//!
//! 1. **Local moving**: start with each node in its own community and move
//!    nodes, in random order, to the candidate community with the highest
//!    gain until no move improves the quality.
//!
//! 2. **Aggregation**: contract every community into one node. Edge weights
//!    are summed; edges inside a community become a loop.
//!
//! 3. **Iterate** on the aggregated graph until a level moves nothing.
//!
//! ## Multiplex
//!
//! Several layers over the same vertex set are optimized jointly for one
//! membership. The objective is `Σ_l w_l · Q_l`, so a layer with a negative
//! weight rewards separating its endpoints. All layers are aggregated by the
//! same partition, which keeps vertex identity across layers.
//!
//! ## References
//!
//! Blondel et al. (2008). "Fast unfolding of communities in large networks."
//! Journal of Statistical Mechanics: Theory and Experiment, P10008.
//!
//! Mucha et al. (2010). "Community structure in time-dependent, multiscale,
//! and multiplex networks." Science 328, 876-878.

use super::graph::{renumber, WeightedGraph};
use super::local_moves::{local_moving, seeded_rng};
use super::objective::MultiplexObjective;
use super::traits::PartitionOptimizer;
use crate::error::{Error, Result};
use crate::quality::QualitySpec;

/// Louvain optimizer.
#[derive(Debug, Clone)]
pub struct Louvain {
    /// Maximum local-moving sweeps per level.
    max_iter: usize,
    /// Maximum levels of aggregation.
    max_levels: usize,
}

impl Louvain {
    /// Create a new Louvain optimizer with default settings.
    pub fn new() -> Self {
        Self {
            max_iter: 100,
            max_levels: 20,
        }
    }

    /// Set maximum sweeps per level.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set maximum aggregation levels.
    pub fn with_max_levels(mut self, levels: usize) -> Self {
        self.max_levels = levels;
        self
    }

    fn run(
        &self,
        layers: &[WeightedGraph],
        weights: &[f64],
        quality: QualitySpec,
        seed: Option<u64>,
    ) -> Result<(Vec<usize>, f64)> {
        let n = layers.first().ok_or(Error::EmptyInput)?.node_count();
        if weights.len() != layers.len() {
            return Err(Error::DimensionMismatch {
                expected: layers.len(),
                found: weights.len(),
            });
        }
        if let Some(layer) = layers.iter().find(|g| g.node_count() != n) {
            return Err(Error::DimensionMismatch {
                expected: n,
                found: layer.node_count(),
            });
        }
        if let Some(w) = weights.iter().find(|w| !w.is_finite()) {
            return Err(Error::UpstreamOptimizerFailure(format!(
                "layer weight {w} is not finite"
            )));
        }

        if n == 0 {
            return Ok((Vec::new(), 0.0));
        }

        let mut rng = seeded_rng(seed);
        let singletons: Vec<usize> = (0..n).collect();
        let before =
            MultiplexObjective::with_partition(layers, weights, quality, &singletons, n).quality();

        // membership[i] = node of the current level that input vertex i belongs to
        let mut membership = singletons;
        let mut graphs: Vec<WeightedGraph> = layers.to_vec();

        for level in 0..self.max_levels {
            let (partition, moved) = {
                let mut objective = MultiplexObjective::singletons(&graphs, weights, quality);
                local_moving(&graphs, &mut objective, &mut rng, self.max_iter)
            };
            if !moved {
                break;
            }

            let (partition, n_communities) = renumber(&partition);
            for c in membership.iter_mut() {
                *c = partition[*c];
            }
            tracing::trace!(level, n_communities, "louvain level done");

            if n_communities == graphs[0].node_count() {
                break;
            }
            graphs = graphs
                .iter()
                .map(|g| g.aggregate(&partition, n_communities))
                .collect();
        }

        let (membership, n_communities) = renumber(&membership);
        let after =
            MultiplexObjective::with_partition(layers, weights, quality, &membership, n_communities)
                .quality();
        let improvement = after - before;
        if !improvement.is_finite() {
            return Err(Error::UpstreamOptimizerFailure(format!(
                "{} quality diverged",
                quality.function
            )));
        }
        Ok((membership, improvement))
    }
}

impl Default for Louvain {
    fn default() -> Self {
        Self::new()
    }
}

impl PartitionOptimizer for Louvain {
    fn optimize(
        &self,
        graph: &WeightedGraph,
        quality: QualitySpec,
        seed: Option<u64>,
    ) -> Result<Vec<usize>> {
        self.run(std::slice::from_ref(graph), &[1.0], quality, seed)
            .map(|(membership, _)| membership)
    }

    fn optimize_multiplex(
        &self,
        layers: &[WeightedGraph],
        layer_weights: &[f64],
        quality: QualitySpec,
        seed: Option<u64>,
    ) -> Result<(Vec<usize>, f64)> {
        self.run(layers, layer_weights, quality, seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::QualityFunction;

    fn graph(n: usize, edges: &[(usize, usize)]) -> WeightedGraph {
        let weighted: Vec<_> = edges.iter().map(|&(i, j)| (i, j, 1.0)).collect();
        WeightedGraph::from_edges(n, &weighted).unwrap()
    }

    fn two_cliques() -> WeightedGraph {
        graph(6, &[(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5), (2, 3)])
    }

    fn assert_two_triangles(communities: &[usize]) {
        assert_eq!(communities.len(), 6);
        assert_eq!(communities[0], communities[1]);
        assert_eq!(communities[1], communities[2]);
        assert_eq!(communities[3], communities[4]);
        assert_eq!(communities[4], communities[5]);
        assert_ne!(communities[0], communities[3]);
    }

    #[test]
    fn test_louvain_triangle() {
        let g = graph(3, &[(0, 1), (1, 2), (0, 2)]);
        let communities = Louvain::new()
            .optimize(&g, QualityFunction::Modularity.into(), Some(7))
            .unwrap();
        assert_eq!(communities, vec![0, 0, 0]);
    }

    #[test]
    fn test_louvain_two_cliques() {
        let communities = Louvain::new()
            .optimize(&two_cliques(), QualityFunction::Modularity.into(), Some(1))
            .unwrap();
        assert_two_triangles(&communities);
    }

    #[test]
    fn test_louvain_families_on_two_cliques() {
        for q in [
            QualityFunction::RbConfiguration,
            QualityFunction::Rber,
            QualityFunction::Significance,
            QualityFunction::Surprise,
        ] {
            let communities = Louvain::new()
                .optimize(&two_cliques(), q.into(), Some(3))
                .unwrap();
            assert_two_triangles(&communities);
        }
    }

    #[test]
    fn test_cpm_resolution_controls_merging() {
        let g = two_cliques();
        let coarse = Louvain::new()
            .optimize(&g, QualitySpec::new(QualityFunction::Cpm, 0.1).unwrap(), Some(1))
            .unwrap();
        assert!(coarse.iter().all(|&c| c == 0));

        let fine = Louvain::new()
            .optimize(&g, QualitySpec::new(QualityFunction::Cpm, 2.0).unwrap(), Some(1))
            .unwrap();
        assert_eq!(fine, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_louvain_empty_graph() {
        let g = graph(0, &[]);
        let result = Louvain::new().optimize(&g, QualityFunction::Modularity.into(), None);
        assert_eq!(result, Ok(vec![]));

        let multiplex = Louvain::new().optimize_multiplex(
            &[g.clone(), g],
            &[1.0, -0.5],
            QualityFunction::Modularity.into(),
            None,
        );
        assert_eq!(multiplex, Ok((vec![], 0.0)));
        let none = Louvain::new().optimize_multiplex(&[], &[], QualityFunction::Cpm.into(), None);
        assert_eq!(none, Err(Error::EmptyInput));
    }

    #[test]
    fn test_louvain_disconnected() {
        let g = graph(2, &[]);
        let communities = Louvain::new()
            .optimize(&g, QualityFunction::Modularity.into(), None)
            .unwrap();
        assert_eq!(communities, vec![0, 1]);
    }

    #[test]
    fn test_louvain_seed_is_deterministic() {
        // Ring of cliques has many equally good tie-breaks.
        let mut edges = Vec::new();
        for c in 0..6 {
            let base = c * 4;
            for i in 0..4 {
                for j in (i + 1)..4 {
                    edges.push((base + i, base + j));
                }
            }
            edges.push((base + 3, (base + 4) % 24));
        }
        let g = graph(24, &edges);
        let louvain = Louvain::new();
        let a = louvain.optimize(&g, QualityFunction::Modularity.into(), Some(11)).unwrap();
        let b = louvain.optimize(&g, QualityFunction::Modularity.into(), Some(11)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_multiplex_negative_layer_separates() {
        // One positive 4-clique; the negative layer pulls {0,1} away from {2,3}.
        let positive = graph(4, &[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
        let negative = graph(4, &[(0, 2), (0, 3), (1, 2), (1, 3)]);

        let (alone, _) = Louvain::new()
            .optimize_multiplex(
                std::slice::from_ref(&positive),
                &[1.0],
                QualityFunction::Modularity.into(),
                Some(5),
            )
            .unwrap();
        assert!(alone.iter().all(|&c| c == alone[0]));

        let (membership, improvement) = Louvain::new()
            .optimize_multiplex(
                &[positive, negative],
                &[1.0, -1.0],
                QualityFunction::Modularity.into(),
                Some(5),
            )
            .unwrap();
        assert_eq!(membership[0], membership[1]);
        assert_eq!(membership[2], membership[3]);
        assert_ne!(membership[0], membership[2]);
        assert!(improvement > 0.0);
    }

    #[test]
    fn test_multiplex_layer_mismatch() {
        let result = Louvain::new().optimize_multiplex(
            &[graph(3, &[]), graph(4, &[])],
            &[1.0, 1.0],
            QualityFunction::Modularity.into(),
            None,
        );
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));

        let result = Louvain::new().optimize_multiplex(
            &[graph(3, &[])],
            &[1.0, 1.0],
            QualityFunction::Modularity.into(),
            None,
        );
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
    }
}
