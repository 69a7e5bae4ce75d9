//! Flow-based community detection with the map equation.
//!
//! Communities are modules of a two-level code describing a random walk on
//! the graph: a good partition traps the walker for long stretches, so most
//! steps are described by short module-local codewords.
//!
//! ## The Map Equation (Rosvall & Bergstrom 2008)
//!
//! ```text
//! L(M) = q log q - 2 Σ_m q_m log q_m - Σ_α p_α log p_α + Σ_m (q_m + p_m) log(q_m + p_m)
//! ```
//!
//! With undirected flow, `p_α = k_α / 2W` and a module's exit flow is
//! `q_m = (K_m - 2 e_m) / 2W`; `q = Σ q_m`, `p_m = K_m / 2W`.
//!
//! The search is the same local moving and aggregation as Louvain, repeated
//! over independent trials; the shortest code wins. If no trial beats the
//! one-module code, every vertex lands in module 0.

use super::graph::{renumber, WeightedGraph};
use super::local_moves::{local_moving, seeded_rng};
use super::objective::{CommunityStats, MapEquation};
use super::traits::FlowDetector;
use crate::error::{Error, Result};
use rand::prelude::*;

/// Codelength improvements below this are ties.
const MIN_CODELENGTH_IMPROVEMENT: f64 = 1e-10;

/// Map-equation community detector.
#[derive(Debug, Clone)]
pub struct Infomap {
    /// Maximum local-moving sweeps per level.
    max_iter: usize,
    /// Maximum levels of aggregation.
    max_levels: usize,
}

/// Outcome of one trial.
#[derive(Debug, Clone)]
struct Trial {
    membership: Vec<usize>,
    codelength: f64,
}

impl Infomap {
    /// Create a new detector with default settings.
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

    fn single_trial(&self, graph: &WeightedGraph, rng: &mut StdRng) -> Trial {
        let n = graph.node_count();
        let mut membership: Vec<usize> = (0..n).collect();
        let mut current = graph.clone();

        for _level in 0..self.max_levels {
            let (partition, moved) = {
                let stats = CommunityStats::singletons(&current);
                let mut objective = MapEquation::new(&current, stats);
                local_moving(
                    std::slice::from_ref(&current),
                    &mut objective,
                    rng,
                    self.max_iter,
                )
            };
            if !moved {
                break;
            }
            let (partition, n_modules) = renumber(&partition);
            for m in membership.iter_mut() {
                *m = partition[*m];
            }
            if n_modules == current.node_count() {
                break;
            }
            current = current.aggregate(&partition, n_modules);
        }

        let (membership, n_modules) = renumber(&membership);
        let stats = CommunityStats::new(graph, &membership, n_modules);
        let codelength = MapEquation::new(graph, stats).codelength();
        Trial {
            membership,
            codelength,
        }
    }
}

impl Default for Infomap {
    fn default() -> Self {
        Self::new()
    }
}

/// Independent seed for each trial, SplitMix64-style.
fn seed_for_trial(base_seed: u64, trial_index: u64) -> u64 {
    if trial_index == 0 {
        return base_seed;
    }
    let mut z = base_seed ^ trial_index.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

impl FlowDetector for Infomap {
    fn detect_flow(
        &self,
        graph: &WeightedGraph,
        trials: usize,
        seed: Option<u64>,
    ) -> Result<Vec<usize>> {
        if trials == 0 {
            return Err(Error::InvalidParameter {
                name: "infomap-trials",
                message: "must be at least 1".to_string(),
            });
        }
        let n = graph.node_count();
        if n == 0 {
            return Ok(Vec::new());
        }
        if graph.total_weight() == 0.0 {
            // No flow: each node is its own module
            return Ok((0..n).collect());
        }

        let base_seed = seeded_rng(seed).random::<u64>();
        let mut best: Option<Trial> = None;
        for t in 0..trials {
            let mut rng = StdRng::seed_from_u64(seed_for_trial(base_seed, t as u64));
            let trial = self.single_trial(graph, &mut rng);
            tracing::trace!(trial = t, codelength = trial.codelength, "infomap trial done");
            best = match best {
                Some(b) if trial.codelength >= b.codelength - MIN_CODELENGTH_IMPROVEMENT => Some(b),
                _ => Some(trial),
            };
        }

        let one_level = MapEquation::one_level_codelength(graph);
        match best {
            Some(trial) if trial.codelength < one_level - MIN_CODELENGTH_IMPROVEMENT => {
                Ok(trial.membership)
            }
            Some(_) => Ok(vec![0; n]),
            None => Err(Error::UpstreamOptimizerFailure(
                "infomap ran no trials".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(n: usize, edges: &[(usize, usize)]) -> WeightedGraph {
        let weighted: Vec<_> = edges.iter().map(|&(i, j)| (i, j, 1.0)).collect();
        WeightedGraph::from_edges(n, &weighted).unwrap()
    }

    #[test]
    fn test_infomap_two_cliques() {
        // Two 4-cliques joined by one edge.
        let mut edges = Vec::new();
        for base in [0, 4] {
            for i in 0..4 {
                for j in (i + 1)..4 {
                    edges.push((base + i, base + j));
                }
            }
        }
        edges.push((3, 4));
        let communities = Infomap::new()
            .detect_flow(&graph(8, &edges), 5, Some(2))
            .unwrap();
        assert_eq!(communities.len(), 8);
        assert!(communities[..4].iter().all(|&c| c == communities[0]));
        assert!(communities[4..].iter().all(|&c| c == communities[4]));
        assert_ne!(communities[0], communities[4]);
    }

    #[test]
    fn test_infomap_single_clique_is_one_module() {
        let g = graph(4, &[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
        let communities = Infomap::new().detect_flow(&g, 3, Some(1)).unwrap();
        assert_eq!(communities, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_infomap_no_edges() {
        let communities = Infomap::new().detect_flow(&graph(3, &[]), 2, None).unwrap();
        assert_eq!(communities, vec![0, 1, 2]);
    }

    #[test]
    fn test_infomap_empty_graph() {
        let communities = Infomap::new().detect_flow(&graph(0, &[]), 2, Some(3)).unwrap();
        assert!(communities.is_empty());
    }

    #[test]
    fn test_infomap_zero_trials() {
        let result = Infomap::new().detect_flow(&graph(2, &[(0, 1)]), 0, None);
        assert!(matches!(result, Err(Error::InvalidParameter { .. })));
    }

    #[test]
    fn test_infomap_seeded_runs_agree() {
        let g = graph(6, &[(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5), (2, 3)]);
        let a = Infomap::new().detect_flow(&g, 4, Some(9)).unwrap();
        let b = Infomap::new().detect_flow(&g, 4, Some(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_seed_for_trial() {
        assert_eq!(seed_for_trial(42, 0), 42);
        assert_ne!(seed_for_trial(42, 1), seed_for_trial(42, 2));
    }
}
