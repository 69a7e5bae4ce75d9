//! Objectives driven by local moving.
//!
//! An [`Objective`] scores moving one node between communities and applies
//! the move to its cached community statistics. Two objectives exist:
//!
//! - [`MultiplexObjective`]: the weighted sum `Σ_l w_l · Q_l` of one quality
//!   function over several layers sharing a node set (a single layer is the
//!   one-element case).
//! - [`MapEquation`]: the two-level map equation on undirected flow. Its gain
//!   is the codelength saved by a move.
//!
//! ## Quality functions
//!
//! With `e_c` the internal weight of community `c`, `K_c` its summed
//! strength, `n_c` its size, `m` the total weight and `γ` the resolution:
//!
//! ```text
//! modularity       Q = 1/m · Σ_c (e_c - K_c² / 4m)
//! rbconfiguration  Q = Σ_c (e_c - γ K_c² / 4m)
//! rber             Q = Σ_c (e_c - γ p C(n_c, 2)),  p = m / C(n, 2)
//! cpm              Q = Σ_c (e_c - γ C(n_c, 2))
//! significance     Q = Σ_c C(n_c, 2) · D(e_c / C(n_c, 2) ‖ p)
//! surprise         Q = m · D(Σ e_c / m ‖ Σ C(n_c, 2) / C(n, 2))
//! ```
//!
//! where `D` is the binary Kullback-Leibler divergence.
//!
//! ## References
//!
//! - Reichardt & Bornholdt (2006). "Statistical mechanics of community detection."
//! - Traag, Van Dooren, Nesterov (2011). "Narrow scope for resolution-limit-free community
//!   detection."
//! - Traag, Krings, Van Dooren (2013). "Significant scales in community structure."
//! - Traag, Aldecoa, Delvenne (2015). "Detecting communities using asymptotical surprise."
//! - Rosvall & Bergstrom (2008). "Maps of random walks on complex networks."

use super::graph::WeightedGraph;
use crate::quality::{QualityFunction, QualitySpec};

/// Probabilities are kept this far from 0 and 1 inside the divergence.
const PROB_EPS: f64 = 1e-12;

/// Scores and applies single-node moves.
///
/// `w_from[l]` and `w_to[l]` are the weights in layer `l` from the node to
/// the other members of the source and target community.
pub(crate) trait Objective {
    /// Improvement from moving `node` from `from` to `to` (higher is better).
    fn gain(&self, node: usize, from: usize, to: usize, w_from: &[f64], w_to: &[f64]) -> f64;

    /// Apply the move to the cached statistics.
    fn apply(&mut self, node: usize, from: usize, to: usize, w_from: &[f64], w_to: &[f64]);
}

/// Per-community sums over one graph.
#[derive(Debug, Clone)]
pub(crate) struct CommunityStats {
    /// Internal weight `e_c` (loops included once).
    internal: Vec<f64>,
    /// Summed strength `K_c`.
    strength: Vec<f64>,
    /// Summed node size `n_c`.
    size: Vec<f64>,
}

impl CommunityStats {
    /// Statistics of the partition assigning node `i` to `assignment[i]`.
    pub(crate) fn new(graph: &WeightedGraph, assignment: &[usize], n_communities: usize) -> Self {
        let mut stats = Self {
            internal: vec![0.0; n_communities],
            strength: vec![0.0; n_communities],
            size: vec![0.0; n_communities],
        };
        for (node, &c) in assignment.iter().enumerate() {
            stats.strength[c] += graph.strength(node);
            stats.size[c] += graph.node_size(node) as f64;
            stats.internal[c] += graph.self_loop(node);
            for &(nb, w) in graph.neighbors(node) {
                if nb > node && assignment[nb] == c {
                    stats.internal[c] += w;
                }
            }
        }
        stats
    }

    /// Every node in its own community.
    pub(crate) fn singletons(graph: &WeightedGraph) -> Self {
        let assignment: Vec<usize> = (0..graph.node_count()).collect();
        Self::new(graph, &assignment, graph.node_count())
    }

    fn apply(
        &mut self,
        graph: &WeightedGraph,
        node: usize,
        from: usize,
        to: usize,
        w_from: f64,
        w_to: f64,
    ) {
        let loop_w = graph.self_loop(node);
        let k = graph.strength(node);
        let s = graph.node_size(node) as f64;
        self.internal[from] -= w_from + loop_w;
        self.internal[to] += w_to + loop_w;
        self.strength[from] -= k;
        self.strength[to] += k;
        self.size[from] -= s;
        self.size[to] += s;
    }
}

/// Number of unordered pairs among `n` items.
fn pairs(n: f64) -> f64 {
    n * (n - 1.0) / 2.0
}

/// Binary Kullback-Leibler divergence `D(q ‖ p)` in nats.
fn kl_divergence(q: f64, p: f64) -> f64 {
    let q = q.clamp(0.0, 1.0);
    let p = p.clamp(PROB_EPS, 1.0 - PROB_EPS);
    let mut d = 0.0;
    if q > 0.0 {
        d += q * (q / p).ln();
    }
    if q < 1.0 {
        d += (1.0 - q) * ((1.0 - q) / (1.0 - p)).ln();
    }
    d
}

/// Significance contribution of one community.
fn significance_term(size: f64, internal: f64, density: f64) -> f64 {
    let possible = pairs(size);
    if possible <= 0.0 {
        return 0.0;
    }
    possible * kl_divergence(internal / possible, density)
}

/// One layer of a multiplex partition.
#[derive(Debug, Clone)]
struct LayerPartition<'g> {
    graph: &'g WeightedGraph,
    stats: CommunityStats,
    /// `m / C(n, 2)`, the null-model edge density.
    density: f64,
    /// `C(n, 2)` over all represented input vertices.
    possible_pairs: f64,
    /// `Σ_c e_c`.
    total_internal: f64,
    /// `Σ_c C(n_c, 2)`.
    total_pairs: f64,
}

impl<'g> LayerPartition<'g> {
    fn new(graph: &'g WeightedGraph, stats: CommunityStats) -> Self {
        let possible_pairs = pairs(graph.total_size() as f64);
        let density = if possible_pairs > 0.0 {
            graph.total_weight() / possible_pairs
        } else {
            0.0
        };
        let total_internal = stats.internal.iter().sum();
        let total_pairs = stats.size.iter().map(|&s| pairs(s)).sum();
        Self {
            graph,
            stats,
            density,
            possible_pairs,
            total_internal,
            total_pairs,
        }
    }

    fn surprise(&self, internal: f64, community_pairs: f64) -> f64 {
        let m = self.graph.total_weight();
        if m <= 0.0 || self.possible_pairs <= 0.0 {
            return 0.0;
        }
        m * kl_divergence(internal / m, community_pairs / self.possible_pairs)
    }

    fn quality(&self, quality: &QualitySpec) -> f64 {
        let m = self.graph.total_weight();
        let gamma = quality.gamma();
        let s = &self.stats;
        let communities = s.internal.iter().zip(&s.strength).zip(&s.size);
        match quality.function {
            QualityFunction::Modularity | QualityFunction::RbConfiguration => {
                if m <= 0.0 {
                    return 0.0;
                }
                let q: f64 = communities
                    .map(|((&e, &k), _)| e - gamma * k * k / (4.0 * m))
                    .sum();
                if quality.function == QualityFunction::Modularity {
                    q / m
                } else {
                    q
                }
            }
            QualityFunction::Rber => communities
                .map(|((&e, _), &n)| e - gamma * self.density * pairs(n))
                .sum(),
            QualityFunction::Cpm => communities
                .map(|((&e, _), &n)| e - gamma * pairs(n))
                .sum(),
            QualityFunction::Significance => communities
                .map(|((&e, _), &n)| significance_term(n, e, self.density))
                .sum(),
            QualityFunction::Surprise => self.surprise(self.total_internal, self.total_pairs),
        }
    }

    fn gain(
        &self,
        quality: &QualitySpec,
        node: usize,
        from: usize,
        to: usize,
        w_from: f64,
        w_to: f64,
    ) -> f64 {
        let g = self.graph;
        let s = &self.stats;
        let m = g.total_weight();
        let gamma = quality.gamma();
        let k = g.strength(node);
        let size = g.node_size(node) as f64;
        let loop_w = g.self_loop(node);

        match quality.function {
            QualityFunction::Modularity | QualityFunction::RbConfiguration => {
                if m <= 0.0 {
                    return 0.0;
                }
                let diff = (w_to - w_from)
                    - gamma * k * (s.strength[to] - (s.strength[from] - k)) / (2.0 * m);
                if quality.function == QualityFunction::Modularity {
                    diff / m
                } else {
                    diff
                }
            }
            QualityFunction::Rber => {
                (w_to - w_from) - gamma * self.density * size * (s.size[to] - (s.size[from] - size))
            }
            QualityFunction::Cpm => {
                (w_to - w_from) - gamma * size * (s.size[to] - (s.size[from] - size))
            }
            QualityFunction::Significance => {
                let p = self.density;
                let before = significance_term(s.size[from], s.internal[from], p)
                    + significance_term(s.size[to], s.internal[to], p);
                let from_after = s.internal[from] - w_from - loop_w;
                let to_after = s.internal[to] + w_to + loop_w;
                let after = significance_term(s.size[from] - size, from_after, p)
                    + significance_term(s.size[to] + size, to_after, p);
                after - before
            }
            QualityFunction::Surprise => {
                let internal = self.total_internal + w_to - w_from;
                let community_pairs =
                    self.total_pairs + size * (s.size[to] - (s.size[from] - size));
                self.surprise(internal, community_pairs)
                    - self.surprise(self.total_internal, self.total_pairs)
            }
        }
    }

    fn apply(&mut self, node: usize, from: usize, to: usize, w_from: f64, w_to: f64) {
        let size = self.graph.node_size(node) as f64;
        self.total_internal += w_to - w_from;
        self.total_pairs += size * (self.stats.size[to] - (self.stats.size[from] - size));
        self.stats.apply(self.graph, node, from, to, w_from, w_to);
    }
}

/// Weighted sum of one quality function over layers sharing a node set.
#[derive(Debug, Clone)]
pub(crate) struct MultiplexObjective<'g> {
    layers: Vec<LayerPartition<'g>>,
    weights: &'g [f64],
    quality: QualitySpec,
}

impl<'g> MultiplexObjective<'g> {
    /// Every node in its own community.
    pub(crate) fn singletons(
        graphs: &'g [WeightedGraph],
        weights: &'g [f64],
        quality: QualitySpec,
    ) -> Self {
        let layers = graphs
            .iter()
            .map(|g| LayerPartition::new(g, CommunityStats::singletons(g)))
            .collect();
        Self {
            layers,
            weights,
            quality,
        }
    }

    /// Objective of an arbitrary partition.
    pub(crate) fn with_partition(
        graphs: &'g [WeightedGraph],
        weights: &'g [f64],
        quality: QualitySpec,
        assignment: &[usize],
        n_communities: usize,
    ) -> Self {
        let layers = graphs
            .iter()
            .map(|g| LayerPartition::new(g, CommunityStats::new(g, assignment, n_communities)))
            .collect();
        Self {
            layers,
            weights,
            quality,
        }
    }

    /// `Σ_l w_l · Q_l`.
    pub(crate) fn quality(&self) -> f64 {
        self.layers
            .iter()
            .zip(self.weights)
            .map(|(layer, &w)| w * layer.quality(&self.quality))
            .sum()
    }
}

impl Objective for MultiplexObjective<'_> {
    fn gain(&self, node: usize, from: usize, to: usize, w_from: &[f64], w_to: &[f64]) -> f64 {
        self.layers
            .iter()
            .zip(self.weights)
            .enumerate()
            .map(|(l, (layer, &w))| {
                if w == 0.0 {
                    0.0
                } else {
                    w * layer.gain(&self.quality, node, from, to, w_from[l], w_to[l])
                }
            })
            .sum()
    }

    fn apply(&mut self, node: usize, from: usize, to: usize, w_from: &[f64], w_to: &[f64]) {
        for (l, layer) in self.layers.iter_mut().enumerate() {
            layer.apply(node, from, to, w_from[l], w_to[l]);
        }
    }
}

/// `p · log2(p)`, zero at zero.
fn plogp(p: f64) -> f64 {
    if p > 0.0 {
        p * p.log2()
    } else {
        0.0
    }
}

/// Two-level map equation on undirected flow.
///
/// Node flow is `k_α / 2W`; a module's exit flow is `(K_m - 2 e_m) / 2W`.
#[derive(Debug, Clone)]
pub(crate) struct MapEquation<'g> {
    graph: &'g WeightedGraph,
    stats: CommunityStats,
    /// `Σ_m (K_m - 2 e_m)` in weight units.
    total_exit: f64,
}

impl<'g> MapEquation<'g> {
    pub(crate) fn new(graph: &'g WeightedGraph, stats: CommunityStats) -> Self {
        let total_exit = stats
            .strength
            .iter()
            .zip(&stats.internal)
            .map(|(&k, &e)| (k - 2.0 * e).max(0.0))
            .sum();
        Self {
            graph,
            stats,
            total_exit,
        }
    }

    fn two_w(&self) -> f64 {
        2.0 * self.graph.total_weight()
    }

    /// Module codebook contribution: `-2 plogp(q_m) + plogp(q_m + p_m)`.
    fn module_term(&self, strength: f64, internal: f64) -> f64 {
        let two_w = self.two_w();
        let exit = (strength - 2.0 * internal).max(0.0) / two_w;
        -2.0 * plogp(exit) + plogp(exit + strength / two_w)
    }

    /// Codelength in bits, node entropy excluded.
    fn partial_codelength(&self) -> f64 {
        if self.two_w() <= 0.0 {
            return 0.0;
        }
        let modules: f64 = self
            .stats
            .strength
            .iter()
            .zip(&self.stats.internal)
            .map(|(&k, &e)| self.module_term(k, e))
            .sum();
        plogp(self.total_exit / self.two_w()) + modules
    }

    /// Full two-level codelength in bits.
    ///
    /// Only meaningful for the input graph, whose nodes are the leaves.
    pub(crate) fn codelength(&self) -> f64 {
        let two_w = self.two_w();
        if two_w <= 0.0 {
            return 0.0;
        }
        let node_entropy: f64 = (0..self.graph.node_count())
            .map(|node| plogp(self.graph.strength(node) / two_w))
            .sum();
        self.partial_codelength() - node_entropy
    }

    /// Codelength with every node in one module.
    pub(crate) fn one_level_codelength(graph: &WeightedGraph) -> f64 {
        let two_w = 2.0 * graph.total_weight();
        if two_w <= 0.0 {
            return 0.0;
        }
        -(0..graph.node_count())
            .map(|node| plogp(graph.strength(node) / two_w))
            .sum::<f64>()
    }
}

impl Objective for MapEquation<'_> {
    fn gain(&self, node: usize, from: usize, to: usize, w_from: &[f64], w_to: &[f64]) -> f64 {
        let two_w = self.two_w();
        if two_w <= 0.0 {
            return 0.0;
        }
        let g = self.graph;
        let s = &self.stats;
        let k = g.strength(node);
        let loop_w = g.self_loop(node);

        let from_k = s.strength[from] - k;
        let from_e = s.internal[from] - w_from[0] - loop_w;
        let to_k = s.strength[to] + k;
        let to_e = s.internal[to] + w_to[0] + loop_w;

        let exit = |k: f64, e: f64| (k - 2.0 * e).max(0.0);
        let total_exit = self.total_exit - exit(s.strength[from], s.internal[from])
            - exit(s.strength[to], s.internal[to])
            + exit(from_k, from_e)
            + exit(to_k, to_e);

        let before = plogp(self.total_exit / two_w)
            + self.module_term(s.strength[from], s.internal[from])
            + self.module_term(s.strength[to], s.internal[to]);
        let after = plogp(total_exit / two_w)
            + self.module_term(from_k, from_e)
            + self.module_term(to_k, to_e);
        before - after
    }

    fn apply(&mut self, node: usize, from: usize, to: usize, w_from: &[f64], w_to: &[f64]) {
        let exit = |k: f64, e: f64| (k - 2.0 * e).max(0.0);
        let module_exits = |s: &CommunityStats| {
            exit(s.strength[from], s.internal[from]) + exit(s.strength[to], s.internal[to])
        };
        self.total_exit -= module_exits(&self.stats);
        self.stats.apply(self.graph, node, from, to, w_from[0], w_to[0]);
        self.total_exit += module_exits(&self.stats);
    }
}
