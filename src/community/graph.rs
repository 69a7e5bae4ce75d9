//! Weighted graph representation used by the optimizers.

use crate::error::{Error, Result};
use crate::network::Network;
use std::collections::BTreeMap;

/// An undirected weighted graph that can be coarsened by a partition.
///
/// Parallel and reverse edges are merged by summing their weights; loops are
/// kept apart from the adjacency lists. Each vertex carries a size (1 for an
/// input vertex, the number of input vertices it stands for after
/// aggregation).
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedGraph {
    /// Adjacency: node -> [(neighbor, weight)], sorted by neighbor, no loops.
    adj: Vec<Vec<(usize, f64)>>,
    /// Loop weight of each node.
    self_loops: Vec<f64>,
    /// Weighted degree, loops counted twice.
    strength: Vec<f64>,
    /// Number of input vertices each node stands for.
    node_size: Vec<usize>,
    /// Total edge weight `m`, each edge and loop counted once.
    total_weight: f64,
}

impl WeightedGraph {
    /// Build from an edge list over `n` vertices.
    ///
    /// Weights must be finite and non-negative.
    pub fn from_edges(n: usize, edges: &[(usize, usize, f64)]) -> Result<Self> {
        let mut merged: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        for &(i, j, w) in edges {
            if i >= n || j >= n {
                return Err(Error::DimensionMismatch {
                    expected: n,
                    found: i.max(j) + 1,
                });
            }
            if !w.is_finite() || w < 0.0 {
                return Err(Error::UpstreamOptimizerFailure(format!(
                    "edge ({i}, {j}) has weight {w}; only non-negative weights can be optimized"
                )));
            }
            let key = if i <= j { (i, j) } else { (j, i) };
            *merged.entry(key).or_insert(0.0) += w;
        }
        Ok(Self::from_merged(n, merged, vec![1; n]))
    }

    /// Symmetrized weight view of a network.
    pub fn from_network(network: &Network) -> Result<Self> {
        let edges: Vec<(usize, usize, f64)> = network
            .edges()
            .map(|(i, j, link)| (i, j, link.weight()))
            .collect();
        Self::from_edges(network.vertex_count(), &edges)
    }

    fn from_merged(
        n: usize,
        merged: BTreeMap<(usize, usize), f64>,
        node_size: Vec<usize>,
    ) -> Self {
        let mut adj = vec![Vec::new(); n];
        let mut self_loops = vec![0.0; n];
        let mut strength = vec![0.0; n];
        let mut total_weight = 0.0;

        for ((i, j), w) in merged {
            if w == 0.0 {
                continue;
            }
            total_weight += w;
            strength[i] += w;
            strength[j] += w;
            if i == j {
                self_loops[i] += w;
            } else {
                adj[i].push((j, w));
                adj[j].push((i, w));
            }
        }
        for neighbors in &mut adj {
            neighbors.sort_unstable_by_key(|&(nb, _)| nb);
        }

        Self {
            adj,
            self_loops,
            strength,
            node_size,
            total_weight,
        }
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.adj.len()
    }

    /// Total edge weight `m`.
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Number of input vertices represented.
    pub fn total_size(&self) -> usize {
        self.node_size.iter().sum()
    }

    pub(crate) fn neighbors(&self, node: usize) -> &[(usize, f64)] {
        &self.adj[node]
    }

    pub(crate) fn self_loop(&self, node: usize) -> f64 {
        self.self_loops[node]
    }

    pub(crate) fn strength(&self, node: usize) -> f64 {
        self.strength[node]
    }

    pub(crate) fn node_size(&self, node: usize) -> usize {
        self.node_size[node]
    }

    /// Contract every community of `partition` into one node.
    ///
    /// `partition` must use ids `0..n_communities`. Edges inside a
    /// community become a loop on its node.
    pub(crate) fn aggregate(&self, partition: &[usize], n_communities: usize) -> Self {
        let mut merged: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        let mut node_size = vec![0; n_communities];

        for (node, &c) in partition.iter().enumerate() {
            node_size[c] += self.node_size[node];
            if self.self_loops[node] > 0.0 {
                *merged.entry((c, c)).or_insert(0.0) += self.self_loops[node];
            }
            for &(nb, w) in &self.adj[node] {
                // Each undirected edge is seen from both ends.
                if nb < node {
                    continue;
                }
                let d = partition[nb];
                let key = if c <= d { (c, d) } else { (d, c) };
                *merged.entry(key).or_insert(0.0) += w;
            }
        }

        Self::from_merged(n_communities, merged, node_size)
    }
}

/// Renumber communities to consecutive ids in order of first appearance.
///
/// Returns the new assignment and the number of communities.
pub(crate) fn renumber(assignment: &[usize]) -> (Vec<usize>, usize) {
    let mut mapping: BTreeMap<usize, usize> = BTreeMap::new();
    let renumbered = assignment
        .iter()
        .map(|&c| {
            let next = mapping.len();
            *mapping.entry(c).or_insert(next)
        })
        .collect();
    (renumbered, mapping.len())
}
