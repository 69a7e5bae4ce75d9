//! Community detection engines.
//!
//! Given a graph, find natural groupings where nodes within groups are
//! densely connected, and connections between groups are sparse.
//!
//! ## Quality Functions
//!
//! [`Louvain`] optimizes any [`QualityFunction`](crate::QualityFunction).
//! Most compare the actual weight inside communities to what a null model
//! expects, e.g. modularity:
//!
//! ```text
//! Q = (1/2m) × Σ[A_ij - γ(k_i × k_j)/(2m)] × δ(c_i, c_j)
//! ```
//!
//! Where:
//! - m = total edge weight
//! - A_ij = edge weight between i and j
//! - k_i = degree of node i
//! - γ = resolution parameter
//! - δ(c_i, c_j) = 1 if i and j are in same community
//!
//! The resolution γ controls granularity: above 1 gives smaller
//! communities, below 1 larger ones.
//!
//! ## Multiplex
//!
//! Signed and tagged networks are split into layers over one vertex set and
//! optimized for a single membership maximizing `Σ_l w_l · Q_l`. Negative
//! layer weights turn a layer's edges into repulsion.
//!
//! ## Flow
//!
//! [`Infomap`] minimizes the map equation, the description length of a
//! random walk. It works on a single non-negative layer only.
//!
//! ## Usage
//!
//! ```rust
//! use layerwise::community::{Louvain, PartitionOptimizer, WeightedGraph};
//! use layerwise::QualityFunction;
//!
//! let graph = WeightedGraph::from_edges(3, &[(0, 1, 1.0), (1, 2, 1.0), (0, 2, 1.0)]).unwrap();
//! let communities = Louvain::new()
//!     .optimize(&graph, QualityFunction::Modularity.into(), Some(1))
//!     .unwrap();
//! assert_eq!(communities, vec![0, 0, 0]);
//! ```
//!
//! ## References
//!
//! - Blondel et al. (2008). "Fast unfolding of communities in large networks."
//! - Mucha et al. (2010). "Community structure in time-dependent, multiscale,
//!   and multiplex networks."
//! - Rosvall & Bergstrom (2008). "Maps of random walks on complex networks
//!   reveal community structure."

mod graph;
mod infomap;
mod local_moves;
mod louvain;
mod objective;
mod traits;

pub use graph::WeightedGraph;
pub use infomap::Infomap;
pub use louvain::Louvain;
pub use traits::{FlowDetector, PartitionOptimizer};
