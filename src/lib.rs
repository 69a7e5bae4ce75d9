//! # layerwise
//!
//! Community detection for signed and multi-layer networks.
//!
//! A network with negative weights is split into a positive and a negative
//! layer; a network with `layer` tags is split into one layer per tag. The
//! layers share the vertex set and are optimized jointly for one membership,
//! each layer's quality scaled by a coefficient that keeps a small layer
//! from being swamped by a large one.
//!
//! Pipeline per network: [`matrix`] / [`jgf`] load → [`layers::split`] →
//! [`weights::resolve`] → [`Driver`] → [`writer`].

/// Run-level batch processing over a whole source.
pub mod batch;
pub mod community;
pub mod config;
pub mod diagnostics;
pub mod driver;
/// Error types used across `layerwise`.
pub mod error;
pub mod jgf;
pub mod layers;
pub mod matrix;
pub mod network;
pub mod quality;
pub mod weights;
pub mod writer;

pub use crate::batch::{Pipeline, Summary};
pub use crate::community::{FlowDetector, Infomap, Louvain, PartitionOptimizer, WeightedGraph};
pub use crate::config::{Config, Source};
pub use crate::diagnostics::Diagnostics;
pub use crate::driver::{Detection, Driver, DriverState, Method, Settings};
pub use crate::layers::{Layer, SplittingMode};
pub use crate::network::{Link, Network, Vertex};
pub use crate::quality::{QualityFunction, QualitySpec};
pub use crate::weights::WeightPolicy;

pub use error::{Error, Result};
