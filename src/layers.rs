//! Splitting a network into layers.
//!
//! A layer is an edge-filtered view of a network that keeps the whole vertex
//! set, so vertex `i` means the same thing in every layer. Two splitting
//! modes exist and a network uses at most one of them:
//!
//! - [`SplittingMode::Sign`]: `positive` (weight > 0) and `negative`
//!   (weight < 0, stored as magnitude), declared weights `(1, -1)`.
//! - [`SplittingMode::Tag`]: one layer per `layer` tag value.
//!
//! A network with neither negative weights nor tags is a single implicit
//! layer with declared weight 1.

use crate::error::{Error, Result};
use crate::network::{Link, Network};

/// Name of the positive layer in sign mode.
pub const POSITIVE_LAYER: &str = "positive";
/// Name of the negative layer in sign mode.
pub const NEGATIVE_LAYER: &str = "negative";

/// How a network's edges are distributed over layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplittingMode {
    /// No splitting: the network is its own single layer.
    Single,
    /// Split by edge sign.
    Sign,
    /// Split by edge `layer` tag.
    Tag,
}

impl SplittingMode {
    /// Pick the mode a network calls for.
    ///
    /// Tags take precedence over signs: a tagged network with negative
    /// weights is split by tag.
    pub fn detect(network: &Network) -> Self {
        if network.has_layers() {
            SplittingMode::Tag
        } else if network.is_signed() {
            SplittingMode::Sign
        } else {
            SplittingMode::Single
        }
    }
}

/// An edge-filtered view of a network.
#[derive(Debug, Clone)]
pub struct Layer {
    /// Layer name.
    pub name: String,
    /// Weight declared for this layer before resolution.
    pub declared_weight: f64,
    /// Subgraph over the full vertex set.
    pub network: Network,
}

impl Layer {
    /// Number of edges in this layer.
    pub fn edge_count(&self) -> usize {
        self.network.edge_count()
    }
}

/// Split a network according to `mode`.
///
/// In tag mode, `declared` gives the layer order and weights; when it is
/// `None` the tags are taken in order of first occurrence with weight 1.
/// Edges whose tag is not declared belong to no layer.
pub fn split(
    network: &Network,
    mode: SplittingMode,
    declared: Option<&[(String, f64)]>,
) -> Result<Vec<Layer>> {
    match mode {
        SplittingMode::Single => Ok(vec![Layer {
            name: "default".to_string(),
            declared_weight: 1.0,
            network: network.clone(),
        }]),
        SplittingMode::Sign => Ok(split_by_sign(network)),
        SplittingMode::Tag => {
            let table: Vec<(String, f64)> = match declared {
                Some(table) => table.to_vec(),
                None => network
                    .layer_tags()
                    .into_iter()
                    .map(|tag| (tag, 1.0))
                    .collect(),
            };
            if table.is_empty() {
                return Err(Error::InvalidParameter {
                    name: "layers",
                    message: "tag splitting requires at least one layer".to_string(),
                });
            }
            Ok(split_by_tag(network, &table))
        }
    }
}

fn split_by_sign(network: &Network) -> Vec<Layer> {
    let positive = network.edge_subgraph(|link| (link.weight() > 0.0).then(|| link.clone()));
    let negative = network.edge_subgraph(|link| {
        (link.weight() < 0.0).then(|| Link {
            weight: Some(-link.weight()),
            ..link.clone()
        })
    });
    vec![
        Layer {
            name: POSITIVE_LAYER.to_string(),
            declared_weight: 1.0,
            network: positive,
        },
        Layer {
            name: NEGATIVE_LAYER.to_string(),
            declared_weight: -1.0,
            network: negative,
        },
    ]
}

fn split_by_tag(network: &Network, table: &[(String, f64)]) -> Vec<Layer> {
    table
        .iter()
        .map(|(name, weight)| Layer {
            name: name.clone(),
            declared_weight: *weight,
            network: network.edge_subgraph(|link| {
                (link.layer.as_deref() == Some(name.as_str())).then(|| link.clone())
            }),
        })
        .collect()
}
