//! Network data model.
//!
//! A [`Network`] is a fixed vertex set with weighted, optionally layer-tagged
//! edges. Vertex indices are stable and 0-based; every view derived from a
//! network (see [`crate::layers`]) keeps the same vertex set so that indices
//! line up across layers.
//!
//! Edges are stored in a `petgraph` directed graph regardless of
//! [`Network::is_directed`]; an undirected network stores each edge once.

use crate::error::{Error, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde_json::{Map, Value};

/// Graph attribute holding the declared `name -> weight` layer table.
pub const LAYER_WEIGHTS_ATTRIBUTE: &str = "edge-layer-weights";

/// A vertex with its external id and free-form attributes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Vertex {
    /// External identifier (JGF node key, or the row index for matrices).
    pub id: String,
    /// Display label, if any.
    pub label: Option<String>,
    /// Arbitrary attributes carried through to the output.
    pub attributes: Map<String, Value>,
}

impl Vertex {
    /// Vertex with the given id and no attributes.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// An edge payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Link {
    /// Edge weight; `None` means an implicit weight of 1.
    pub weight: Option<f64>,
    /// Layer tag, if the network is multi-layer.
    pub layer: Option<String>,
    /// Remaining attributes, carried through to the output.
    pub attributes: Map<String, Value>,
}

impl Link {
    /// Unweighted, untagged link.
    pub fn unit() -> Self {
        Self::default()
    }

    /// Link with an explicit weight.
    pub fn weighted(weight: f64) -> Self {
        Self {
            weight: Some(weight),
            ..Self::default()
        }
    }

    /// Link with an explicit weight and a layer tag.
    pub fn tagged(weight: Option<f64>, layer: impl Into<String>) -> Self {
        Self {
            weight,
            layer: Some(layer.into()),
            ..Self::default()
        }
    }

    /// Effective weight (1 when absent).
    pub fn weight(&self) -> f64 {
        self.weight.unwrap_or(1.0)
    }
}

/// A network over a fixed vertex set.
#[derive(Debug, Clone, Default)]
pub struct Network {
    graph: DiGraph<Vertex, Link>,
    directed: bool,
    /// Graph-level attributes (e.g. [`LAYER_WEIGHTS_ATTRIBUTE`]).
    pub attributes: Map<String, Value>,
}

impl Network {
    /// Empty network.
    pub fn new(directed: bool) -> Self {
        Self {
            graph: DiGraph::new(),
            directed,
            attributes: Map::new(),
        }
    }

    /// Network with `n` vertices whose ids are their indices.
    pub fn with_vertices(n: usize, directed: bool) -> Self {
        let mut network = Self::new(directed);
        for i in 0..n {
            network.add_vertex(Vertex::new(i.to_string()));
        }
        network
    }

    /// Append a vertex and return its index.
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        self.graph.add_node(vertex).index()
    }

    /// Add an edge between two existing vertices.
    pub fn add_edge(&mut self, source: usize, target: usize, link: Link) -> Result<()> {
        let n = self.vertex_count();
        if source >= n || target >= n {
            return Err(Error::MalformedNetwork(format!(
                "edge ({source}, {target}) references a vertex outside 0..{n}"
            )));
        }
        let _ = self
            .graph
            .add_edge(NodeIndex::new(source), NodeIndex::new(target), link);
        Ok(())
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether edges are directed.
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Vertices in index order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.graph.node_weights()
    }

    /// Edges as `(source, target, link)` in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, &Link)> {
        self.graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index(), e.weight()))
    }

    /// True iff some edge carries an explicit weight.
    pub fn has_weight_attribute(&self) -> bool {
        self.graph.edge_weights().any(|l| l.weight.is_some())
    }

    /// True iff some edge weight differs from 1.
    pub fn is_weighted(&self) -> bool {
        self.graph.edge_weights().any(|l| l.weight() != 1.0)
    }

    /// True iff some edge weight is negative.
    pub fn is_signed(&self) -> bool {
        self.graph.edge_weights().any(|l| l.weight() < 0.0)
    }

    /// True iff some edge carries a layer tag.
    pub fn has_layers(&self) -> bool {
        self.graph.edge_weights().any(|l| l.layer.is_some())
    }

    /// Distinct layer tags in order of first occurrence.
    pub fn layer_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for tag in self.graph.edge_weights().filter_map(|l| l.layer.as_ref()) {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
        tags
    }

    /// Layer table declared in the graph attributes, in declaration order.
    ///
    /// Returns `Ok(None)` when the attribute is absent.
    pub fn declared_layer_weights(&self) -> Result<Option<Vec<(String, f64)>>> {
        let Some(value) = self.attributes.get(LAYER_WEIGHTS_ATTRIBUTE) else {
            return Ok(None);
        };
        let table = value.as_object().ok_or_else(|| {
            Error::MalformedNetwork(format!("'{LAYER_WEIGHTS_ATTRIBUTE}' must be an object"))
        })?;
        table
            .iter()
            .map(|(name, w)| {
                w.as_f64().map(|w| (name.clone(), w)).ok_or_else(|| {
                    Error::MalformedNetwork(format!("layer weight for '{name}' is not a number"))
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    /// Keep only the edges accepted by `edge_map`, retaining every vertex.
    ///
    /// Vertex indices of the result equal those of `self`.
    pub fn edge_subgraph<F>(&self, mut edge_map: F) -> Network
    where
        F: FnMut(&Link) -> Option<Link>,
    {
        let graph = self
            .graph
            .filter_map(|_, v| Some(v.clone()), |_, link| edge_map(link));
        Network {
            graph,
            directed: self.directed,
            attributes: self.attributes.clone(),
        }
    }

    /// Store a per-vertex integer label under `key`.
    pub fn set_vertex_labels(&mut self, key: &str, labels: &[usize]) -> Result<()> {
        if labels.len() != self.vertex_count() {
            return Err(Error::DimensionMismatch {
                expected: self.vertex_count(),
                found: labels.len(),
            });
        }
        for (vertex, &label) in self.graph.node_weights_mut().zip(labels) {
            let _ = vertex.attributes.insert(key.to_string(), Value::from(label));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn triangle() -> Network {
        let mut net = Network::with_vertices(3, false);
        net.add_edge(0, 1, Link::unit()).unwrap();
        net.add_edge(1, 2, Link::weighted(1.0)).unwrap();
        net.add_edge(0, 2, Link::weighted(-2.0)).unwrap();
        net
    }

    #[test]
    fn test_properties() {
        let net = triangle();
        assert_eq!(net.vertex_count(), 3);
        assert_eq!(net.edge_count(), 3);
        assert!(net.has_weight_attribute());
        assert!(net.is_weighted());
        assert!(net.is_signed());
        assert!(!net.has_layers());
    }

    #[test]
    fn test_unit_weights_are_not_weighted() {
        let mut net = Network::with_vertices(2, false);
        net.add_edge(0, 1, Link::weighted(1.0)).unwrap();
        assert!(net.has_weight_attribute());
        assert!(!net.is_weighted());
    }

    #[test]
    fn test_edge_out_of_range() {
        let mut net = Network::with_vertices(2, false);
        assert!(net.add_edge(0, 5, Link::unit()).is_err());
    }

    #[test]
    fn test_clone_is_independent() {
        let net = triangle();
        let mut copy = net.clone();
        copy.add_edge(1, 1, Link::unit()).unwrap();
        assert_eq!(net.edge_count(), 3);
        assert_eq!(copy.edge_count(), 4);
        let before: Vec<_> = net.edges().map(|(i, j, l)| (i, j, l.weight())).collect();
        let after: Vec<_> = copy.edges().take(3).map(|(i, j, l)| (i, j, l.weight())).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_layer_tags_first_occurrence() {
        let mut net = Network::with_vertices(3, false);
        net.add_edge(0, 1, Link::tagged(None, "social")).unwrap();
        net.add_edge(1, 2, Link::tagged(None, "email")).unwrap();
        net.add_edge(0, 2, Link::tagged(None, "social")).unwrap();
        assert_eq!(net.layer_tags(), vec!["social", "email"]);
    }

    #[test]
    fn test_declared_layer_weights_keep_order() {
        let mut net = Network::with_vertices(1, false);
        let _ = net
            .attributes
            .insert(LAYER_WEIGHTS_ATTRIBUTE.into(), json!({"z": 2.0, "a": -1}));
        let declared = net.declared_layer_weights().unwrap().unwrap();
        assert_eq!(declared, vec![("z".to_string(), 2.0), ("a".to_string(), -1.0)]);
    }

    #[test]
    fn test_declared_layer_weights_rejects_strings() {
        let mut net = Network::with_vertices(1, false);
        let _ = net
            .attributes
            .insert(LAYER_WEIGHTS_ATTRIBUTE.into(), json!({"a": "heavy"}));
        assert!(matches!(
            net.declared_layer_weights(),
            Err(Error::MalformedNetwork(_))
        ));
    }

    #[test]
    fn test_edge_subgraph_keeps_vertices() {
        let net = triangle();
        let sub = net.edge_subgraph(|l| (l.weight() < 0.0).then(|| l.clone()));
        assert_eq!(sub.vertex_count(), 3);
        assert_eq!(sub.edge_count(), 1);
        let (s, t, _) = sub.edges().next().unwrap();
        assert_eq!((s, t), (0, 2));
    }

    #[test]
    fn test_set_vertex_labels() {
        let mut net = triangle();
        net.set_vertex_labels("Community", &[0, 0, 1]).unwrap();
        let labels: Vec<_> = net
            .vertices()
            .map(|v| v.attributes["Community"].as_u64().unwrap())
            .collect();
        assert_eq!(labels, vec![0, 0, 1]);
        assert!(net.set_vertex_labels("Community", &[0]).is_err());
    }
}
