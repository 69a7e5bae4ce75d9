//! JSON Graph Format collections.
//!
//! A collection is `{"graphs": [...]}`, or a single `{"graph": {...}}`.
//! Each graph has:
//!
//! - `directed` (default false);
//! - `metadata`, kept as graph attributes (e.g. `edge-layer-weights`);
//! - `nodes`, either an object keyed by node id or an array of nodes with
//!   an `id`; node order is vertex order;
//! - `edges` with `source` and `target` node ids and optional `metadata`
//!   carrying `weight` and `layer`. A per-edge `directed` flag is accepted
//!   and ignored; the graph-level flag decides.
//!
//! Graphs are decoded one by one, so a malformed graph does not prevent the
//! others from loading.

use crate::error::{Error, Result};
use crate::network::{Link, Network, Vertex};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

const WEIGHT_KEY: &str = "weight";
const LAYER_KEY: &str = "layer";

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    graph: Option<Value>,
    #[serde(default)]
    graphs: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct GraphDoc {
    #[serde(default)]
    directed: bool,
    #[serde(default)]
    metadata: Map<String, Value>,
    #[serde(default)]
    nodes: Option<NodesDoc>,
    #[serde(default)]
    edges: Vec<EdgeDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NodesDoc {
    Keyed(Map<String, Value>),
    Listed(Vec<NodeDoc>),
}

#[derive(Debug, Default, Deserialize)]
struct NodeDoc {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    metadata: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct EdgeDoc {
    source: Value,
    target: Value,
    #[serde(default)]
    metadata: Map<String, Value>,
}

#[derive(Debug, Serialize)]
struct CollectionOut<'a> {
    graphs: Vec<GraphOut<'a>>,
}

#[derive(Debug, Serialize)]
struct GraphOut<'a> {
    directed: bool,
    #[serde(skip_serializing_if = "Map::is_empty")]
    metadata: &'a Map<String, Value>,
    nodes: Map<String, Value>,
    edges: Vec<EdgeOut<'a>>,
}

#[derive(Debug, Serialize)]
struct NodeOut<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'a str>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    metadata: &'a Map<String, Value>,
}

#[derive(Debug, Serialize)]
struct EdgeOut<'a> {
    source: &'a str,
    target: &'a str,
    #[serde(skip_serializing_if = "Map::is_empty")]
    metadata: Map<String, Value>,
}

/// Node ids may be strings or numbers.
fn node_key(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(Error::MalformedNetwork(format!(
            "node id must be a string or number, got {other}"
        ))),
    }
}

fn decode_graph(value: Value) -> Result<Network> {
    let doc: GraphDoc = serde_json::from_value(value)?;
    let mut network = Network::new(doc.directed);
    network.attributes = doc.metadata;

    let nodes: Vec<(String, NodeDoc)> = match doc.nodes {
        None => Vec::new(),
        Some(NodesDoc::Keyed(map)) => map
            .into_iter()
            .map(|(id, node)| -> Result<(String, NodeDoc)> {
                Ok((id, serde_json::from_value(node)?))
            })
            .collect::<Result<_>>()?,
        Some(NodesDoc::Listed(list)) => list
            .into_iter()
            .enumerate()
            .map(|(i, node)| -> Result<(String, NodeDoc)> {
                let id = match &node.id {
                    Some(id) => node_key(id)?,
                    None => i.to_string(),
                };
                Ok((id, node))
            })
            .collect::<Result<_>>()?,
    };

    let mut index: HashMap<String, usize> = HashMap::with_capacity(nodes.len());
    for (id, node) in nodes {
        if index.contains_key(&id) {
            return Err(Error::MalformedNetwork(format!("duplicate node id '{id}'")));
        }
        let vertex = Vertex {
            id: id.clone(),
            label: node.label,
            attributes: node.metadata,
        };
        let _ = index.insert(id, network.add_vertex(vertex));
    }

    for edge in doc.edges {
        let lookup = |value: &Value| -> Result<usize> {
            let key = node_key(value)?;
            index.get(&key).copied().ok_or_else(|| {
                Error::MalformedNetwork(format!("edge references unknown node '{key}'"))
            })
        };
        let source = lookup(&edge.source)?;
        let target = lookup(&edge.target)?;

        let mut attributes = edge.metadata;
        let weight = match attributes.remove(WEIGHT_KEY) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value.as_f64().ok_or_else(|| {
                Error::MalformedNetwork(format!("edge weight {value} is not a number"))
            })?),
        };
        let layer = match attributes.remove(LAYER_KEY) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
        };
        network.add_edge(
            source,
            target,
            Link {
                weight,
                layer,
                attributes,
            },
        )?;
    }
    Ok(network)
}

/// Decode a collection from text.
///
/// The outer `Result` fails when the document itself is unusable; each
/// inner `Result` is one graph.
pub fn parse_collection(text: &str) -> Result<Vec<Result<Network>>> {
    let doc: Document = serde_json::from_str(text)?;
    let values = match (doc.graphs, doc.graph) {
        (Some(graphs), _) => graphs,
        (None, Some(graph)) => vec![graph],
        (None, None) => {
            return Err(Error::MalformedNetwork(
                "document has neither 'graphs' nor 'graph'".to_string(),
            ))
        }
    };
    Ok(values.into_iter().map(decode_graph).collect())
}

/// Whether `path` names a gzip-compressed collection.
pub fn is_compressed(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Read a collection from disk, decompressing `.gz` files.
pub fn read_collection(path: impl AsRef<Path>) -> Result<Vec<Result<Network>>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut text = String::new();
    let read = if is_compressed(path) {
        GzDecoder::new(file).read_to_string(&mut text)
    } else {
        BufReader::new(file).read_to_string(&mut text)
    };
    let _ = read.map_err(|e| Error::io(path, e))?;
    parse_collection(&text)
}

fn encode_graph(network: &Network) -> Result<GraphOut<'_>> {
    let ids: Vec<&str> = network.vertices().map(|v| v.id.as_str()).collect();
    let mut nodes = Map::new();
    for vertex in network.vertices() {
        let node = NodeOut {
            label: vertex.label.as_deref(),
            metadata: &vertex.attributes,
        };
        let _ = nodes.insert(vertex.id.clone(), serde_json::to_value(node)?);
    }

    let edges = network
        .edges()
        .map(|(s, t, link)| {
            let mut metadata = Map::new();
            if let Some(w) = link.weight {
                let _ = metadata.insert(WEIGHT_KEY.to_string(), Value::from(w));
            }
            if let Some(layer) = &link.layer {
                let _ = metadata.insert(LAYER_KEY.to_string(), Value::from(layer.as_str()));
            }
            metadata.extend(link.attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
            EdgeOut {
                source: ids[s],
                target: ids[t],
                metadata,
            }
        })
        .collect();

    Ok(GraphOut {
        directed: network.is_directed(),
        metadata: &network.attributes,
        nodes,
        edges,
    })
}

/// Encode networks as a `{"graphs": [...]}` collection.
pub fn to_json(networks: &[Network]) -> Result<String> {
    let graphs = networks.iter().map(encode_graph).collect::<Result<Vec<_>>>()?;
    Ok(serde_json::to_string_pretty(&CollectionOut { graphs })?)
}

/// Write networks as a collection, gzip-compressed when `path` ends in `.gz`.
pub fn write_collection(path: impl AsRef<Path>, networks: &[Network]) -> Result<()> {
    let path = path.as_ref();
    let text = to_json(networks)?;
    if !is_compressed(path) {
        return std::fs::write(path, text).map_err(|e| Error::io(path, e));
    }
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder
        .write_all(text.as_bytes())
        .map_err(|e| Error::io(path, e))?;
    let _ = encoder.finish().map_err(|e| Error::io(path, e))?;
    Ok(())
}
