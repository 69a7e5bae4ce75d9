//! Membership output.
//!
//! Labels go back onto the original, unsplit network in vertex order. Ids
//! are written exactly as the engine produced them.

use crate::error::{Error, Result};
use crate::matrix;
use crate::network::Network;
use std::fmt::Write as _;
use std::path::Path;

/// Vertex attribute holding the community id.
pub const COMMUNITY_KEY: &str = "Community";

/// Store `membership` as the `Community` attribute of every vertex.
pub fn attach_membership(network: &mut Network, membership: &[usize]) -> Result<()> {
    network.set_vertex_labels(COMMUNITY_KEY, membership)
}

/// One integer label per line.
pub fn render_membership(membership: &[usize]) -> String {
    let mut out = String::with_capacity(membership.len() * 3);
    for label in membership {
        let _ = writeln!(out, "{label}");
    }
    out
}

/// Write the [`render_membership`] listing to `path`.
pub fn write_membership(path: impl AsRef<Path>, membership: &[usize]) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, render_membership(membership)).map_err(|e| Error::io(path, e))
}

/// Write the adjacency matrix of `network` to `path`.
pub fn write_adjacency(path: impl AsRef<Path>, network: &Network) -> Result<()> {
    matrix::write_matrix(path, matrix::from_network(network).view())
}
