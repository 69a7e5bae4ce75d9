//! Dense adjacency matrices.
//!
//! Parses a numeric matrix, detects its structural properties, and turns it
//! into a [`Network`]. The reverse direction renders a network back into a
//! dense matrix for serialization.
//!
//! ## Structural properties
//!
//! | Property | Definition |
//! |----------|------------|
//! | symmetric | `|A - Aᵀ| <= atol + rtol·|Aᵀ|` element-wise, `rtol = 1e-5`, `atol = 1e-8` |
//! | weighted | some nonzero entry differs from 1 |
//! | signed | some entry is negative |
//!
//! Symmetric matrices yield an undirected network built from the upper
//! triangle (diagonal included). Anything else yields one directed edge per
//! nonzero entry. Zero entries are never edges.

use crate::error::{Error, Result};
use crate::network::{Link, Network};
use ndarray::{Array2, ArrayView2};
use std::fmt::Write as _;
use std::path::Path;

/// Relative tolerance of the symmetry test.
pub const SYMMETRY_RTOL: f64 = 1e-5;
/// Absolute tolerance of the symmetry test.
pub const SYMMETRY_ATOL: f64 = 1e-8;

/// Structural flags detected on a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixProperties {
    /// Equal to its transpose within tolerance.
    pub is_symmetric: bool,
    /// Some nonzero entry differs from 1.
    pub is_weighted: bool,
    /// Some entry is negative.
    pub is_signed: bool,
}

/// Parse a matrix from text.
///
/// Rows are lines; cells are separated by commas, tabs or spaces. Blank
/// lines are skipped. Runs of whitespace count as one separator, but every
/// comma must have a cell on both sides. Every row must have the same
/// number of cells and every cell must be a finite number.
pub fn parse_matrix(text: &str) -> Result<Array2<f64>> {
    let mut values = Vec::new();
    let mut cols: Option<usize> = None;
    let mut rows = 0;

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut count = 0;
        for field in line.split(',') {
            let mut cells = field.split_whitespace().peekable();
            if cells.peek().is_none() {
                return Err(Error::malformed_matrix(
                    Some(lineno + 1),
                    format!("empty cell after column {count}"),
                ));
            }
            for cell in cells {
                let value: f64 = cell.parse().map_err(|_| {
                    Error::malformed_matrix(Some(lineno + 1), format!("'{cell}' is not a number"))
                })?;
                if !value.is_finite() {
                    return Err(Error::malformed_matrix(
                        Some(lineno + 1),
                        format!("'{cell}' is not finite"),
                    ));
                }
                values.push(value);
                count += 1;
            }
        }
        match cols {
            None => cols = Some(count),
            Some(expected) if expected != count => {
                return Err(Error::malformed_matrix(
                    Some(lineno + 1),
                    format!("expected {expected} columns, found {count}"),
                ));
            }
            Some(_) => {}
        }
        rows += 1;
    }

    let cols = cols.ok_or_else(|| Error::malformed_matrix(None, "no rows"))?;
    Array2::from_shape_vec((rows, cols), values)
        .map_err(|e| Error::malformed_matrix(None, e.to_string()))
}

/// Read and parse a matrix file.
pub fn read_matrix(path: impl AsRef<Path>) -> Result<Array2<f64>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_matrix(&text)
}

/// Detect structural properties. The matrix must be square.
pub fn properties(matrix: ArrayView2<'_, f64>) -> Result<MatrixProperties> {
    let (rows, cols) = matrix.dim();
    if rows != cols {
        return Err(Error::malformed_matrix(
            None,
            format!("adjacency matrix must be square, got {rows}x{cols}"),
        ));
    }

    let is_symmetric = matrix
        .indexed_iter()
        .all(|((i, j), &a)| {
            let b = matrix[(j, i)];
            (a - b).abs() <= SYMMETRY_ATOL + SYMMETRY_RTOL * b.abs()
        });
    let is_weighted = matrix.iter().any(|&v| v != 0.0 && v != 1.0);
    let is_signed = matrix.iter().any(|&v| v < 0.0);

    Ok(MatrixProperties {
        is_symmetric,
        is_weighted,
        is_signed,
    })
}

/// Build a network from a square adjacency matrix.
pub fn to_network(matrix: ArrayView2<'_, f64>) -> Result<(Network, MatrixProperties)> {
    let props = properties(matrix)?;
    let n = matrix.nrows();
    if n == 0 {
        return Err(Error::EmptyInput);
    }

    let mut network = Network::with_vertices(n, !props.is_symmetric);
    for ((i, j), &w) in matrix.indexed_iter() {
        if w == 0.0 || (props.is_symmetric && j < i) {
            continue;
        }
        network.add_edge(i, j, Link::weighted(w))?;
    }
    Ok((network, props))
}

/// Render a network as a dense matrix. Undirected edges fill both triangles.
pub fn from_network(network: &Network) -> Array2<f64> {
    let n = network.vertex_count();
    let mut matrix = Array2::<f64>::zeros((n, n));
    for (i, j, link) in network.edges() {
        matrix[(i, j)] += link.weight();
        if !network.is_directed() && i != j {
            matrix[(j, i)] += link.weight();
        }
    }
    matrix
}

/// Comma-separated text rendering, one row per line.
pub fn render_matrix(matrix: ArrayView2<'_, f64>) -> String {
    let mut out = String::new();
    for row in matrix.rows() {
        let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        let _ = writeln!(out, "{}", cells.join(","));
    }
    out
}

/// Write a matrix to `path` in [`render_matrix`] form.
pub fn write_matrix(path: impl AsRef<Path>, matrix: ArrayView2<'_, f64>) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, render_matrix(matrix)).map_err(|e| Error::io(path, e))
}
