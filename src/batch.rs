//! Batch pipelines.
//!
//! Each network runs load → split → resolve → optimize → write on its own.
//! A failure is recorded in the run [`Diagnostics`] and the batch moves on;
//! the failed network is left out of the output.
//!
//! Two sources are supported:
//!
//! - a JSON Graph Format collection, written back as `network.json` (or
//!   `network.json.gz` for a compressed input) with a `Community` attribute
//!   on every vertex;
//! - an index of adjacency matrices, each producing a label listing
//!   `<stem>-community.txt` (and optionally its re-rendered matrix) under
//!   `csv/`, plus an annotated `index.json`.
//!
//! Index entries keep every key they arrive with. Only `filename` and
//! `null-models` are read; `separated-sign` describes how the matrix was
//! produced and is copied through, the sign split being decided from the
//! weights themselves.

use crate::community::{FlowDetector, Infomap, Louvain, PartitionOptimizer};
use crate::config::{Config, Source};
use crate::diagnostics::Diagnostics;
use crate::driver::{Detection, Driver};
use crate::error::{Error, Result};
use crate::network::Network;
use crate::{jgf, matrix, writer};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Name of the processed collection inside the output directory.
pub const NETWORK_OUTPUT: &str = "network.json";
/// Name of the processed collection when the input was compressed.
pub const NETWORK_OUTPUT_GZ: &str = "network.json.gz";
/// Name of the annotated index inside the output directory.
pub const INDEX_OUTPUT: &str = "index.json";
/// Name of the copied label file inside the output directory.
pub const LABEL_OUTPUT: &str = "label.json";
/// Subdirectory for per-matrix outputs.
pub const CSV_OUTPUT: &str = "csv";

const FILENAME_KEY: &str = "filename";
const NULL_MODELS_KEY: &str = "null-models";
const COMMUNITY_FILE_KEY: &str = "community";

/// Counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Networks or matrices that produced a membership.
    pub processed: usize,
    /// Networks or matrices that failed.
    pub failed: usize,
}

/// Runs every network of a source through a [`Driver`].
#[derive(Debug, Clone)]
pub struct Pipeline<O = Louvain, F = Infomap> {
    driver: Driver<O, F>,
    output: PathBuf,
    write_matrix: bool,
    progress: bool,
}

impl Pipeline {
    /// Pipeline configured from `config`, with the built-in engines.
    pub fn from_config(config: &Config, diagnostics: &mut Diagnostics) -> Result<Self> {
        let settings = config.settings(diagnostics)?;
        Ok(Pipeline::new(Driver::new(settings), &config.output)
            .with_write_matrix(config.write_matrix))
    }
}

impl<O: PartitionOptimizer, F: FlowDetector> Pipeline<O, F> {
    /// Pipeline writing into `output`.
    pub fn new(driver: Driver<O, F>, output: impl Into<PathBuf>) -> Self {
        Self {
            driver,
            output: output.into(),
            write_matrix: true,
            progress: false,
        }
    }

    /// Whether to re-render each matrix next to its labels.
    pub fn with_write_matrix(mut self, write_matrix: bool) -> Self {
        self.write_matrix = write_matrix;
        self
    }

    /// Show a progress bar on stderr while processing.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    fn progress_bar(&self, len: usize, message: &'static str) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_message(message);
        bar
    }

    /// Process a whole source.
    pub fn run(&self, source: &Source, diagnostics: &mut Diagnostics) -> Result<Summary> {
        create_dir(&self.output)?;
        match source {
            Source::Network(path) => self.run_collection(path, diagnostics),
            Source::Matrices { index, csv, label } => {
                self.run_matrices(index, csv, label.as_deref(), diagnostics)
            }
        }
    }

    fn detect(&self, network: &Network) -> Result<Detection> {
        let detection = self.driver.detect(network)?;
        let communities: BTreeSet<usize> = detection.membership.iter().copied().collect();
        tracing::info!(
            vertices = network.vertex_count(),
            edges = network.edge_count(),
            layers = detection.layer_names.len(),
            communities = communities.len(),
            "network processed"
        );
        Ok(detection)
    }

    /// Process a JSON Graph Format collection.
    pub fn run_collection(&self, path: &Path, diagnostics: &mut Diagnostics) -> Result<Summary> {
        let mut summary = Summary::default();
        let mut processed = Vec::new();

        let networks = jgf::read_collection(path)?;
        let bar = self.progress_bar(networks.len(), "networks");
        for (i, network) in networks.into_iter().enumerate() {
            bar.inc(1);
            let _span = tracing::info_span!("network", index = i).entered();
            let result = network.and_then(|mut network| {
                let detection = self.detect(&network)?;
                writer::attach_membership(&mut network, &detection.membership)?;
                Ok(network)
            });
            match result {
                Ok(network) => {
                    processed.push(network);
                    summary.processed += 1;
                }
                Err(err) => {
                    diagnostics.error(format!("network {i}: {err}"));
                    summary.failed += 1;
                }
            }
        }
        bar.finish_and_clear();

        let name = if jgf::is_compressed(path) {
            NETWORK_OUTPUT_GZ
        } else {
            NETWORK_OUTPUT
        };
        jgf::write_collection(self.output.join(name), &processed)?;
        Ok(summary)
    }

    /// Process an index of adjacency matrices stored under `csv`.
    pub fn run_matrices(
        &self,
        index: &Path,
        csv: &Path,
        label: Option<&Path>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Summary> {
        let text = std::fs::read_to_string(index).map_err(|e| Error::io(index, e))?;
        let entries: Vec<Map<String, Value>> =
            serde_json::from_str(&text).map_err(|e| Error::InvalidParameter {
                name: "index",
                message: e.to_string(),
            })?;

        let csv_output = self.output.join(CSV_OUTPUT);
        create_dir(&csv_output)?;

        let mut summary = Summary::default();
        let mut annotated = Vec::with_capacity(entries.len());
        let bar = self.progress_bar(entries.len(), "matrices");
        for (i, entry) in entries.into_iter().enumerate() {
            bar.inc(1);
            let Some(filename) = entry.get(FILENAME_KEY).and_then(Value::as_str) else {
                diagnostics.error(format!("index entry {i}: missing '{FILENAME_KEY}'"));
                summary.failed += 1;
                continue;
            };
            let filename = filename.to_string();
            let null_models = null_model_count(&entry);
            let _span = tracing::info_span!("matrix", file = %filename).entered();

            match self.process_matrix(csv, &csv_output, &filename) {
                Ok(community_file) => {
                    let mut entry = entry;
                    let _ = entry.insert(
                        COMMUNITY_FILE_KEY.to_string(),
                        Value::from(community_file),
                    );
                    annotated.push(Value::Object(entry));
                    summary.processed += 1;
                }
                Err(err) => {
                    diagnostics.error(format!("{filename}: {err}"));
                    summary.failed += 1;
                    continue;
                }
            }

            for null_model in null_model_names(&filename, null_models) {
                if !csv.join(&null_model).is_file() {
                    diagnostics.warning(format!("{null_model}: null model not found"));
                    continue;
                }
                match self.process_matrix(csv, &csv_output, &null_model) {
                    Ok(_) => summary.processed += 1,
                    Err(err) => {
                        diagnostics.error(format!("{null_model}: {err}"));
                        summary.failed += 1;
                    }
                }
            }
        }

        bar.finish_and_clear();

        let index_text = serde_json::to_string_pretty(&annotated)?;
        let index_output = self.output.join(INDEX_OUTPUT);
        std::fs::write(&index_output, index_text).map_err(|e| Error::io(&index_output, e))?;

        if let Some(label) = label {
            let label_output = self.output.join(LABEL_OUTPUT);
            let _ = std::fs::copy(label, &label_output).map_err(|e| Error::io(label, e))?;
        }
        Ok(summary)
    }

    /// Returns the name of the label listing written for `filename`.
    fn process_matrix(&self, csv: &Path, csv_output: &Path, filename: &str) -> Result<String> {
        let adjacency = matrix::read_matrix(csv.join(filename))?;
        let (network, props) = matrix::to_network(adjacency.view())?;
        tracing::debug!(
            symmetric = props.is_symmetric,
            weighted = props.is_weighted,
            signed = props.is_signed,
            "matrix loaded"
        );
        let detection = self.detect(&network)?;

        let community_file = community_file_name(filename);
        let community_path = csv_output.join(&community_file);
        if let Some(parent) = community_path.parent() {
            create_dir(parent)?;
        }
        writer::write_membership(&community_path, &detection.membership)?;
        if self.write_matrix {
            writer::write_adjacency(csv_output.join(filename), &network)?;
        }
        Ok(community_file)
    }
}

/// Process the source named by `config`.
pub fn run(config: &Config, diagnostics: &mut Diagnostics) -> Result<Summary> {
    let source = config.source()?;
    Pipeline::from_config(config, diagnostics)?.run(&source, diagnostics)
}

fn create_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| Error::io(path, e))
}

fn null_model_count(entry: &Map<String, Value>) -> usize {
    entry
        .get(NULL_MODELS_KEY)
        .and_then(Value::as_u64)
        .map_or(0, |k| k as usize)
}

/// `dir/stem.ext` with a new stem.
fn with_stem(filename: &str, stem: &str) -> String {
    let path = Path::new(filename);
    let name = match path.extension() {
        Some(ext) => format!("{stem}.{}", ext.to_string_lossy()),
        None => stem.to_string(),
    };
    path.with_file_name(name).to_string_lossy().into_owned()
}

fn file_stem(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `<stem>-null_<i>.<ext>` for `i in 0..count`.
fn null_model_names(filename: &str, count: usize) -> Vec<String> {
    let stem = file_stem(filename);
    (0..count)
        .map(|i| with_stem(filename, &format!("{stem}-null_{i}")))
        .collect()
}

/// `<stem>-community.txt`, in the directory of `filename`.
fn community_file_name(filename: &str) -> String {
    let name = format!("{}-community.txt", file_stem(filename));
    Path::new(filename)
        .with_file_name(name)
        .to_string_lossy()
        .into_owned()
}
