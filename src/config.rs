//! Run configuration.
//!
//! A JSON document with kebab-case keys. Every key is optional; the source
//! must be given either as `network` (a JSON Graph Format collection) or as
//! `index` + `csv` (a batch of adjacency matrices).

use crate::diagnostics::Diagnostics;
use crate::driver::{Method, Settings};
use crate::error::{Error, Result};
use crate::quality::{QualityFunction, QualitySpec};
use crate::weights::WeightPolicy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Raw configuration as read from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// `louvain` or `infomap`.
    #[serde(default = "default_method")]
    pub method: String,

    /// Quality family name; empty or absent means modularity.
    #[serde(default)]
    pub louvain_quality_function: Option<String>,

    /// Resolution; anything that is not a finite number falls back to 1.
    #[serde(default)]
    pub louvain_resolution: Option<Value>,

    /// Infomap trials; absent or 0 means the default.
    #[serde(default)]
    pub infomap_trials: Option<usize>,

    /// Rebalance the negative layer of a sign split by edge counts.
    #[serde(default = "default_true", rename = "assymetric-negative")]
    pub asymmetric_negative: bool,

    /// Optional seed for reproducible tie-breaking.
    #[serde(default)]
    pub seed: Option<u64>,

    /// JSON Graph Format collection.
    #[serde(default)]
    pub network: Option<PathBuf>,

    /// Matrix batch index.
    #[serde(default)]
    pub index: Option<PathBuf>,

    /// Directory holding the indexed matrices.
    #[serde(default)]
    pub csv: Option<PathBuf>,

    /// Label file copied next to the batch output.
    #[serde(default)]
    pub label: Option<PathBuf>,

    /// Output directory.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Re-render each optimized matrix into the output.
    #[serde(default = "default_true")]
    pub write_matrix: bool,

    /// Status record path.
    #[serde(default = "default_status")]
    pub status: PathBuf,
}

/// Where the networks come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A JSON Graph Format collection.
    Network(PathBuf),
    /// A batch of adjacency matrices.
    Matrices {
        /// JSON array of matrix entries.
        index: PathBuf,
        /// Directory holding the matrix files.
        csv: PathBuf,
        /// Label file copied to the output.
        label: Option<PathBuf>,
    },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            method: default_method(),
            louvain_quality_function: None,
            louvain_resolution: None,
            infomap_trials: None,
            asymmetric_negative: true,
            seed: None,
            network: None,
            index: None,
            csv: None,
            label: None,
            output: default_output(),
            write_matrix: true,
            status: default_status(),
        }
    }
}

impl Config {
    /// Parse a configuration document.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::InvalidParameter {
            name: "config",
            message: e.to_string(),
        })
    }

    /// Read a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&text)
    }

    /// Input source.
    pub fn source(&self) -> Result<Source> {
        if let Some(network) = &self.network {
            return Ok(Source::Network(network.clone()));
        }
        match (&self.index, &self.csv) {
            (Some(index), Some(csv)) => Ok(Source::Matrices {
                index: index.clone(),
                csv: csv.clone(),
                label: self.label.clone(),
            }),
            _ => Err(Error::InvalidParameter {
                name: "network",
                message: "either 'network' or both 'index' and 'csv' must be set".to_string(),
            }),
        }
    }

    /// Resolution, falling back to 1 with a warning when unusable.
    fn resolution(&self, diagnostics: &mut Diagnostics) -> f64 {
        let parsed = match &self.louvain_resolution {
            None | Some(Value::Null) => return DEFAULT_RESOLUTION,
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            Some(_) => None,
        };
        match parsed {
            Some(r) if r.is_finite() => r,
            _ => {
                diagnostics.warning(format!(
                    "louvain-resolution {} is not a finite number, using {DEFAULT_RESOLUTION}",
                    self.louvain_resolution.as_ref().map_or(Value::Null, Value::clone)
                ));
                DEFAULT_RESOLUTION
            }
        }
    }

    /// Typed run settings.
    ///
    /// Fails on an unknown method or quality family; an unusable resolution
    /// is only a warning.
    pub fn settings(&self, diagnostics: &mut Diagnostics) -> Result<Settings> {
        let method: Method = self.method.parse()?;
        let function = match self.louvain_quality_function.as_deref().map(str::trim) {
            None | Some("") => QualityFunction::Modularity,
            Some(name) => name.parse()?,
        };
        let quality = QualitySpec::new(function, self.resolution(diagnostics))?;
        let infomap_trials = match self.infomap_trials {
            None | Some(0) => DEFAULT_INFOMAP_TRIALS,
            Some(trials) => trials,
        };
        Ok(Settings {
            method,
            quality,
            policy: WeightPolicy::from_flag(self.asymmetric_negative),
            infomap_trials,
            seed: self.seed,
        })
    }
}

const DEFAULT_RESOLUTION: f64 = 1.0;
const DEFAULT_INFOMAP_TRIALS: usize = 10;

fn default_method() -> String {
    Method::Louvain.name().to_string()
}
fn default_true() -> bool {
    true
}
fn default_output() -> PathBuf {
    PathBuf::from("output")
}
fn default_status() -> PathBuf {
    PathBuf::from("product.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());

        let mut diagnostics = Diagnostics::new();
        let settings = config.settings(&mut diagnostics).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(diagnostics.warnings.is_empty());
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_json(
            r#"{
                "method": "Louvain",
                "louvain-quality-function": "CPM",
                "louvain-resolution": 0.25,
                "infomap-trials": 3,
                "assymetric-negative": false,
                "seed": 7,
                "index": "in/index.json",
                "csv": "in/csv",
                "write-matrix": false
            }"#,
        )
        .unwrap();
        let mut diagnostics = Diagnostics::new();
        let settings = config.settings(&mut diagnostics).unwrap();
        assert_eq!(settings.quality.function, QualityFunction::Cpm);
        assert_eq!(settings.quality.resolution(), Some(0.25));
        assert_eq!(settings.infomap_trials, 3);
        assert_eq!(settings.policy, WeightPolicy::Normalized);
        assert_eq!(settings.seed, Some(7));
        assert!(!config.write_matrix);
        assert_eq!(
            config.source().unwrap(),
            Source::Matrices {
                index: PathBuf::from("in/index.json"),
                csv: PathBuf::from("in/csv"),
                label: None,
            }
        );
    }

    #[test]
    fn test_resolution_fallback_warns() {
        let text = r#"{"louvain-quality-function": "rber", "louvain-resolution": "abc"}"#;
        let config = Config::from_json(text).unwrap();
        let mut diagnostics = Diagnostics::new();
        let settings = config.settings(&mut diagnostics).unwrap();
        assert_eq!(settings.quality.resolution(), Some(1.0));
        assert_eq!(diagnostics.warnings.len(), 1);

        let config = Config::from_json(r#"{"louvain-resolution": "0.5"}"#).unwrap();
        let mut diagnostics = Diagnostics::new();
        let _ = config.settings(&mut diagnostics).unwrap();
        assert!(diagnostics.warnings.is_empty());
    }

    #[test]
    fn test_unknown_names() {
        let mut diagnostics = Diagnostics::new();
        let config = Config::from_json(r#"{"louvain-quality-function": "modular"}"#).unwrap();
        assert_eq!(
            config.settings(&mut diagnostics),
            Err(Error::InvalidQualityFunction("modular".to_string()))
        );

        let config = Config::from_json(r#"{"method": "leiden"}"#).unwrap();
        assert!(matches!(
            config.settings(&mut diagnostics),
            Err(Error::InvalidMethod(_))
        ));
    }

    #[test]
    fn test_missing_source() {
        let config = Config::from_json(r#"{"index": "index.json"}"#).unwrap();
        assert!(config.source().is_err());

        let config = Config::from_json(r#"{"network": "net.json", "index": "i"}"#).unwrap();
        assert_eq!(
            config.source().unwrap(),
            Source::Network(PathBuf::from("net.json"))
        );
    }
}
