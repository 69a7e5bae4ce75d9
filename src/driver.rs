//! Optimization driver.
//!
//! Takes one network from input to membership:
//!
//! ```text
//! Idle → FamilySelected → SingleLayer ─┐
//!                       └→ Multiplex ──┴→ Completed
//! ```
//!
//! Any unmet precondition ends in `Failed` with a typed [`Error`]. A failure
//! is scoped to the network being processed; the driver holds no state
//! between networks.
//!
//! Preconditions checked before any engine runs:
//!
//! - a family that forbids weights ([`QualityFunction::Significance`]) on a
//!   weighted network fails with [`Error::UnsupportedCombination`];
//! - [`Method::Infomap`] on a signed or multi-layer network fails with
//!   [`Error::IncompatibleMethod`].

use crate::community::{FlowDetector, Infomap, Louvain, PartitionOptimizer, WeightedGraph};
use crate::error::{Error, Result};
use crate::layers::{self, SplittingMode};
use crate::network::Network;
use crate::quality::{QualityFunction, QualitySpec};
use crate::weights::{self, WeightPolicy};
use std::fmt;
use std::str::FromStr;

/// Community detection method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// Quality optimization (single-layer or multiplex).
    #[default]
    Louvain,
    /// Flow-based map equation; single non-negative layer only.
    Infomap,
}

impl Method {
    /// Configuration name.
    pub fn name(self) -> &'static str {
        match self {
            Method::Louvain => "louvain",
            Method::Infomap => "infomap",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "louvain" => Ok(Method::Louvain),
            "infomap" => Ok(Method::Infomap),
            _ => Err(Error::InvalidMethod(s.to_string())),
        }
    }
}

/// Where the driver is in processing one network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Nothing done yet.
    Idle,
    /// Family and method checked against the network.
    FamilySelected,
    /// Dispatched to the single-layer engine.
    SingleLayer,
    /// Dispatched to the multiplex engine.
    Multiplex,
    /// Membership produced.
    Completed,
    /// A precondition or the engine failed.
    Failed,
}

/// Settings constant for a whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Detection method.
    pub method: Method,
    /// Quality family and resolution.
    pub quality: QualitySpec,
    /// Layer weight rescaling.
    pub policy: WeightPolicy,
    /// Independent Infomap runs.
    pub infomap_trials: usize,
    /// Seed; `None` gives run-to-run variation in ties.
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            method: Method::Louvain,
            quality: QualityFunction::Modularity.into(),
            policy: WeightPolicy::AsymmetricNegative,
            infomap_trials: 10,
            seed: None,
        }
    }
}

/// Result of processing one network.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Community id per vertex, in vertex order.
    pub membership: Vec<usize>,
    /// How the network was split.
    pub mode: SplittingMode,
    /// Layer names, in optimization order.
    pub layer_names: Vec<String>,
    /// Resolved layer weights, parallel to `layer_names`.
    pub layer_weights: Vec<f64>,
    /// Quality improvement reported by the multiplex engine.
    pub improvement: Option<f64>,
}

/// Drives one network through splitting, weight resolution and optimization.
///
/// Generic over the engines so they can be replaced in tests.
#[derive(Debug, Clone)]
pub struct Driver<O = Louvain, F = Infomap> {
    settings: Settings,
    optimizer: O,
    flow: F,
}

impl Driver {
    /// Driver using the built-in engines.
    pub fn new(settings: Settings) -> Self {
        Self::with_engines(settings, Louvain::new(), Infomap::new())
    }
}

impl<O: PartitionOptimizer, F: FlowDetector> Driver<O, F> {
    /// Driver using the given engines.
    pub fn with_engines(settings: Settings, optimizer: O, flow: F) -> Self {
        Self {
            settings,
            optimizer,
            flow,
        }
    }

    /// Run settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Compute a membership for `network`.
    pub fn detect(&self, network: &Network) -> Result<Detection> {
        let mut state = DriverState::Idle;
        let result = self.run(network, &mut state);
        if let Err(err) = &result {
            tracing::debug!(from = ?state, error = %err, "driver failed");
            advance(&mut state, DriverState::Failed);
        }
        result
    }

    fn run(&self, network: &Network, state: &mut DriverState) -> Result<Detection> {
        let quality = self.settings.quality;
        let method = self.settings.method;

        if method == Method::Louvain
            && quality.function.forbids_weights()
            && network.is_weighted()
        {
            return Err(Error::UnsupportedCombination {
                quality: quality.function.name(),
                reason: "the network is weighted",
            });
        }
        if method == Method::Infomap && network.is_signed() {
            return Err(Error::IncompatibleMethod {
                method: method.name(),
                reason: "the network has negative weights",
            });
        }
        let mode = SplittingMode::detect(network);
        advance(state, DriverState::FamilySelected);

        let declared = match mode {
            SplittingMode::Tag => network.declared_layer_weights()?,
            _ => None,
        };
        let layers = layers::split(network, mode, declared.as_deref())?;
        if method == Method::Infomap && layers.len() > 1 {
            return Err(Error::IncompatibleMethod {
                method: method.name(),
                reason: "the network has more than one layer",
            });
        }
        let layer_names: Vec<String> = layers.iter().map(|l| l.name.clone()).collect();

        if layers.len() == 1 {
            advance(state, DriverState::SingleLayer);
            let graph = WeightedGraph::from_network(&layers[0].network)?;
            let membership = match method {
                Method::Louvain => self.optimizer.optimize(&graph, quality, self.settings.seed)?,
                Method::Infomap => self.flow.detect_flow(
                    &graph,
                    self.settings.infomap_trials,
                    self.settings.seed,
                )?,
            };
            advance(state, DriverState::Completed);
            return Ok(Detection {
                membership,
                mode,
                layer_names,
                layer_weights: vec![1.0],
                improvement: None,
            });
        }

        let declared_weights: Vec<f64> = layers.iter().map(|l| l.declared_weight).collect();
        let edge_counts: Vec<usize> = layers.iter().map(|l| l.edge_count()).collect();
        let layer_weights = weights::resolve(
            quality.function,
            &declared_weights,
            &edge_counts,
            mode,
            self.settings.policy,
        )?;
        tracing::debug!(
            ?layer_names,
            ?edge_counts,
            ?layer_weights,
            "resolved layer weights"
        );

        advance(state, DriverState::Multiplex);
        let graphs = layers
            .iter()
            .map(|l| WeightedGraph::from_network(&l.network))
            .collect::<Result<Vec<_>>>()?;
        let (membership, improvement) = self.optimizer.optimize_multiplex(
            &graphs,
            &layer_weights,
            quality,
            self.settings.seed,
        )?;
        if membership.len() != network.vertex_count() {
            return Err(Error::UpstreamOptimizerFailure(format!(
                "membership has {} entries for {} vertices",
                membership.len(),
                network.vertex_count()
            )));
        }
        advance(state, DriverState::Completed);

        Ok(Detection {
            membership,
            mode,
            layer_names,
            layer_weights,
            improvement: Some(improvement),
        })
    }
}

fn advance(state: &mut DriverState, next: DriverState) {
    tracing::trace!(from = ?*state, to = ?next, "driver transition");
    *state = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Link;
    use serde_json::json;
    use std::cell::RefCell;

    /// Records every engine call.
    #[derive(Default)]
    struct Recording {
        calls: RefCell<Vec<&'static str>>,
        layer_weights: RefCell<Vec<f64>>,
    }

    impl PartitionOptimizer for &Recording {
        fn optimize(
            &self,
            graph: &WeightedGraph,
            _quality: QualitySpec,
            _seed: Option<u64>,
        ) -> Result<Vec<usize>> {
            self.calls.borrow_mut().push("optimize");
            Ok(vec![0; graph.node_count()])
        }

        fn optimize_multiplex(
            &self,
            layers: &[WeightedGraph],
            layer_weights: &[f64],
            _quality: QualitySpec,
            _seed: Option<u64>,
        ) -> Result<(Vec<usize>, f64)> {
            self.calls.borrow_mut().push("optimize_multiplex");
            *self.layer_weights.borrow_mut() = layer_weights.to_vec();
            Ok((vec![0; layers[0].node_count()], 0.0))
        }
    }

    impl FlowDetector for &Recording {
        fn detect_flow(
            &self,
            graph: &WeightedGraph,
            _trials: usize,
            _seed: Option<u64>,
        ) -> Result<Vec<usize>> {
            self.calls.borrow_mut().push("detect_flow");
            Ok(vec![0; graph.node_count()])
        }
    }

    fn settings(method: Method, quality: QualityFunction) -> Settings {
        Settings {
            method,
            quality: quality.into(),
            seed: Some(42),
            ..Settings::default()
        }
    }

    /// Two triangles joined by a single negative edge.
    fn signed_triangles() -> Network {
        let mut net = Network::with_vertices(6, false);
        for (i, j) in [(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5)] {
            net.add_edge(i, j, Link::weighted(1.0)).unwrap();
        }
        net.add_edge(2, 3, Link::weighted(-1.0)).unwrap();
        net
    }

    fn unweighted_triangles() -> Network {
        let mut net = Network::with_vertices(6, false);
        for (i, j) in [(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5), (2, 3)] {
            net.add_edge(i, j, Link::unit()).unwrap();
        }
        net
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("Louvain".parse::<Method>().unwrap(), Method::Louvain);
        assert_eq!(" infomap ".parse::<Method>().unwrap(), Method::Infomap);
        assert_eq!(
            "walktrap".parse::<Method>(),
            Err(Error::InvalidMethod("walktrap".to_string()))
        );
    }

    #[test]
    fn test_signed_triangles_end_to_end() {
        let driver = Driver::new(settings(Method::Louvain, QualityFunction::Modularity));
        let detection = driver.detect(&signed_triangles()).unwrap();

        assert_eq!(detection.mode, SplittingMode::Sign);
        assert_eq!(detection.layer_names, vec!["positive", "negative"]);
        assert_eq!(detection.layer_weights[0], 1.0);
        assert!((detection.layer_weights[1] + 1.0 / 7.0).abs() < 1e-9);

        let m = &detection.membership;
        assert_eq!(m.len(), 6);
        assert!(m[0] == m[1] && m[1] == m[2]);
        assert!(m[3] == m[4] && m[4] == m[5]);
        assert_ne!(m[0], m[3]);
        assert!(detection.improvement.is_some());
    }

    #[test]
    fn test_same_seed_same_membership() {
        let driver = Driver::new(settings(Method::Louvain, QualityFunction::Modularity));
        let net = unweighted_triangles();
        let a = driver.detect(&net).unwrap();
        let b = driver.detect(&net).unwrap();
        assert_eq!(a.membership.len(), 6);
        assert_eq!(a.membership, b.membership);
        assert_eq!(a.mode, SplittingMode::Single);
        assert_eq!(a.improvement, None);
    }

    #[test]
    fn test_significance_weighted_never_calls_engine() {
        let engine = Recording::default();
        let driver = Driver::with_engines(
            settings(Method::Louvain, QualityFunction::Significance),
            &engine,
            &engine,
        );
        let mut net = Network::with_vertices(2, false);
        net.add_edge(0, 1, Link::weighted(2.5)).unwrap();

        let result = driver.detect(&net);
        assert!(matches!(result, Err(Error::UnsupportedCombination { .. })));
        assert!(engine.calls.borrow().is_empty());
    }

    #[test]
    fn test_significance_unweighted_runs() {
        let engine = Recording::default();
        let driver = Driver::with_engines(
            settings(Method::Louvain, QualityFunction::Significance),
            &engine,
            &engine,
        );
        let _ = driver.detect(&unweighted_triangles()).unwrap();
        assert_eq!(*engine.calls.borrow(), vec!["optimize"]);
    }

    #[test]
    fn test_infomap_on_signed_never_calls_engine() {
        let engine = Recording::default();
        let driver = Driver::with_engines(
            settings(Method::Infomap, QualityFunction::Modularity),
            &engine,
            &engine,
        );
        let result = driver.detect(&signed_triangles());
        assert!(matches!(result, Err(Error::IncompatibleMethod { .. })));
        assert!(engine.calls.borrow().is_empty());
    }

    #[test]
    fn test_infomap_on_layers_is_incompatible() {
        let engine = Recording::default();
        let mut net = Network::with_vertices(3, false);
        net.add_edge(0, 1, Link::tagged(None, "friend")).unwrap();
        net.add_edge(1, 2, Link::tagged(None, "work")).unwrap();
        let driver = Driver::with_engines(
            settings(Method::Infomap, QualityFunction::Modularity),
            &engine,
            &engine,
        );
        assert!(matches!(
            driver.detect(&net),
            Err(Error::IncompatibleMethod { .. })
        ));
        assert!(engine.calls.borrow().is_empty());
    }

    #[test]
    fn test_empty_network_has_empty_membership() {
        let net = Network::with_vertices(0, false);
        for method in [Method::Louvain, Method::Infomap] {
            let driver = Driver::new(settings(method, QualityFunction::Modularity));
            let detection = driver.detect(&net).unwrap();
            assert!(detection.membership.is_empty());
            assert_eq!(detection.mode, SplittingMode::Single);
        }
    }

    #[test]
    fn test_infomap_on_one_tag_runs_flow() {
        let engine = Recording::default();
        let mut net = Network::with_vertices(6, false);
        for (i, j) in [(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5), (2, 3)] {
            net.add_edge(i, j, Link::tagged(None, "only")).unwrap();
        }
        let driver = Driver::with_engines(
            settings(Method::Infomap, QualityFunction::Modularity),
            &engine,
            &engine,
        );
        let detection = driver.detect(&net).unwrap();
        assert_eq!(detection.mode, SplittingMode::Tag);
        assert_eq!(detection.layer_names, vec!["only"]);
        assert_eq!(*engine.calls.borrow(), vec!["detect_flow"]);
    }

    #[test]
    fn test_infomap_on_signed_tag_is_incompatible() {
        let mut net = Network::with_vertices(2, false);
        net.add_edge(0, 1, Link::tagged(Some(-1.0), "only")).unwrap();
        let driver = Driver::new(settings(Method::Infomap, QualityFunction::Modularity));
        assert!(matches!(
            driver.detect(&net),
            Err(Error::IncompatibleMethod { .. })
        ));
    }

    #[test]
    fn test_infomap_single_layer_dispatch() {
        let engine = Recording::default();
        let driver = Driver::with_engines(
            settings(Method::Infomap, QualityFunction::Modularity),
            &engine,
            &engine,
        );
        let _ = driver.detect(&unweighted_triangles()).unwrap();
        assert_eq!(*engine.calls.borrow(), vec!["detect_flow"]);
    }

    #[test]
    fn test_declared_tag_weights_reach_engine() {
        let mut net = Network::with_vertices(3, false);
        net.add_edge(0, 1, Link::tagged(None, "a")).unwrap();
        net.add_edge(1, 2, Link::tagged(None, "b")).unwrap();
        net.add_edge(0, 2, Link::tagged(None, "b")).unwrap();
        let _ = net
            .attributes
            .insert("edge-layer-weights".to_string(), json!({"b": 2.0, "a": 1.0}));

        let engine = Recording::default();
        let driver = Driver::with_engines(
            settings(Method::Louvain, QualityFunction::Cpm),
            &engine,
            &engine,
        );
        let detection = driver.detect(&net).unwrap();
        assert_eq!(detection.mode, SplittingMode::Tag);
        assert_eq!(detection.layer_names, vec!["b", "a"]);
        // Tag splits always take the normalized branch: d_i / T.
        assert_eq!(*engine.layer_weights.borrow(), vec![2.0 / 3.0, 1.0 / 3.0]);
        assert_eq!(*engine.calls.borrow(), vec!["optimize_multiplex"]);
    }

    #[test]
    fn test_normalized_policy_on_signed() {
        let engine = Recording::default();
        let driver = Driver::with_engines(
            Settings {
                policy: WeightPolicy::Normalized,
                ..settings(Method::Louvain, QualityFunction::Modularity)
            },
            &engine,
            &engine,
        );
        let detection = driver.detect(&signed_triangles()).unwrap();
        assert!((detection.layer_weights[0] - 6.0 / 7.0).abs() < 1e-9);
        assert!((detection.layer_weights[1] + 1.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_rbconfiguration_asymmetric_weights() {
        let engine = Recording::default();
        let driver = Driver::with_engines(
            settings(Method::Louvain, QualityFunction::RbConfiguration),
            &engine,
            &engine,
        );
        let detection = driver.detect(&signed_triangles()).unwrap();
        assert!((detection.layer_weights[0] - 1.0 / 6.0).abs() < 1e-9);
        assert!((detection.layer_weights[1] + 1.0 / 7.0).abs() < 1e-9);
    }
}
