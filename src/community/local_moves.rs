//! Local moving phase shared by the optimizers.

use super::graph::WeightedGraph;
use super::objective::Objective;
use rand::prelude::*;
use std::collections::BTreeMap;

/// Minimum gain for a move to count as an improvement.
const MIN_GAIN: f64 = 1e-10;

/// RNG for one optimizer run.
///
/// Without a seed a fresh one is drawn from the thread RNG, so unseeded runs
/// may break ties differently from run to run.
pub(crate) fn seeded_rng(seed: Option<u64>) -> StdRng {
    let seed = seed.unwrap_or_else(|| {
        let drawn = rand::rng().random::<u64>();
        tracing::debug!(seed = drawn, "no seed configured, drew one");
        drawn
    });
    StdRng::seed_from_u64(seed)
}

/// Move nodes greedily until no move improves the objective.
///
/// Starts from singletons; `objective` must describe that same starting
/// partition. `graphs` are the layers, all over the same nodes. Candidate
/// targets are the neighbor communities over every layer plus one empty
/// community. Returns the assignment and whether any node moved.
pub(crate) fn local_moving<O: Objective>(
    graphs: &[WeightedGraph],
    objective: &mut O,
    rng: &mut StdRng,
    max_iter: usize,
) -> (Vec<usize>, bool) {
    let n = graphs.first().map_or(0, WeightedGraph::node_count);
    let n_layers = graphs.len();
    let mut assignment: Vec<usize> = (0..n).collect();
    let mut members = vec![1usize; n];
    let mut empty: Vec<usize> = Vec::new();
    let mut any_moved = false;

    let mut order: Vec<usize> = (0..n).collect();
    for _iter in 0..max_iter {
        let mut improved = false;
        order.shuffle(rng);

        for &node in &order {
            let from = assignment[node];

            // Weight from node to each neighboring community, per layer.
            // Sorted keys keep seeded runs reproducible.
            let mut links: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
            for (layer, graph) in graphs.iter().enumerate() {
                for &(neighbor, w) in graph.neighbors(node) {
                    links
                        .entry(assignment[neighbor])
                        .or_insert_with(|| vec![0.0; n_layers])[layer] += w;
                }
            }
            if members[from] > 1 {
                if let Some(&vacant) = empty.last() {
                    let _ = links.entry(vacant).or_insert_with(|| vec![0.0; n_layers]);
                }
            }
            let w_from = links
                .get(&from)
                .cloned()
                .unwrap_or_else(|| vec![0.0; n_layers]);

            let mut best = from;
            let mut best_gain = 0.0;
            for (&target, w_to) in &links {
                if target == from {
                    continue;
                }
                let gain = objective.gain(node, from, target, &w_from, w_to);
                if gain > best_gain + MIN_GAIN {
                    best_gain = gain;
                    best = target;
                }
            }

            if best != from {
                if let Some(w_to) = links.get(&best) {
                    objective.apply(node, from, best, &w_from, w_to);
                }
                assignment[node] = best;
                members[from] -= 1;
                if members[from] == 0 {
                    empty.push(from);
                }
                if members[best] == 0 {
                    empty.retain(|&c| c != best);
                }
                members[best] += 1;
                improved = true;
                any_moved = true;
            }
        }

        if !improved {
            break;
        }
    }

    (assignment, any_moved)
}
