use layerwise::{Driver, Link, Network, Settings};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Two triangles joined by one negative edge. The sign split gives a
    // positive layer (6 edges) and a negative layer (1 edge); with the
    // asymmetric-negative policy and modularity the layer weights are
    // (1, -1/7).
    let mut net = Network::with_vertices(6, false);
    for (i, j) in [(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5)] {
        net.add_edge(i, j, Link::weighted(1.0))?;
    }
    net.add_edge(2, 3, Link::weighted(-1.0))?;

    let settings = Settings {
        seed: Some(7),
        ..Settings::default()
    };
    let detection = Driver::new(settings).detect(&net)?;

    println!("mode={:?}", detection.mode);
    for (name, weight) in detection.layer_names.iter().zip(&detection.layer_weights) {
        println!("  layer {name}: weight {weight:.4}");
    }

    let mut by_comm: std::collections::BTreeMap<usize, Vec<usize>> =
        std::collections::BTreeMap::new();
    for (idx, comm) in detection.membership.iter().enumerate() {
        by_comm.entry(*comm).or_default().push(idx);
    }
    println!("communities={}", by_comm.len());
    for (cid, ids) in by_comm {
        println!("  community {cid}: {ids:?}");
    }
    if let Some(improvement) = detection.improvement {
        println!("improvement={improvement:.4}");
    }

    Ok(())
}
