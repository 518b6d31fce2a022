//! Modularidad voraz (Clauset, Newman y Moore): parte de comunidades
//! unitarias y fusiona en cada paso el par conectado con mayor ganancia
//! hasta que ninguna fusión mejora la modularidad. Es determinista.

use std::collections::BTreeMap;

use super::weighted::{renumber, WeightedGraph};

const MIN_GAIN: f64 = 1e-12;

pub(crate) fn greedy_modularity(graph: &WeightedGraph, resolution: f64) -> Vec<usize> {
    let n = graph.len();
    let m = graph.total_weight;
    let mut membership: Vec<usize> = (0..n).collect();
    if m == 0.0 {
        return membership;
    }

    let mut links: Vec<BTreeMap<usize, f64>> = graph
        .adj
        .iter()
        .map(|edges| {
            let mut map = BTreeMap::new();
            for &(other, w) in edges {
                *map.entry(other).or_insert(0.0) += w;
            }
            map
        })
        .collect();
    let mut degree = graph.degrees.clone();

    loop {
        // ΔQ(i, j) = w_ij / m − γ · D_i · D_j / (2m²)
        let mut best: Option<(f64, usize, usize)> = None;
        for (i, neighbours) in links.iter().enumerate() {
            for (&j, &w) in neighbours.range(i + 1..) {
                let gain = w / m - resolution * degree[i] * degree[j] / (2.0 * m * m);
                if best.map_or(true, |(g, _, _)| gain > g + MIN_GAIN) {
                    best = Some((gain, i, j));
                }
            }
        }

        let Some((gain, keep, absorbed)) = best else {
            break;
        };
        if gain <= MIN_GAIN {
            break;
        }

        let absorbed_links = std::mem::take(&mut links[absorbed]);
        for (other, w) in absorbed_links {
            links[other].remove(&absorbed);
            if other == keep {
                continue;
            }
            *links[keep].entry(other).or_insert(0.0) += w;
            *links[other].entry(keep).or_insert(0.0) += w;
        }
        degree[keep] += degree[absorbed];
        degree[absorbed] = 0.0;
        for c in membership.iter_mut() {
            if *c == absorbed {
                *c = keep;
            }
        }
    }

    renumber(&membership).0
}
