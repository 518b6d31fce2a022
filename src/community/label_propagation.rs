//! Propagación asíncrona de etiquetas: cada nodo adopta la etiqueta más
//! frecuente (por peso) entre sus vecinos; los empates se resuelven al azar
//! y un nodo conserva su etiqueta si ya es una de las más frecuentes.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;

use super::weighted::{renumber, WeightedGraph};

const MAX_ROUNDS: usize = 1_000;
const EPSILON: f64 = 1e-12;

pub(crate) fn label_propagation<R: Rng>(graph: &WeightedGraph, rng: &mut R) -> Vec<usize> {
    let n = graph.len();
    let mut labels: Vec<usize> = (0..n).collect();
    let mut order: Vec<usize> = (0..n).collect();

    for _ in 0..MAX_ROUNDS {
        order.shuffle(rng);
        let mut changed = false;

        for &node in &order {
            if graph.adj[node].is_empty() {
                continue;
            }
            let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
            for &(other, w) in &graph.adj[node] {
                *counts.entry(labels[other]).or_default() += w;
            }
            let max = counts.values().copied().fold(f64::MIN, f64::max);
            let best: Vec<usize> = counts
                .iter()
                .filter(|&(_, &w)| max - w < EPSILON)
                .map(|(&label, _)| label)
                .collect();

            if best.contains(&labels[node]) {
                continue;
            }
            if let Some(&label) = best.choose(rng) {
                labels[node] = label;
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }

    renumber(&labels).0
}
