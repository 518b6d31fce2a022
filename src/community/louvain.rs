//! Louvain (Blondel et al., 2008): movimiento local de nodos para maximizar
//! la modularidad seguido de agregación, hasta que no hay mejora.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;

use super::weighted::{renumber, WeightedGraph};

/// Ganancia mínima para considerar que un movimiento mejora.
pub(crate) const MIN_GAIN: f64 = 1e-10;
const MAX_PASSES: usize = 1_000;

/// Fase de movimiento local. Visita los nodos en orden aleatorio y mueve
/// cada uno a la comunidad vecina con mayor ganancia de modularidad,
/// repitiendo hasta que una pasada completa no mueve ningún nodo.
///
/// `membership` se usa como partición inicial; sus etiquetas deben estar
/// en `0..graph.len()`. Devuelve `true` si algún nodo cambió de comunidad.
pub(crate) fn move_nodes<R: Rng>(
    graph: &WeightedGraph,
    membership: &mut [usize],
    resolution: f64,
    rng: &mut R,
) -> bool {
    let n = graph.len();
    let two_m = 2.0 * graph.total_weight;
    if two_m == 0.0 {
        return false;
    }

    let mut totals = vec![0.0; n];
    for (node, &c) in membership.iter().enumerate() {
        totals[c] += graph.degrees[node];
    }

    let mut order: Vec<usize> = (0..n).collect();
    let mut improved = false;

    for _ in 0..MAX_PASSES {
        order.shuffle(rng);
        let mut moved = false;

        for &node in &order {
            let current = membership[node];
            let k = graph.degrees[node];

            let mut links: BTreeMap<usize, f64> = BTreeMap::new();
            for &(other, w) in &graph.adj[node] {
                *links.entry(membership[other]).or_default() += w;
            }

            totals[current] -= k;
            let stay = links.get(&current).copied().unwrap_or(0.0);
            let mut best = current;
            let mut best_gain = stay - resolution * totals[current] * k / two_m;
            for (&c, &w) in &links {
                let gain = w - resolution * totals[c] * k / two_m;
                if gain > best_gain + MIN_GAIN {
                    best = c;
                    best_gain = gain;
                }
            }
            totals[best] += k;

            if best != current {
                membership[node] = best;
                moved = true;
                improved = true;
            }
        }

        if !moved {
            break;
        }
    }

    improved
}

/// Ejecuta Louvain y devuelve la comunidad de cada nodo.
pub(crate) fn louvain<R: Rng>(graph: &WeightedGraph, resolution: f64, rng: &mut R) -> Vec<usize> {
    let mut assignment: Vec<usize> = (0..graph.len()).collect();
    let mut level = graph.clone();

    loop {
        let mut membership: Vec<usize> = (0..level.len()).collect();
        if !move_nodes(&level, &mut membership, resolution, rng) {
            break;
        }
        let (membership, count) = renumber(&membership);
        for a in assignment.iter_mut() {
            *a = membership[*a];
        }
        if count == level.len() {
            break;
        }
        level = level.aggregate(&membership, count);
    }

    renumber(&assignment).0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::community::weighted::modularity;
    use crate::community::weighted::tests::{from_edges, two_triangles};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn separates_two_triangles() {
        let mut rng = StdRng::seed_from_u64(42);
        let membership = louvain(&two_triangles(), 1.0, &mut rng);
        assert_eq!(membership, vec![0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn finds_cliques_joined_by_a_bridge() {
        // Dos K4 unidos por la arista 3-4.
        let mut edges = Vec::new();
        for base in [0, 4] {
            for i in 0..4 {
                for j in (i + 1)..4 {
                    edges.push((base + i, base + j));
                }
            }
        }
        edges.push((3, 4));
        let g = from_edges(8, &edges);
        let mut rng = StdRng::seed_from_u64(42);
        let membership = louvain(&g, 1.0, &mut rng);
        assert_eq!(membership, vec![0, 0, 0, 0, 1, 1, 1, 1]);
        assert!(modularity(&g, &membership, 1.0) > 0.3);
    }

    #[test]
    fn is_deterministic_for_a_seed() {
        let g = from_edges(7, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 6), (6, 0), (0, 3)]);
        let a = louvain(&g, 1.0, &mut StdRng::seed_from_u64(42));
        let b = louvain(&g, 1.0, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn edgeless_graph_keeps_singletons() {
        let g = from_edges(3, &[]);
        let membership = louvain(&g, 1.0, &mut StdRng::seed_from_u64(42));
        assert_eq!(membership, vec![0, 1, 2]);
    }
}
