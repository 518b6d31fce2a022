//! Algoritmo de Leiden
//!
//! Variante de Louvain que garantiza comunidades bien conectadas gracias a
//! una fase intermedia de refinamiento.
//!
//! 1. **Movimiento local**: igual que Louvain.
//! 2. **Refinamiento**: dentro de cada comunidad se parte de nodos aislados
//!    y sólo se fusionan nodos unidos por aristas, de modo que cada
//!    subcomunidad refinada es conexa.
//! 3. **Agregación**: se contrae la partición *refinada*, pero cada nodo
//!    agregado empieza en la comunidad no refinada a la que pertenecía.
//!
//! Referencia: Traag et al., "From Louvain to Leiden: guaranteeing
//! well-connected communities" (2019).

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;

use super::louvain::{move_nodes, MIN_GAIN};
use super::weighted::{renumber, WeightedGraph};

const MAX_LEVELS: usize = 64;

/// Ejecuta Leiden y devuelve la comunidad de cada nodo.
pub(crate) fn leiden<R: Rng>(graph: &WeightedGraph, resolution: f64, rng: &mut R) -> Vec<usize> {
    let mut assignment: Vec<usize> = (0..graph.len()).collect();
    let mut level = graph.clone();
    let mut membership: Vec<usize> = (0..level.len()).collect();

    for _ in 0..MAX_LEVELS {
        move_nodes(&level, &mut membership, resolution, rng);
        let (coarse, _) = renumber(&membership);
        let (refined, refined_count) = refine(&level, &coarse, resolution, rng);

        if refined_count == level.len() {
            membership = coarse;
            break;
        }

        // El nodo agregado r hereda la comunidad de cualquiera de sus miembros.
        let mut next_membership = vec![0; refined_count];
        for (node, &r) in refined.iter().enumerate() {
            next_membership[r] = coarse[node];
        }
        for a in assignment.iter_mut() {
            *a = refined[*a];
        }
        level = level.aggregate(&refined, refined_count);
        membership = next_membership;
    }

    let result: Vec<usize> = assignment.iter().map(|&a| membership[a]).collect();
    renumber(&result).0
}

/// Refinamiento: fusiona voraz y aleatoriamente nodos aislados con
/// subcomunidades vecinas de su misma comunidad cuando la modularidad mejora.
fn refine<R: Rng>(
    graph: &WeightedGraph,
    membership: &[usize],
    resolution: f64,
    rng: &mut R,
) -> (Vec<usize>, usize) {
    let n = graph.len();
    let two_m = 2.0 * graph.total_weight;
    let mut refined: Vec<usize> = (0..n).collect();
    if two_m == 0.0 {
        return (refined, n);
    }

    // La subcomunidad `c` la fundó el nodo `c`; deja de ser aislada en
    // cuanto alguien se une a ella o ella se une a otra.
    let mut totals = graph.degrees.clone();
    let mut singleton = vec![true; n];

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    for &node in &order {
        if !singleton[node] {
            continue;
        }
        let k = graph.degrees[node];
        let own = refined[node];

        let mut links: BTreeMap<usize, f64> = BTreeMap::new();
        for &(other, w) in &graph.adj[node] {
            if membership[other] == membership[node] {
                *links.entry(refined[other]).or_default() += w;
            }
        }

        totals[own] -= k;
        let mut best = own;
        let mut best_gain = 0.0;
        for (&c, &w) in &links {
            if c == own {
                continue;
            }
            let gain = w - resolution * totals[c] * k / two_m;
            if gain > best_gain + MIN_GAIN {
                best = c;
                best_gain = gain;
            }
        }
        totals[best] += k;

        if best != own {
            refined[node] = best;
            singleton[node] = false;
            singleton[best] = false;
        }
    }

    renumber(&refined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::community::weighted::modularity;
    use crate::community::weighted::tests::{from_edges, two_triangles};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::{HashMap, HashSet, VecDeque};

    #[test]
    fn separates_two_triangles() {
        let membership = leiden(&two_triangles(), 1.0, &mut StdRng::seed_from_u64(42));
        assert_eq!(membership, vec![0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn is_deterministic_for_a_seed() {
        let g = from_edges(8, &[(0, 1), (1, 2), (2, 0), (2, 3), (3, 4), (4, 5), (5, 3), (6, 7)]);
        let a = leiden(&g, 1.0, &mut StdRng::seed_from_u64(42));
        let b = leiden(&g, 1.0, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn communities_are_connected() {
        // Anillo de cuatro triángulos unidos por aristas sueltas.
        let mut edges = Vec::new();
        for t in 0..4 {
            let b = t * 3;
            edges.extend([(b, b + 1), (b + 1, b + 2), (b + 2, b)]);
            edges.push((b + 2, (b + 3) % 12));
        }
        let g = from_edges(12, &edges);
        let membership = leiden(&g, 1.0, &mut StdRng::seed_from_u64(42));
        assert!(modularity(&g, &membership, 1.0) > 0.3);

        let mut groups: HashMap<usize, Vec<usize>> = HashMap::new();
        for (node, &c) in membership.iter().enumerate() {
            groups.entry(c).or_default().push(node);
        }
        for nodes in groups.values() {
            let members: HashSet<usize> = nodes.iter().copied().collect();
            let mut seen = HashSet::from([nodes[0]]);
            let mut queue = VecDeque::from([nodes[0]]);
            while let Some(u) = queue.pop_front() {
                for &(v, _) in &g.adj[u] {
                    if members.contains(&v) && seen.insert(v) {
                        queue.push_back(v);
                    }
                }
            }
            assert_eq!(seen.len(), members.len(), "comunidad desconectada: {nodes:?}");
        }
    }

    #[test]
    fn single_node_graph() {
        let g = from_edges(1, &[]);
        assert_eq!(leiden(&g, 1.0, &mut StdRng::seed_from_u64(42)), vec![0]);
    }
}
