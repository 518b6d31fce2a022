use std::collections::BTreeMap;

use crate::projection::ProjectedGraph;

/// Grafo ponderado por listas de adyacencia sobre el que trabajan los
/// algoritmos. Los bucles se guardan aparte y cuentan doble en el grado.
#[derive(Debug, Clone)]
pub(crate) struct WeightedGraph {
    pub adj: Vec<Vec<(usize, f64)>>,
    pub self_loops: Vec<f64>,
    pub degrees: Vec<f64>,
    /// Peso total de aristas (m).
    pub total_weight: f64,
}

impl WeightedGraph {
    pub fn from_projected(projected: &ProjectedGraph) -> Self {
        let n = projected.node_count();
        let mut adj = vec![Vec::new(); n];
        let mut self_loops = vec![0.0; n];
        for (a, b) in projected.edges() {
            if a == b {
                self_loops[a] += 1.0;
            } else {
                adj[a].push((b, 1.0));
                adj[b].push((a, 1.0));
            }
        }
        Self::with_adjacency(adj, self_loops)
    }

    fn with_adjacency(adj: Vec<Vec<(usize, f64)>>, self_loops: Vec<f64>) -> Self {
        let degrees: Vec<f64> = adj
            .iter()
            .zip(&self_loops)
            .map(|(edges, &l)| edges.iter().map(|(_, w)| w).sum::<f64>() + 2.0 * l)
            .collect();
        let total_weight = degrees.iter().sum::<f64>() / 2.0;
        Self {
            adj,
            self_loops,
            degrees,
            total_weight,
        }
    }

    pub fn len(&self) -> usize {
        self.adj.len()
    }

    /// Contrae cada comunidad en un nodo. `membership` debe estar numerado
    /// de forma contigua en `0..count`.
    pub fn aggregate(&self, membership: &[usize], count: usize) -> Self {
        let mut links: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); count];
        let mut self_loops = vec![0.0; count];

        for (node, edges) in self.adj.iter().enumerate() {
            let c = membership[node];
            self_loops[c] += self.self_loops[node];
            for &(other, w) in edges {
                let d = membership[other];
                if c == d {
                    // Cada arista interna se recorre dos veces.
                    self_loops[c] += w / 2.0;
                } else {
                    *links[c].entry(d).or_default() += w;
                }
            }
        }

        let adj = links
            .into_iter()
            .map(|m| m.into_iter().collect())
            .collect();
        Self::with_adjacency(adj, self_loops)
    }
}

/// Renumera etiquetas arbitrarias a `0..k` por orden de primera aparición.
pub(crate) fn renumber(labels: &[usize]) -> (Vec<usize>, usize) {
    let mut mapping: BTreeMap<usize, usize> = BTreeMap::new();
    let relabeled = labels
        .iter()
        .map(|&label| {
            let next = mapping.len();
            *mapping.entry(label).or_insert(next)
        })
        .collect();
    (relabeled, mapping.len())
}

/// Modularidad de una partición:
/// Q = Σ_c [ L_c / m − γ (D_c / 2m)² ]
pub(crate) fn modularity(graph: &WeightedGraph, membership: &[usize], resolution: f64) -> f64 {
    let m = graph.total_weight;
    if m == 0.0 {
        return 0.0;
    }
    let count = membership.iter().max().map_or(0, |&c| c + 1);
    let mut internal = vec![0.0; count];
    let mut degree = vec![0.0; count];

    for (node, edges) in graph.adj.iter().enumerate() {
        let c = membership[node];
        degree[c] += graph.degrees[node];
        internal[c] += graph.self_loops[node];
        for &(other, w) in edges {
            if membership[other] == c {
                internal[c] += w / 2.0;
            }
        }
    }

    internal
        .iter()
        .zip(&degree)
        .map(|(&l, &d)| l / m - resolution * (d / (2.0 * m)).powi(2))
        .sum()
}
