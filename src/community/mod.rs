//! Detección de comunidades sobre la proyección no dirigida del grafo.
//!
//! El algoritmo se elige con una variante cerrada ([`Algorithm`]). Las
//! sustituciones por falta de capacidad están declaradas como datos en
//! [`FALLBACKS`] y se resuelven con las [`Capabilities`] calculadas al
//! arrancar. Cualquier fallo durante la detección degrada el resultado a
//! "sin comunidades" en lugar de propagarse como error de la petición.

mod greedy;
mod label_propagation;
mod leiden;
mod louvain;
mod weighted;

use std::collections::HashMap;
use std::fmt;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::projection::{NodeKey, ProjectedGraph};
use weighted::WeightedGraph;

/// Semilla fija para los algoritmos aleatorios.
pub const DEFAULT_SEED: u64 = 42;
const RESOLUTION: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    #[default]
    Leiden,
    Louvain,
    LabelPropagation,
    GreedyModularity,
    None,
}

impl Algorithm {
    /// Orden en el que se ofrecen en el selector del diagrama.
    pub const ALL: [Algorithm; 5] = [
        Algorithm::Louvain,
        Algorithm::Leiden,
        Algorithm::LabelPropagation,
        Algorithm::GreedyModularity,
        Algorithm::None,
    ];

    /// Valor de formulario.
    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::Leiden => "leiden",
            Algorithm::Louvain => "louvain",
            Algorithm::LabelPropagation => "label_propagation",
            Algorithm::GreedyModularity => "greedy_modularity",
            Algorithm::None => "none",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Algorithm::Leiden => "Leiden",
            Algorithm::Louvain => "Louvain",
            Algorithm::LabelPropagation => "Propagación de etiquetas",
            Algorithm::GreedyModularity => "Modularidad voraz",
            Algorithm::None => "Ninguno",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capacidades de detección disponibles en este despliegue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub leiden: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self { leiden: true }
    }
}

impl Capabilities {
    pub fn supports(&self, algorithm: Algorithm) -> bool {
        match algorithm {
            Algorithm::Leiden => self.leiden,
            _ => true,
        }
    }
}

/// Regla de sustitución: si `requested` no está disponible se ejecuta
/// `substitute` y se informa `label` como algoritmo usado.
#[derive(Debug, Clone, Copy)]
pub struct Fallback {
    pub requested: Algorithm,
    pub substitute: Algorithm,
    pub label: &'static str,
}

pub const FALLBACKS: [Fallback; 1] = [Fallback {
    requested: Algorithm::Leiden,
    substitute: Algorithm::Louvain,
    label: "louvain (fallback)",
}];

/// Algoritmo que se ejecutará realmente y nombre con el que se informa.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub algorithm: Algorithm,
    pub label: String,
}

impl Plan {
    pub fn resolve(requested: Algorithm, capabilities: &Capabilities) -> Self {
        if !capabilities.supports(requested) {
            if let Some(rule) = FALLBACKS.iter().find(|r| r.requested == requested) {
                return Self {
                    algorithm: rule.substitute,
                    label: rule.label.to_string(),
                };
            }
            return Self {
                algorithm: Algorithm::None,
                label: Algorithm::None.as_str().to_string(),
            };
        }
        Self {
            algorithm: requested,
            label: requested.as_str().to_string(),
        }
    }
}

/// Asignación nodo → comunidad, exhaustiva y sin solapamientos.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    membership: Vec<usize>,
    assignment: HashMap<NodeKey, usize>,
    count: usize,
}

impl Partition {
    fn new(projected: &ProjectedGraph, membership: Vec<usize>) -> Self {
        let count = membership.iter().max().map_or(0, |&c| c + 1);
        let assignment = projected
            .keys()
            .cloned()
            .zip(membership.iter().copied())
            .collect();
        Self {
            membership,
            assignment,
            count,
        }
    }

    pub fn cluster_of(&self, key: &NodeKey) -> Option<usize> {
        self.assignment.get(key).copied()
    }

    /// Número de comunidades.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Comunidad de cada nodo proyectado, por posición.
    #[cfg(test)]
    pub fn membership(&self) -> &[usize] {
        &self.membership
    }

    pub fn communities(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.count];
        for (node, &c) in self.membership.iter().enumerate() {
            groups[c].push(node);
        }
        groups
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DetectError {
    #[error("el grafo proyectado no tiene nodos")]
    EmptyGraph,
    #[error("el grafo proyectado no tiene aristas")]
    NoEdges,
    #[error("no se pidió ningún algoritmo")]
    NothingToRun,
    #[error("la partición no cubre todos los nodos ({assigned} de {expected})")]
    IncompletePartition { assigned: usize, expected: usize },
}

/// Resultado de la detección tal y como lo consume el resto del pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub partition: Option<Partition>,
    pub modularity: Option<f64>,
    pub algorithm_used: String,
}

impl Detection {
    /// Sin comunidades: los nodos se agrupan después por tipo de término.
    pub fn unclustered() -> Self {
        Self {
            partition: None,
            modularity: None,
            algorithm_used: Algorithm::None.as_str().to_string(),
        }
    }

    pub fn community_count(&self) -> usize {
        self.partition.as_ref().map_or(0, Partition::len)
    }
}

/// Resultado interno de un intento de detección.
#[derive(Debug)]
pub enum Outcome {
    Partitioned { partition: Partition, modularity: f64 },
    Skipped,
    Degraded(DetectError),
}

/// Ejecuta el algoritmo planificado sin degradar los fallos.
pub fn try_detect(projected: &ProjectedGraph, algorithm: Algorithm, seed: u64) -> Outcome {
    if algorithm == Algorithm::None {
        return Outcome::Skipped;
    }
    match run(projected, algorithm, seed) {
        Ok((partition, modularity)) => Outcome::Partitioned {
            partition,
            modularity,
        },
        Err(err) => Outcome::Degraded(err),
    }
}

fn run(
    projected: &ProjectedGraph,
    algorithm: Algorithm,
    seed: u64,
) -> Result<(Partition, f64), DetectError> {
    if projected.node_count() == 0 {
        return Err(DetectError::EmptyGraph);
    }
    if projected.edge_count() == 0 {
        return Err(DetectError::NoEdges);
    }

    let graph = WeightedGraph::from_projected(projected);
    let mut rng = StdRng::seed_from_u64(seed);
    let membership = match algorithm {
        Algorithm::Leiden => leiden::leiden(&graph, RESOLUTION, &mut rng),
        Algorithm::Louvain => louvain::louvain(&graph, RESOLUTION, &mut rng),
        Algorithm::LabelPropagation => label_propagation::label_propagation(&graph, &mut rng),
        Algorithm::GreedyModularity => greedy::greedy_modularity(&graph, RESOLUTION),
        Algorithm::None => return Err(DetectError::NothingToRun),
    };

    if membership.len() != projected.node_count() {
        return Err(DetectError::IncompletePartition {
            assigned: membership.len(),
            expected: projected.node_count(),
        });
    }

    let modularity = weighted::modularity(&graph, &membership, RESOLUTION);
    Ok((Partition::new(projected, membership), modularity))
}

/// Detecta comunidades con el algoritmo pedido, aplicando las sustituciones
/// por capacidad. Nunca falla: los errores degradan a [`Detection::unclustered`].
pub fn detect(
    projected: &ProjectedGraph,
    requested: Algorithm,
    capabilities: &Capabilities,
    seed: u64,
) -> Detection {
    let plan = Plan::resolve(requested, capabilities);
    match try_detect(projected, plan.algorithm, seed) {
        Outcome::Partitioned {
            partition,
            modularity,
        } => {
            debug!(
                "Detección '{}': {} comunidades {:?}, modularidad {:.3}",
                plan.label,
                partition.len(),
                partition.communities().iter().map(Vec::len).collect::<Vec<_>>(),
                modularity
            );
            Detection {
                partition: Some(partition),
                modularity: Some(modularity),
                algorithm_used: plan.label,
            }
        }
        Outcome::Skipped => Detection::unclustered(),
        Outcome::Degraded(err) => {
            warn!("Detección de comunidades '{}' degradada: {}", plan.label, err);
            Detection::unclustered()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{parse, Term};
    use crate::projection::project;

    const TWO_TRIANGLES: &str = r#"@prefix ex: <http://example.org/> .
        ex:a ex:p ex:b . ex:b ex:p ex:c . ex:c ex:p ex:a .
        ex:d ex:p ex:e . ex:e ex:p ex:f . ex:f ex:p ex:d ."#;

    fn key(local: &str) -> NodeKey {
        NodeKey::Term(Term::Resource(format!("http://example.org/{local}")))
    }

    fn triangles() -> ProjectedGraph {
        project(&parse(TWO_TRIANGLES).unwrap(), true)
    }

    #[test]
    fn louvain_splits_two_disjoint_triangles() {
        let detection = detect(&triangles(), Algorithm::Louvain, &Capabilities::default(), DEFAULT_SEED);
        assert_eq!(detection.algorithm_used, "louvain");
        let partition = detection.partition.expect("partición");
        assert_eq!(partition.len(), 2);

        let first = partition.cluster_of(&key("a")).unwrap();
        let second = partition.cluster_of(&key("d")).unwrap();
        assert_ne!(first, second);
        for k in ["b", "c"] {
            assert_eq!(partition.cluster_of(&key(k)), Some(first));
        }
        for k in ["e", "f"] {
            assert_eq!(partition.cluster_of(&key(k)), Some(second));
        }
        assert!(detection.modularity.unwrap() > 0.0);
    }

    #[test]
    fn every_algorithm_splits_two_disjoint_triangles() {
        for algorithm in [
            Algorithm::Leiden,
            Algorithm::Louvain,
            Algorithm::LabelPropagation,
            Algorithm::GreedyModularity,
        ] {
            let detection = detect(&triangles(), algorithm, &Capabilities::default(), DEFAULT_SEED);
            assert_eq!(detection.algorithm_used, algorithm.as_str());
            let communities = detection.partition.unwrap().communities();
            assert_eq!(communities, vec![vec![0, 1, 2], vec![3, 4, 5]], "{algorithm}");
        }
    }

    #[test]
    fn none_never_clusters() {
        let detection = detect(&triangles(), Algorithm::None, &Capabilities::default(), DEFAULT_SEED);
        assert_eq!(detection, Detection::unclustered());
        assert_eq!(detection.algorithm_used, "none");
    }

    #[test]
    fn leiden_falls_back_to_louvain_when_unavailable() {
        let caps = Capabilities { leiden: false };
        let plan = Plan::resolve(Algorithm::Leiden, &caps);
        assert_eq!(plan.algorithm, Algorithm::Louvain);

        let detection = detect(&triangles(), Algorithm::Leiden, &caps, DEFAULT_SEED);
        assert_eq!(detection.algorithm_used, "louvain (fallback)");
        assert!(detection.partition.is_some());
        assert!(detection.modularity.is_some());
    }

    #[test]
    fn supported_algorithms_resolve_to_themselves() {
        for algorithm in Algorithm::ALL {
            let plan = Plan::resolve(algorithm, &Capabilities::default());
            assert_eq!(plan.algorithm, algorithm);
            assert_eq!(plan.label, algorithm.as_str());
        }
    }

    #[test]
    fn degenerate_graphs_degrade_to_none() {
        let empty = ProjectedGraph::default();
        assert!(matches!(
            try_detect(&empty, Algorithm::Louvain, DEFAULT_SEED),
            Outcome::Degraded(DetectError::EmptyGraph)
        ));
        assert_eq!(
            detect(&empty, Algorithm::Louvain, &Capabilities::default(), DEFAULT_SEED),
            Detection::unclustered()
        );

        let edgeless = project(
            &parse(r#"@prefix ex: <http://example.org/> . ex:a ex:name "A" ."#).unwrap(),
            false,
        );
        assert!(matches!(
            try_detect(&edgeless, Algorithm::Leiden, DEFAULT_SEED),
            Outcome::Degraded(DetectError::NoEdges)
        ));
        assert_eq!(
            detect(&edgeless, Algorithm::Leiden, &Capabilities::default(), DEFAULT_SEED),
            Detection::unclustered()
        );
    }

    #[test]
    fn detection_is_deterministic() {
        let projected = triangles();
        for algorithm in Algorithm::ALL {
            let a = detect(&projected, algorithm, &Capabilities::default(), DEFAULT_SEED);
            let b = detect(&projected, algorithm, &Capabilities::default(), DEFAULT_SEED);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn quality_is_the_modularity_of_the_partition() {
        let detection = detect(&triangles(), Algorithm::GreedyModularity, &Capabilities::default(), DEFAULT_SEED);
        let q = detection.modularity.unwrap();
        assert!((q - 0.5).abs() < 1e-9, "{q}");
    }

    #[test]
    fn algorithm_deserializes_from_form_values() {
        let parsed: Algorithm = serde_json::from_str("\"label_propagation\"").unwrap();
        assert_eq!(parsed, Algorithm::LabelPropagation);
        assert_eq!(Algorithm::default(), Algorithm::Leiden);
    }
}
