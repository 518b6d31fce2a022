//! Vista no dirigida del grafo RDF usada sólo para agrupar en comunidades.

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};

use crate::graph::{Graph, Term};

/// Identidad de un nodo proyectado. Los recursos y nodos en blanco se
/// identifican por su término; cada aparición de un literal, por la
/// posición de su triple en el grafo.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Term(Term),
    Literal(usize),
}

/// Grafo simple no dirigido: las aristas paralelas y la dirección se colapsan;
/// los bucles se conservan.
#[derive(Debug, Clone, Default)]
pub struct ProjectedGraph {
    graph: UnGraph<NodeKey, ()>,
    index: HashMap<NodeKey, NodeIndex>,
}

impl ProjectedGraph {
    fn add_node(&mut self, key: NodeKey) -> NodeIndex {
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.graph.add_node(key.clone());
        self.index.insert(key, idx);
        idx
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Claves en orden de inserción; la posición es el índice del nodo.
    pub fn keys(&self) -> impl Iterator<Item = &NodeKey> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// Extremos de cada arista como índices de nodo.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.graph
            .raw_edges()
            .iter()
            .map(|e| (e.source().index(), e.target().index()))
    }
}

/// Construye la proyección: el sujeto de cada triple siempre entra; el objeto
/// entra si es recurso/nodo en blanco o si se incluyen literales.
pub fn project(graph: &Graph, include_literals: bool) -> ProjectedGraph {
    let mut projected = ProjectedGraph::default();

    for (position, triple) in graph.triples().iter().enumerate() {
        let subject = projected.add_node(NodeKey::Term(triple.subject.clone()));
        let object = match &triple.object {
            Term::Literal(_) if !include_literals => continue,
            Term::Literal(_) => projected.add_node(NodeKey::Literal(position)),
            term => projected.add_node(NodeKey::Term(term.clone())),
        };
        projected.graph.update_edge(subject, object, ());
    }

    projected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::parse;

    const PEOPLE: &str = r#"@prefix ex: <http://example.org/> .
        ex:alice ex:knows ex:bob ; ex:name "Alice" ; ex:nick "Al" .
        ex:bob ex:knows ex:alice ; ex:name "Alice" ."#;

    #[test]
    fn direction_and_parallel_edges_collapse() {
        let g = parse(PEOPLE).unwrap();
        let p = project(&g, false);
        assert_eq!(p.node_count(), 2);
        assert_eq!(p.edge_count(), 1);
    }

    #[test]
    fn literal_occurrences_are_distinct_nodes() {
        let g = parse(PEOPLE).unwrap();
        let p = project(&g, true);
        // alice, bob y tres apariciones de literal ("Alice" dos veces).
        assert_eq!(p.node_count(), 5);
        assert_eq!(p.edge_count(), 4);
        let literal_keys = p.keys().filter(|k| matches!(k, NodeKey::Literal(_))).count();
        assert_eq!(literal_keys, 3);
    }

    #[test]
    fn subjects_of_literal_only_triples_are_kept() {
        let g = parse(r#"@prefix ex: <http://example.org/> . ex:a ex:name "A" ."#).unwrap();
        let p = project(&g, false);
        assert_eq!(p.node_count(), 1);
        assert_eq!(p.edge_count(), 0);
    }

    #[test]
    fn self_loops_are_kept() {
        let g = parse("@prefix ex: <http://example.org/> . ex:a ex:sameAs ex:a .").unwrap();
        let p = project(&g, true);
        assert_eq!(p.node_count(), 1);
        assert_eq!(p.edges().collect::<Vec<_>>(), vec![(0, 0)]);
    }

    #[test]
    fn empty_graph_projects_to_empty() {
        let p = project(&Graph::new(), true);
        assert_eq!(p.node_count(), 0);
        assert_eq!(p.edge_count(), 0);
    }

    #[test]
    fn positions_follow_insertion_order() {
        let g = parse(PEOPLE).unwrap();
        let p = project(&g, false);
        let alice = NodeKey::Term(Term::Resource("http://example.org/alice".into()));
        assert_eq!(p.keys().next(), Some(&alice));
    }
}
