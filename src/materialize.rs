//! Materialización del grafo RDF en nodos y aristas del diagrama: identidad
//! de nodos, etiquetas, tooltips y grupos de color.

use std::collections::HashSet;

use crate::community::Partition;
use crate::graph::{Graph, Literal, Term};
use crate::models::{Diagram, DiagramEdge, DiagramNode, Shape};
use crate::namespace::NamespaceMap;
use crate::projection::NodeKey;

/// Emite identificadores sintéticos para cada aparición de un literal.
/// El prefijo `_lit:` no puede coincidir con una IRI absoluta ni con un
/// nodo en blanco (`_:`).
#[derive(Debug, Default)]
struct LiteralIds {
    issued: usize,
}

impl LiteralIds {
    fn mint(&mut self) -> String {
        self.issued += 1;
        format!("_lit:{}", self.issued)
    }
}

/// Forma compacta de una IRI o, si no hay prefijo, la IRI completa.
pub fn iri_label(namespaces: &NamespaceMap, iri: &str) -> String {
    namespaces.compact(iri).unwrap_or_else(|| iri.to_string())
}

/// Etiqueta visible de un término.
pub fn term_label(namespaces: &NamespaceMap, term: &Term) -> String {
    match term {
        Term::Resource(iri) => iri_label(namespaces, iri),
        Term::BlankNode(id) => format!("_:{id}"),
        Term::Literal(Literal::Simple(value)) => format!("\"{value}\""),
        Term::Literal(Literal::LanguageTagged { value, language }) => {
            format!("\"{value}\"@{language}")
        }
        Term::Literal(Literal::Typed { value, datatype }) => {
            format!("\"{value}\"^^{}", iri_label(namespaces, datatype))
        }
    }
}

fn tooltip(term: &Term, cluster: Option<usize>) -> String {
    let mut text = match term {
        Term::Resource(iri) => format!("IRI\n{iri}"),
        Term::BlankNode(id) => format!("BNode\n{id}"),
        Term::Literal(l) => format!(
            "Literal\nvalue={}\ndatatype={}\nlang={}",
            l.value(),
            l.datatype().unwrap_or("none"),
            l.language().unwrap_or("none"),
        ),
    };
    if let Some(c) = cluster {
        text.push_str(&format!("\ncommunity=C{c}"));
    }
    text
}

fn group(term: &Term, cluster: Option<usize>) -> String {
    match cluster {
        Some(c) => format!("C{c}"),
        None => term.kind().to_string(),
    }
}

struct DiagramBuilder<'a> {
    namespaces: &'a NamespaceMap,
    partition: Option<&'a Partition>,
    emitted: HashSet<String>,
    literal_ids: LiteralIds,
    diagram: Diagram,
}

impl<'a> DiagramBuilder<'a> {
    /// Devuelve el id del nodo del término, creándolo si hace falta.
    /// `position` es la posición del triple, que identifica a los literales.
    fn node_for(&mut self, term: &Term, position: usize) -> String {
        let (id, key) = match term {
            Term::Resource(iri) => (iri.clone(), NodeKey::Term(term.clone())),
            Term::BlankNode(bid) => (format!("_:{bid}"), NodeKey::Term(term.clone())),
            Term::Literal(_) => (self.literal_ids.mint(), NodeKey::Literal(position)),
        };
        if !self.emitted.insert(id.clone()) {
            return id;
        }

        let cluster = self.partition.and_then(|p| p.cluster_of(&key));
        self.diagram.nodes.push(DiagramNode {
            id: id.clone(),
            label: term_label(self.namespaces, term),
            tooltip: tooltip(term, cluster),
            shape: if term.is_literal() {
                Shape::Box
            } else {
                Shape::Circle
            },
            group: group(term, cluster),
        });
        id
    }
}

/// Recorre los triples en orden de lectura y produce el diagrama. La arista
/// de un triple se incluye si el objeto no es literal o si se piden literales.
pub fn materialize(graph: &Graph, partition: Option<&Partition>, include_literals: bool) -> Diagram {
    let mut builder = DiagramBuilder {
        namespaces: graph.namespaces(),
        partition,
        emitted: HashSet::new(),
        literal_ids: LiteralIds::default(),
        diagram: Diagram::default(),
    };

    for (position, triple) in graph.triples().iter().enumerate() {
        let source = builder.node_for(&triple.subject, position);
        if triple.object.is_literal() && !include_literals {
            continue;
        }
        let target = builder.node_for(&triple.object, position);
        builder.diagram.edges.push(DiagramEdge {
            source,
            target,
            label: iri_label(builder.namespaces, &triple.predicate),
            tooltip: triple.predicate.clone(),
        });
    }

    builder.diagram
}
