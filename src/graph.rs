//! Modelo de términos y triples RDF, e ingesta de documentos Turtle con Rio.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use rio_api::model;
use rio_api::parser::TriplesParser;
use rio_turtle::{TurtleError, TurtleParser};
use thiserror::Error;

use crate::namespace::NamespaceMap;

/// Valor que ocupa una posición de un triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Resource(String),
    BlankNode(String),
    Literal(Literal),
}

/// Literal RDF. Idioma y tipo de dato son excluyentes por construcción.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    Simple(String),
    LanguageTagged { value: String, language: String },
    Typed { value: String, datatype: String },
}

impl Literal {
    pub fn value(&self) -> &str {
        match self {
            Literal::Simple(value)
            | Literal::LanguageTagged { value, .. }
            | Literal::Typed { value, .. } => value,
        }
    }

    pub fn language(&self) -> Option<&str> {
        match self {
            Literal::LanguageTagged { language, .. } => Some(language),
            _ => None,
        }
    }

    pub fn datatype(&self) -> Option<&str> {
        match self {
            Literal::Typed { datatype, .. } => Some(datatype),
            _ => None,
        }
    }
}

impl Term {
    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }

    /// Nombre del tipo de término, usado como grupo por defecto y en tooltips.
    pub fn kind(&self) -> &'static str {
        match self {
            Term::Resource(_) => "IRI",
            Term::BlankNode(_) => "BNode",
            Term::Literal(_) => "Literal",
        }
    }

    fn from_subject(subject: model::Subject<'_>) -> Result<Self, ParseError> {
        match subject {
            model::Subject::NamedNode(n) => Ok(Term::Resource(n.iri.to_string())),
            model::Subject::BlankNode(b) => Ok(Term::BlankNode(b.id.to_string())),
            model::Subject::Triple(_) => Err(ParseError::QuotedTriple),
        }
    }

    fn from_object(object: model::Term<'_>) -> Result<Self, ParseError> {
        match object {
            model::Term::NamedNode(n) => Ok(Term::Resource(n.iri.to_string())),
            model::Term::BlankNode(b) => Ok(Term::BlankNode(b.id.to_string())),
            model::Term::Literal(l) => Ok(Term::Literal(match l {
                model::Literal::Simple { value } => Literal::Simple(value.to_string()),
                model::Literal::LanguageTaggedString { value, language } => {
                    Literal::LanguageTagged {
                        value: value.to_string(),
                        language: language.to_string(),
                    }
                }
                model::Literal::Typed { value, datatype } => Literal::Typed {
                    value: value.to_string(),
                    datatype: datatype.iri.to_string(),
                },
            })),
            model::Term::Triple(_) => Err(ParseError::QuotedTriple),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Resource(iri) => f.write_str(iri),
            Term::BlankNode(id) => write!(f, "_:{id}"),
            Term::Literal(l) => f.write_str(l.value()),
        }
    }
}

/// Sentencia (sujeto, predicado, objeto). El sujeto nunca es un literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    pub subject: Term,
    pub predicate: String,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Term, predicate: impl Into<String>, object: Term) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object,
        }
    }
}

/// Errores de la ingesta de Turtle.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("{0}")]
    Syntax(String),
    #[error("los triples anidados (RDF-star) no están soportados")]
    QuotedTriple,
}

impl From<TurtleError> for ParseError {
    fn from(err: TurtleError) -> Self {
        ParseError::Syntax(err.to_string())
    }
}

/// Conjunto de triples en orden de lectura; los duplicados exactos se colapsan.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    triples: Vec<Triple>,
    seen: HashSet<Triple>,
    namespaces: NamespaceMap,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Añade un triple. Devuelve `false` si ya estaba en el grafo.
    pub fn insert(&mut self, triple: Triple) -> bool {
        if self.seen.contains(&triple) {
            return false;
        }
        self.seen.insert(triple.clone());
        self.triples.push(triple);
        true
    }

    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    #[cfg(test)]
    pub fn contains(&self, triple: &Triple) -> bool {
        self.seen.contains(triple)
    }

    pub fn namespaces(&self) -> &NamespaceMap {
        &self.namespaces
    }

    pub fn namespaces_mut(&mut self) -> &mut NamespaceMap {
        &mut self.namespaces
    }

    /// Serializa el grafo como Turtle. Las IRIs se escriben en forma
    /// `prefijo:local` siempre que se pueda y sólo se declaran los prefijos
    /// usados, así que el texto ocupa lo mismo que un documento escrito a
    /// mano. Los triples consecutivos con el mismo sujeto se agrupan con `;`
    /// y `,`. Re-analizar el resultado devuelve los mismos triples.
    pub fn to_turtle(&self) -> String {
        let mut writer = TurtleWriter::new(&self.namespaces);
        let mut previous: Option<&Triple> = None;

        for triple in &self.triples {
            match previous {
                Some(p) if p.subject == triple.subject && p.predicate == triple.predicate => {
                    writer.body.push_str(" , ");
                }
                Some(p) if p.subject == triple.subject => {
                    writer.body.push_str(" ;\n    ");
                    writer.predicate(&triple.predicate);
                    writer.body.push(' ');
                }
                _ => {
                    if previous.is_some() {
                        writer.body.push_str(" .\n");
                    }
                    writer.subject(&triple.subject);
                    writer.body.push(' ');
                    writer.predicate(&triple.predicate);
                    writer.body.push(' ');
                }
            }
            writer.object(&triple.object);
            previous = Some(triple);
        }
        if previous.is_some() {
            writer.body.push_str(" .\n");
        }

        writer.finish()
    }
}

const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

/// Acumula el cuerpo del documento y los prefijos que realmente aparecen.
struct TurtleWriter<'a> {
    namespaces: &'a NamespaceMap,
    used: BTreeSet<String>,
    body: String,
}

impl<'a> TurtleWriter<'a> {
    fn new(namespaces: &'a NamespaceMap) -> Self {
        Self {
            namespaces,
            used: BTreeSet::new(),
            body: String::new(),
        }
    }

    /// Forma compacta si existe y es ASCII (siempre válida como `PN_LOCAL`);
    /// si no, `<iri>`.
    fn iri(&mut self, iri: &str) {
        match self.namespaces.compact(iri).filter(|c| c.is_ascii()) {
            Some(compact) => {
                if let Some((prefix, _)) = compact.split_once(':') {
                    self.used.insert(prefix.to_string());
                }
                self.body.push_str(&compact);
            }
            None => self.body.push_str(&model::NamedNode { iri }.to_string()),
        }
    }

    fn subject(&mut self, term: &Term) {
        match term {
            Term::Resource(iri) => self.iri(iri),
            Term::BlankNode(id) => self.body.push_str(&model::BlankNode { id }.to_string()),
            // `parse` nunca produce sujetos literales; se escriben como IRI por completitud.
            Term::Literal(l) => self.iri(l.value()),
        }
    }

    fn predicate(&mut self, iri: &str) {
        if iri == RDF_TYPE {
            self.body.push('a');
        } else {
            self.iri(iri);
        }
    }

    fn object(&mut self, term: &Term) {
        match term {
            Term::Resource(iri) => self.iri(iri),
            Term::BlankNode(id) => self.body.push_str(&model::BlankNode { id }.to_string()),
            Term::Literal(Literal::Simple(value)) => self
                .body
                .push_str(&model::Literal::Simple { value }.to_string()),
            Term::Literal(Literal::LanguageTagged { value, language }) => self.body.push_str(
                &model::Literal::LanguageTaggedString { value, language }.to_string(),
            ),
            Term::Literal(Literal::Typed { value, datatype }) => {
                self.body
                    .push_str(&model::Literal::Simple { value }.to_string());
                self.body.push_str("^^");
                self.iri(datatype);
            }
        }
    }

    fn finish(self) -> String {
        let mut out = String::with_capacity(self.body.len() + 64 * self.used.len());
        for (prefix, namespace) in self.namespaces.iter() {
            if self.used.contains(prefix) {
                out.push_str(&format!("@prefix {prefix}: <{namespace}> .\n"));
            }
        }
        out.push_str(&self.body);
        out
    }
}

/// Etiquetas estables `b0`, `b1`, ... para los nodos en blanco, por orden de
/// primera aparición. Rio renombra al re-analizar las etiquetas que él mismo
/// genera para `[ ]`; éstas las conserva, así que el grafo es un punto fijo
/// de `parse(to_turtle(..))`.
#[derive(Default)]
struct BlankLabels {
    assigned: HashMap<String, String>,
}

impl BlankLabels {
    fn stable(&mut self, term: Term) -> Term {
        match term {
            Term::BlankNode(id) => {
                let next = self.assigned.len();
                let label = self
                    .assigned
                    .entry(id)
                    .or_insert_with(|| format!("b{next}"))
                    .clone();
                Term::BlankNode(label)
            }
            other => other,
        }
    }
}

/// Analiza un documento Turtle completo.
pub fn parse(text: &str) -> Result<Graph, ParseError> {
    let mut parser = TurtleParser::new(text.as_bytes(), None);
    let mut graph = Graph::new();
    let mut blanks = BlankLabels::default();

    parser.parse_all(&mut |t: model::Triple<'_>| -> Result<(), ParseError> {
        let subject = blanks.stable(Term::from_subject(t.subject)?);
        let object = blanks.stable(Term::from_object(t.object)?);
        graph.insert(Triple::new(subject, t.predicate.iri, object));
        Ok(())
    })?;

    let mut prefixes: Vec<_> = parser.prefixes().iter().collect();
    prefixes.sort();
    for (prefix, namespace) in prefixes {
        graph.namespaces_mut().bind(prefix, namespace);
    }

    Ok(graph)
}
