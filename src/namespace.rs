//! Gestión de prefijos de espacios de nombres y forma compacta (`ex:local`)
//! de las IRIs que aparecen en las etiquetas del diagrama.

use std::collections::BTreeMap;

/// Prefijos disponibles aunque el documento no los declare.
const BUILTIN_PREFIXES: [(&str, &str); 4] = [
    ("owl", "http://www.w3.org/2002/07/owl#"),
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
struct Binding {
    namespace: String,
    builtin: bool,
}

/// Tabla prefijo → espacio de nombres de un grafo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceMap {
    bindings: BTreeMap<String, Binding>,
}

impl Default for NamespaceMap {
    fn default() -> Self {
        let bindings = BUILTIN_PREFIXES
            .iter()
            .map(|(prefix, namespace)| {
                (
                    prefix.to_string(),
                    Binding {
                        namespace: namespace.to_string(),
                        builtin: true,
                    },
                )
            })
            .collect();
        Self { bindings }
    }
}

impl NamespaceMap {
    /// Tabla sin ningún prefijo, ni siquiera los predefinidos.
    #[cfg(test)]
    pub fn empty() -> Self {
        Self {
            bindings: BTreeMap::new(),
        }
    }

    /// Registra un prefijo declarado en el documento.
    /// Las declaraciones del documento sustituyen a los prefijos predefinidos
    /// con el mismo nombre o el mismo espacio de nombres.
    pub fn bind(&mut self, prefix: &str, namespace: &str) {
        self.bindings
            .retain(|_, b| !(b.builtin && b.namespace == namespace));
        self.bindings.insert(
            prefix.to_string(),
            Binding {
                namespace: namespace.to_string(),
                builtin: false,
            },
        );
    }

    #[cfg(test)]
    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.bindings.get(prefix).map(|b| b.namespace.as_str())
    }

    /// Pares (prefijo, espacio de nombres) ordenados por prefijo.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings
            .iter()
            .map(|(prefix, b)| (prefix.as_str(), b.namespace.as_str()))
    }

    /// Forma compacta `prefijo:local` de una IRI, si algún espacio de nombres
    /// la cubre y el resto es un nombre local simple. Gana el espacio de
    /// nombres más largo; a igual longitud, el primer prefijo en orden.
    pub fn compact(&self, iri: &str) -> Option<String> {
        let mut best: Option<(&str, &str)> = None;
        for (prefix, binding) in &self.bindings {
            let Some(local) = iri.strip_prefix(binding.namespace.as_str()) else {
                continue;
            };
            if !is_simple_local_name(local) {
                continue;
            }
            let longer = best.map_or(true, |(_, current)| {
                binding.namespace.len() > iri.len() - current.len()
            });
            if longer {
                best = Some((prefix.as_str(), local));
            }
        }
        best.map(|(prefix, local)| format!("{prefix}:{local}"))
    }
}

/// Nombre local aceptable tras un prefijo: no vacío, sólo alfanuméricos,
/// `_`, `-` y `.`, sin empezar por `-`/`.` ni terminar en `.`.
fn is_simple_local_name(local: &str) -> bool {
    let Some(first) = local.chars().next() else {
        return false;
    };
    if first == '-' || first == '.' || local.ends_with('.') {
        return false;
    }
    local
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
