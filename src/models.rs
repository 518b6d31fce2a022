//! Modelos del diagrama (nodos y aristas que consume el renderizador).

use serde::Serialize;

/// Forma con la que se dibuja un nodo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    #[default]
    Circle,
    Box,
}

/// Nodo del diagrama. `id` es único dentro de un renderizado; `label` es
/// sólo presentación.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagramNode {
    pub id: String,
    pub label: String,
    pub tooltip: String,
    pub shape: Shape,
    pub group: String,
}

/// Arista dirigida del diagrama, una por triple materializado.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagramEdge {
    pub source: String,
    pub target: String,
    pub label: String,
    pub tooltip: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagram {
    pub nodes: Vec<DiagramNode>,
    pub edges: Vec<DiagramEdge>,
}
