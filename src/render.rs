//! Ensamblado del documento HTML autocontenido del diagrama.
//!
//! La plantilla se incrusta en el binario y se rellena en una sola pasada:
//! los valores sustituidos nunca se vuelven a examinar, así que un `{{...}}`
//! dentro del contenido del usuario no se interpreta como marcador.

use serde::Serialize;
use thiserror::Error;

use crate::community::{Algorithm, Detection};
use crate::config::{Physics, Theme};
use crate::graph::Graph;
use crate::models::Diagram;

const TEMPLATE: &str = include_str!("../templates/diagram.html");

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no se pudo serializar el diagrama: {0}")]
    Json(#[from] serde_json::Error),
    #[error("marcador desconocido en la plantilla: {0}")]
    Placeholder(String),
}

/// Todo lo que el documento necesita mostrar además del diagrama.
#[derive(Debug, Clone, Copy)]
pub struct DocumentContext<'a> {
    pub app_name: &'a str,
    /// Algoritmo elegido por el usuario (el que aparece seleccionado).
    pub selected: Algorithm,
    pub detection: &'a Detection,
    pub source: &'a Graph,
    pub include_literals: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderOptions<'a> {
    physics: &'a Physics,
    font_color: &'a str,
}

/// Escapa texto para insertarlo en HTML (contenido o atributos).
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// JSON apto para un bloque `<script>`: `</` nunca cierra la etiqueta.
fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String, RenderError> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

/// Modularidad como porcentaje redondeado, o "—" si no hay partición.
pub fn format_modularity(modularity: Option<f64>) -> String {
    match modularity {
        Some(q) => format!("{:.0}%", q * 100.0),
        None => "—".to_string(),
    }
}

fn algorithm_options(selected: Algorithm) -> String {
    Algorithm::ALL
        .iter()
        .map(|&a| {
            let marker = if a == selected { " selected" } else { "" };
            format!(
                "<option value=\"{}\"{}>{}</option>",
                a.as_str(),
                marker,
                escape_html(a.display_name())
            )
        })
        .collect::<Vec<_>>()
        .join("")
}

fn fill(template: &str, values: &[(&str, String)]) -> Result<String, RenderError> {
    let extra: usize = values.iter().map(|(_, v)| v.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return Ok(out);
        };
        let name = &after[..end];
        let value = values
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, v)| v)
            .ok_or_else(|| RenderError::Placeholder(name.to_string()))?;
        out.push_str(value);
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Produce el documento final: diagrama, estado de la detección, selector de
/// algoritmo y el grafo de origen serializado para volver a agrupar.
pub fn assemble(
    diagram: &Diagram,
    context: &DocumentContext<'_>,
    physics: &Physics,
    theme: &Theme,
) -> Result<String, RenderError> {
    let source_turtle = context.source.to_turtle();
    let options = RenderOptions {
        physics,
        font_color: &theme.fontcolor,
    };

    let values = [
        ("APP_NAME", escape_html(context.app_name)),
        ("BGCOLOR", escape_html(&theme.bgcolor)),
        ("FONTCOLOR", escape_html(&theme.fontcolor)),
        ("ALGO_OPTIONS", algorithm_options(context.selected)),
        (
            "COMMUNITIES",
            context.detection.community_count().to_string(),
        ),
        (
            "MODULARITY",
            format_modularity(context.detection.modularity),
        ),
        (
            "ALGORITHM_USED",
            escape_html(&context.detection.algorithm_used),
        ),
        ("NODE_COUNT", diagram.nodes.len().to_string()),
        ("EDGE_COUNT", diagram.edges.len().to_string()),
        ("SOURCE_TTL", escape_html(&source_turtle)),
        ("INCLUDE_LITERALS", context.include_literals.to_string()),
        ("GRAPH_JSON", script_json(diagram)?),
        ("OPTIONS_JSON", script_json(&options)?),
    ];

    fill(TEMPLATE, &values)
}
