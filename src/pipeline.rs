//! Pipeline completo de una petición: validación → análisis → proyección →
//! detección → materialización → ensamblado. Es síncrono y sin estado; la
//! capa HTTP lo ejecuta en un hilo bloqueante.

use tracing::{debug, info};

use crate::community::{self, Algorithm, Capabilities, DEFAULT_SEED};
use crate::config::AppConfig;
use crate::error::VisualizeError;
use crate::graph;
use crate::materialize::materialize;
use crate::projection::project;
use crate::render::{self, DocumentContext};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualizeRequest {
    pub turtle: String,
    pub include_literals: bool,
    pub algorithm: Algorithm,
}

/// Rechaza entradas vacías o demasiado largas antes de analizarlas.
pub fn validate(turtle: &str, max_chars: usize) -> Result<(), VisualizeError> {
    if turtle.trim().is_empty() {
        return Err(VisualizeError::EmptyInput);
    }
    if turtle.chars().count() > max_chars {
        return Err(VisualizeError::InputTooLarge { limit: max_chars });
    }
    Ok(())
}

pub fn visualize(
    config: &AppConfig,
    capabilities: &Capabilities,
    request: &VisualizeRequest,
) -> Result<String, VisualizeError> {
    validate(&request.turtle, config.max_turtle_chars)?;

    let graph = graph::parse(&request.turtle).map_err(|e| {
        info!("Documento Turtle rechazado: {}", e);
        VisualizeError::from(e)
    })?;
    if graph.is_empty() {
        info!("El documento no contiene triples; se genera un diagrama vacío");
    }

    let projected = project(&graph, request.include_literals);
    let detection = community::detect(&projected, request.algorithm, capabilities, DEFAULT_SEED);
    let diagram = materialize(&graph, detection.partition.as_ref(), request.include_literals);
    debug!(
        "Diagrama: {} triples, {} nodos, {} aristas, algoritmo '{}'",
        graph.len(),
        diagram.nodes.len(),
        diagram.edges.len(),
        detection.algorithm_used
    );

    let context = DocumentContext {
        app_name: &config.app_name,
        selected: request.algorithm,
        detection: &detection,
        source: &graph,
        include_literals: request.include_literals,
    };
    Ok(render::assemble(&diagram, &context, &config.physics, &config.theme)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(turtle: &str) -> VisualizeRequest {
        VisualizeRequest {
            turtle: turtle.to_string(),
            include_literals: true,
            algorithm: Algorithm::Leiden,
        }
    }

    #[test]
    fn renders_a_small_document() {
        let html = visualize(
            &AppConfig::default(),
            &Capabilities::default(),
            &request("@prefix ex: <http://example.org/> . ex:a ex:b ex:c ."),
        )
        .unwrap();
        assert!(html.contains("\"label\":\"ex:b\""));
        assert!(html.contains("usado: <strong>leiden</strong>"));
    }

    #[test]
    fn empty_input_is_rejected_before_parsing() {
        for blank in ["", "   \n\t  "] {
            let err = visualize(&AppConfig::default(), &Capabilities::default(), &request(blank)).unwrap_err();
            assert!(matches!(err, VisualizeError::EmptyInput));
        }
    }

    #[test]
    fn oversized_input_is_rejected_before_parsing() {
        let config = AppConfig {
            max_turtle_chars: 10,
            ..AppConfig::default()
        };
        // Texto inválido: si llegara al analizador el error sería otro.
        let err = visualize(&config, &Capabilities::default(), &request("esto no es turtle válido")).unwrap_err();
        assert!(matches!(err, VisualizeError::InputTooLarge { limit: 10 }));
    }

    #[test]
    fn limit_counts_characters_not_bytes() {
        assert!(validate("ñññññ", 5).is_ok());
        assert!(validate("ññññññ", 5).is_err());
    }

    #[test]
    fn invalid_syntax_surfaces_the_parser_message() {
        let text = "this is not valid graph syntax";
        let parser_message = graph::parse(text).unwrap_err().to_string();
        let err = visualize(&AppConfig::default(), &Capabilities::default(), &request(text)).unwrap_err();
        assert!(matches!(err, VisualizeError::Parse(_)));
        assert!(err.to_string().contains(&parser_message));
    }

    #[test]
    fn leiden_falls_back_when_disabled() {
        let triangles = r#"@prefix ex: <http://example.org/> .
            ex:a ex:p ex:b . ex:b ex:p ex:c . ex:c ex:p ex:a .
            ex:d ex:p ex:e . ex:e ex:p ex:f . ex:f ex:p ex:d ."#;
        let html = visualize(
            &AppConfig::default(),
            &Capabilities { leiden: false },
            &request(triangles),
        )
        .unwrap();
        assert!(html.contains("usado: <strong>louvain (fallback)</strong>"));
        assert!(html.contains("Comunidades: <strong>2</strong>"));
        assert!(html.contains("<option value=\"leiden\" selected>"));
    }

    #[test]
    fn edgeless_projection_degrades_to_type_groups() {
        let mut req = request(r#"@prefix ex: <http://example.org/> . ex:a ex:name "A" ."#);
        req.include_literals = false;
        req.algorithm = Algorithm::Louvain;
        let html = visualize(&AppConfig::default(), &Capabilities::default(), &req).unwrap();
        assert!(html.contains("usado: <strong>none</strong>"));
        assert!(html.contains("Modularidad: <strong>—</strong>"));
        assert!(html.contains("\"group\":\"IRI\""));
        assert!(html.contains("\"edges\":[]"));
    }

    fn embedded_source(html: &str) -> String {
        let start = html.find("id=\"__ttl\"").unwrap();
        let open = start + html[start..].find('>').unwrap() + 1;
        let close = open + html[open..].find("</textarea>").unwrap();
        html[open..close]
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&amp;", "&")
    }

    #[test]
    fn near_limit_document_can_be_reclustered() {
        let config = AppConfig {
            max_turtle_chars: 2_000,
            ..AppConfig::default()
        };
        let mut turtle = String::from("@prefix ex: <http://example.org/> .\n");
        let mut i = 0;
        loop {
            let line = format!("ex:n{i} ex:next ex:n{} .\n", i + 1);
            if turtle.len() + line.len() > 1_900 {
                break;
            }
            turtle.push_str(&line);
            i += 1;
        }
        turtle.push_str("ex:n0 ex:tag [ ex:q \"v\" ] .\n");
        assert!(turtle.chars().count() <= 2_000);

        let first = visualize(&config, &Capabilities::default(), &request(&turtle)).unwrap();
        let source = embedded_source(&first);
        assert!(source.chars().count() <= 2_000, "{}", source.chars().count());

        let mut again = request(&source);
        again.algorithm = Algorithm::Louvain;
        let second = visualize(&config, &Capabilities::default(), &again).unwrap();
        assert_eq!(embedded_source(&second), source);
    }
}
