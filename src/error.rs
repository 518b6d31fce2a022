//! Errores de una petición de visualización y su traducción a HTTP.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::graph::ParseError;
use crate::render::RenderError;

#[derive(Debug, Error)]
pub enum VisualizeError {
    #[error("No se proporcionó contenido Turtle.")]
    EmptyInput,
    #[error("El documento supera el máximo de {limit} caracteres.")]
    InputTooLarge { limit: usize },
    #[error("Error de análisis: {0}")]
    Parse(#[from] ParseError),
    #[error("Error al generar el diagrama: {0}")]
    Render(#[from] RenderError),
    #[error("Error interno: {0}")]
    Internal(String),
}

impl VisualizeError {
    pub fn status(&self) -> StatusCode {
        match self {
            VisualizeError::EmptyInput => StatusCode::UNPROCESSABLE_ENTITY,
            VisualizeError::InputTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            VisualizeError::Parse(_) => StatusCode::BAD_REQUEST,
            VisualizeError::Render(_) | VisualizeError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for VisualizeError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            // El detalle sólo va al log.
            error!("Fallo al visualizar: {}", self);
            "Error interno del servidor.".to_string()
        } else {
            self.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_each_kind_to_its_status() {
        assert_eq!(VisualizeError::EmptyInput.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            VisualizeError::InputTooLarge { limit: 10 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            VisualizeError::Parse(ParseError::Syntax("x".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            VisualizeError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn parse_message_is_kept_verbatim() {
        let err = VisualizeError::from(ParseError::Syntax("línea 1: se esperaba '.'".into()));
        assert_eq!(err.to_string(), "Error de análisis: línea 1: se esperaba '.'");
    }

    #[test]
    fn server_errors_hide_details() {
        let response = VisualizeError::Internal("pánico en el worker".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
