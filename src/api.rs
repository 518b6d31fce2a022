use axum::{
    extract::{DefaultBodyLimit, Form, State},
    response::Html,
    routing::{get, post},
    Router,
};
use serde::{de, Deserialize, Deserializer};
use tokio::task;

use crate::{
    app_state::AppState,
    community::Algorithm,
    config::parse_flag,
    error::VisualizeError,
    pipeline::{self, VisualizeRequest},
};

// --- Payloads ---

/// Formulario de `/api/visualize` (application/x-www-form-urlencoded).
#[derive(Debug, Deserialize)]
pub struct VisualizePayload {
    #[serde(default)]
    turtle: String,
    #[serde(default = "default_include_literals", deserialize_with = "checkbox")]
    include_literals: bool,
    #[serde(default)]
    community_algo: Algorithm,
}

fn default_include_literals() -> bool {
    true
}

fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flag(&raw).ok_or_else(|| de::Error::custom(format!("valor booleano inválido: '{raw}'")))
}

impl From<VisualizePayload> for VisualizeRequest {
    fn from(payload: VisualizePayload) -> Self {
        Self {
            turtle: payload.turtle,
            include_literals: payload.include_literals,
            algorithm: payload.community_algo,
        }
    }
}

/// Límite del cuerpo HTTP: el peor caso de codificar `max_chars` caracteres
/// (4 bytes UTF-8, cada uno como `%XX`) más margen para el resto de campos.
fn body_limit(max_chars: usize) -> usize {
    max_chars.saturating_mul(12).saturating_add(64 * 1024)
}

// --- Router ---

pub fn create_router(app_state: AppState) -> Router {
    let limit = body_limit(app_state.config.max_turtle_chars);
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/visualize", post(visualize_handler))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(app_state)
}

// --- Handlers ---

#[axum::debug_handler]
async fn health_handler() -> &'static str {
    "ok"
}

#[axum::debug_handler]
async fn visualize_handler(
    State(state): State<AppState>,
    Form(payload): Form<VisualizePayload>,
) -> Result<Html<String>, VisualizeError> {
    let request = VisualizeRequest::from(payload);
    let config = state.config.clone();
    let capabilities = state.capabilities;

    let html = task::spawn_blocking(move || pipeline::visualize(&config, &capabilities, &request))
        .await
        .map_err(|e| VisualizeError::Internal(format!("la tarea de renderizado terminó de forma anómala: {e}")))??;

    Ok(Html(html))
}
