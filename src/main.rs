// Módulos de la aplicación
mod api;
mod app_state;
mod community;
mod config;
mod error;
mod graph;
mod materialize;
mod models;
mod namespace;
mod pipeline;
mod projection;
mod render;

use crate::app_state::AppState;
use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; script-src 'self' 'unsafe-inline'; \
     style-src 'self' 'unsafe-inline'; img-src 'self' data:; connect-src 'self'";

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Cargar .env e inicializar logging
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Cargar configuración y capacidades
    let cfg = config::AppConfig::from_env().context("Error al cargar la configuración")?;
    let app_state = AppState::new(cfg);
    info!(
        "Detección disponible: leiden={} (límite de entrada: {} caracteres)",
        app_state.capabilities.leiden, app_state.config.max_turtle_chars
    );

    // 3. Router de la API y ficheros estáticos
    let app = build_app(app_state.clone())?;

    // 4. Iniciar el servidor
    let server_addr = &app_state.config.server_addr;
    let listener = tokio::net::TcpListener::bind(server_addr)
        .await
        .with_context(|| format!("No se pudo escuchar en {server_addr}"))?;
    let server_url = format!("http://{}", listener.local_addr()?);
    info!("🚀 Servidor escuchando en {}", &server_url);

    if app_state.config.open_browser && webbrowser::open(&server_url).is_err() {
        info!("No se pudo abrir el navegador. Por favor, accede a {} manualmente.", server_url);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Error en el servidor HTTP")?;

    info!("✅ Servidor cerrado correctamente.");
    Ok(())
}

/// Compone la API, el directorio estático y las capas transversales.
fn build_app(app_state: AppState) -> Result<Router> {
    let frontend_dir = app_state.config.frontend_dir.clone();
    let cors = cors_layer(&app_state.config.cors_origins)?;

    let mut app = Router::new()
        .merge(api::create_router(app_state))
        .fallback_service(ServeDir::new(frontend_dir));
    if let Some(cors) = cors {
        app = app.layer(cors);
    }

    Ok(app
        .layer(CompressionLayer::new())
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ))
        .layer(TraceLayer::new_for_http()))
}

/// Sin orígenes configurados no se instala CORS.
fn cors_layer(origins: &[String]) -> Result<Option<CorsLayer>> {
    if origins.is_empty() {
        return Ok(None);
    }
    let origins = origins
        .iter()
        .map(|o| HeaderValue::from_str(o).with_context(|| format!("Origen CORS inválido: {o}")))
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any),
    ))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("No se pudo instalar el manejador de Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Señal de apagado recibida, iniciando cierre del servidor.");
}
