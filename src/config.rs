//! Carga y gestión de configuración de la aplicación (servidor, tema y física del diagrama).

use std::env;
use std::fmt::Display;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::Serialize;

/// Colores del documento del diagrama.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub bgcolor: String,
    pub fontcolor: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            bgcolor: "#0b1020".to_string(),
            fontcolor: "#e7ecf5".to_string(),
        }
    }
}

/// Parámetros de la simulación de fuerzas (modelo forceAtlas2).
/// Sólo se ajustan por despliegue, nunca por petición.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Physics {
    pub gravitational_constant: f64,
    pub central_gravity: f64,
    pub spring_length: f64,
    pub spring_constant: f64,
    pub min_velocity: f64,
}

impl Default for Physics {
    fn default() -> Self {
        Self {
            gravitational_constant: -100.0,
            central_gravity: 0.01,
            spring_length: 200.0,
            spring_constant: 0.08,
            min_velocity: 0.75,
        }
    }
}

/// Configuración completa de la aplicación.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub server_addr: String,
    pub app_name: String,
    /// Longitud máxima del documento Turtle, en caracteres.
    pub max_turtle_chars: usize,
    pub theme: Theme,
    pub physics: Physics,
    pub cors_origins: Vec<String>,
    pub leiden_enabled: bool,
    pub open_browser: bool,
    pub frontend_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:3322".to_string(),
            app_name: "TurtlyScope".to_string(),
            max_turtle_chars: 250_000,
            theme: Theme::default(),
            physics: Physics::default(),
            cors_origins: Vec::new(),
            leiden_enabled: true,
            open_browser: false,
            frontend_dir: "frontend".to_string(),
        }
    }
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Construye la configuración a partir de una función de búsqueda de claves.
    /// Las claves ausentes toman el valor por defecto.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |key: &str, default: String| lookup(key).unwrap_or(default);

        let max_turtle_chars = parse_or(&lookup, "MAX_TURTLE_CHARS", defaults.max_turtle_chars)?;
        if max_turtle_chars == 0 {
            return Err(anyhow!("MAX_TURTLE_CHARS debe ser mayor que cero"));
        }

        let physics = Physics {
            gravitational_constant: parse_or(
                &lookup,
                "PHYSICS_GRAVITATIONAL_CONSTANT",
                defaults.physics.gravitational_constant,
            )?,
            central_gravity: parse_or(
                &lookup,
                "PHYSICS_CENTRAL_GRAVITY",
                defaults.physics.central_gravity,
            )?,
            spring_length: parse_or(&lookup, "PHYSICS_SPRING_LENGTH", defaults.physics.spring_length)?,
            spring_constant: parse_or(
                &lookup,
                "PHYSICS_SPRING_CONSTANT",
                defaults.physics.spring_constant,
            )?,
            min_velocity: parse_or(&lookup, "PHYSICS_MIN_VELOCITY", defaults.physics.min_velocity)?,
        };

        let cors_origins = lookup("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            server_addr: text("SERVER_ADDR", defaults.server_addr),
            app_name: text("APP_NAME", defaults.app_name),
            max_turtle_chars,
            theme: Theme {
                bgcolor: text("THEME_BGCOLOR", defaults.theme.bgcolor),
                fontcolor: text("THEME_FONTCOLOR", defaults.theme.fontcolor),
            },
            physics,
            cors_origins,
            leiden_enabled: flag_or(&lookup, "LEIDEN_ENABLED", defaults.leiden_enabled)?,
            open_browser: flag_or(&lookup, "OPEN_BROWSER", defaults.open_browser)?,
            frontend_dir: text("FRONTEND_DIR", defaults.frontend_dir),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("Valor inválido para {key} ('{raw}'): {e}")),
    }
}

/// Interpreta un booleano de entorno.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn flag_or<F>(lookup: &F, key: &str, default: bool) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => parse_flag(&raw)
            .ok_or_else(|| anyhow!("Valor inválido para {key} ('{raw}'): se esperaba un booleano")),
    }
}
