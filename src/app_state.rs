use std::sync::Arc;

use crate::{community::Capabilities, config::AppConfig};

/// Estado compartido e inmutable entre peticiones.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub capabilities: Capabilities,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let capabilities = Capabilities {
            leiden: config.leiden_enabled,
        };
        Self {
            config: Arc::new(config),
            capabilities,
        }
    }
}
