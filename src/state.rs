// src/state.rs
use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::advisor::AdvisorClient;
use crate::services::gemini::{ContentGenerator, GeminiClient};
use crate::services::metrics_manager::MetricsManager;
use crate::services::session_manager::SessionManager;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: AppConfig,
    pub sessions: SessionManager,
    pub metrics: MetricsManager,
    pub advisor: AdvisorClient,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let generator = Arc::new(GeminiClient::from_config(&config));
        Self::with_generator(config, generator)
    }

    /// Same as `new` but with the provider swapped out.
    pub fn with_generator(config: AppConfig, generator: Arc<dyn ContentGenerator>) -> Self {
        Self {
            sessions: SessionManager::new(config.session_ttl),
            metrics: MetricsManager::new(),
            advisor: AdvisorClient::new(generator),
            config,
        }
    }
}
