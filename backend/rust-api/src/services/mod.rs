use std::sync::Arc;

use crate::config::Config;
use crate::store::{self, SurveyStore};

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn SurveyStore>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        tracing::info!(
            "Initializing {:?} storage backend",
            config.storage_backend
        );

        let store = store::connect(&config).await?;

        tracing::info!("Storage backend '{}' ready", store.name());

        Ok(Self { config, store })
    }

    /// Builds state around an existing store handle.
    pub fn with_store(config: Config, store: Arc<dyn SurveyStore>) -> Self {
        Self { config, store }
    }
}

pub mod scoring;
pub mod survey_service;
