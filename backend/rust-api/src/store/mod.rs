//! Persistence for surveys and their responses.
//!
//! Handlers never talk to a database directly: they receive a
//! [`SurveyStore`] handle through `AppState`. Every method is one unit of
//! work, either fully applied or not applied at all.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::{Config, StorageBackend};
use crate::models::survey::{AnswerSheet, Question, Survey, SurveyResponse};

pub mod memory;
pub mod mongo;

pub use memory::MemorySurveyStore;
pub use mongo::MongoSurveyStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("failed to encode or decode stored data: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("failed to build BSON document: {0}")]
    Bson(#[from] mongodb::bson::ser::Error),

    #[error("corrupt stored data: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn survey_not_found(id: i64) -> Self {
        StoreError::NotFound {
            entity: "Survey",
            id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewSurvey {
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<Question>,
    pub correct_answers: Option<AnswerSheet>,
}

/// Replacement content for an existing survey. Carries no answer key.
#[derive(Debug, Clone)]
pub struct SurveyUpdate {
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone)]
pub struct NewResponse {
    pub answers: AnswerSheet,
    pub student_name: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A persisted response together with the answer key of its survey, read in
/// the same unit of work as the insert.
#[derive(Debug, Clone)]
pub struct StoredSubmission {
    pub response: SurveyResponse,
    pub correct_answers: Option<AnswerSheet>,
}

#[async_trait]
pub trait SurveyStore: Send + Sync {
    /// Backend name for logs and health output.
    fn name(&self) -> &'static str;

    async fn create_survey(&self, survey: NewSurvey) -> Result<Survey, StoreError>;

    /// All surveys in ascending id order.
    async fn list_surveys(&self) -> Result<Vec<Survey>, StoreError>;

    async fn get_survey(&self, id: i64) -> Result<Survey, StoreError>;

    /// Replaces title, description and questions. The answer key is kept.
    async fn update_survey(&self, id: i64, update: SurveyUpdate) -> Result<Survey, StoreError>;

    /// Removes the survey and every response that belongs to it.
    async fn delete_survey(&self, id: i64) -> Result<(), StoreError>;

    /// Appends a response. Fails with `NotFound` (and writes nothing) when the
    /// survey does not exist.
    async fn insert_response(
        &self,
        survey_id: i64,
        response: NewResponse,
    ) -> Result<StoredSubmission, StoreError>;

    /// Responses of a survey in creation order. Unknown surveys yield an
    /// empty list.
    async fn list_responses(&self, survey_id: i64) -> Result<Vec<SurveyResponse>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Builds the store selected by the configuration.
pub async fn connect(config: &Config) -> anyhow::Result<Arc<dyn SurveyStore>> {
    match config.storage_backend {
        StorageBackend::Mongo => {
            let store = MongoSurveyStore::connect(&config.mongo_uri, &config.mongo_database).await?;
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data will not survive a restart");
            Ok(Arc::new(MemorySurveyStore::new()))
        }
    }
}
