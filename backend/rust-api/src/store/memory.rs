use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{NewResponse, NewSurvey, StoreError, StoredSubmission, SurveyStore, SurveyUpdate};
use crate::models::survey::{Survey, SurveyResponse};

#[derive(Default)]
struct MemoryState {
    last_survey_id: i64,
    last_response_id: i64,
    surveys: BTreeMap<i64, Survey>,
    responses: Vec<SurveyResponse>,
}

/// Process-local store. One lock guards the whole state, so each operation
/// is applied atomically.
#[derive(Default)]
pub struct MemorySurveyStore {
    state: RwLock<MemoryState>,
}

impl MemorySurveyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SurveyStore for MemorySurveyStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn create_survey(&self, survey: NewSurvey) -> Result<Survey, StoreError> {
        let mut state = self.state.write().await;
        state.last_survey_id += 1;

        let created = Survey {
            id: state.last_survey_id,
            title: survey.title,
            description: survey.description,
            questions: survey.questions,
            correct_answers: survey.correct_answers,
        };
        state.surveys.insert(created.id, created.clone());

        Ok(created)
    }

    async fn list_surveys(&self) -> Result<Vec<Survey>, StoreError> {
        let state = self.state.read().await;
        Ok(state.surveys.values().cloned().collect())
    }

    async fn get_survey(&self, id: i64) -> Result<Survey, StoreError> {
        let state = self.state.read().await;
        state
            .surveys
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::survey_not_found(id))
    }

    async fn update_survey(&self, id: i64, update: SurveyUpdate) -> Result<Survey, StoreError> {
        let mut state = self.state.write().await;
        let survey = state
            .surveys
            .get_mut(&id)
            .ok_or_else(|| StoreError::survey_not_found(id))?;

        survey.title = update.title;
        survey.description = update.description;
        survey.questions = update.questions;

        Ok(survey.clone())
    }

    async fn delete_survey(&self, id: i64) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.surveys.remove(&id).is_none() {
            return Err(StoreError::survey_not_found(id));
        }
        state.responses.retain(|response| response.survey_id != id);
        Ok(())
    }

    async fn insert_response(
        &self,
        survey_id: i64,
        response: NewResponse,
    ) -> Result<StoredSubmission, StoreError> {
        let mut state = self.state.write().await;
        let correct_answers = state
            .surveys
            .get(&survey_id)
            .ok_or_else(|| StoreError::survey_not_found(survey_id))?
            .correct_answers
            .clone();

        state.last_response_id += 1;
        let stored = SurveyResponse {
            id: state.last_response_id,
            survey_id,
            answers: response.answers,
            timestamp: response.timestamp,
            student_name: response.student_name,
        };
        state.responses.push(stored.clone());

        Ok(StoredSubmission {
            response: stored,
            correct_answers,
        })
    }

    async fn list_responses(&self, survey_id: i64) -> Result<Vec<SurveyResponse>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .responses
            .iter()
            .filter(|response| response.survey_id == survey_id)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
