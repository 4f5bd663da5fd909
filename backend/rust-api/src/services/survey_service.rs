use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use thiserror::Error;
use validator::Validate;

use crate::metrics::{record_response_submitted, record_survey_operation, track_db_operation};
use crate::models::survey::{
    CreateSurveyRequest, ScoredResponse, SubmitResponseRequest, Survey, SurveyResponse,
    UpdateSurveyRequest,
};
use crate::services::scoring;
use crate::store::{NewResponse, NewSurvey, StoreError, SurveyStore, SurveyUpdate};

#[derive(Debug, Error)]
pub enum SurveyError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("storage failure: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for SurveyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, .. } => {
                SurveyError::NotFound(format!("{} not found", entity))
            }
            other => SurveyError::Storage(other),
        }
    }
}

impl From<validator::ValidationErrors> for SurveyError {
    fn from(err: validator::ValidationErrors) -> Self {
        SurveyError::Validation(err.to_string())
    }
}

pub struct SurveyService {
    store: Arc<dyn SurveyStore>,
}

impl SurveyService {
    pub fn new(store: Arc<dyn SurveyStore>) -> Self {
        Self { store }
    }

    /// Создать опрос
    pub async fn create_survey(&self, req: CreateSurveyRequest) -> Result<Survey, SurveyError> {
        req.validate()?;

        let new_survey = NewSurvey {
            title: req.title,
            description: req.description,
            questions: req.questions,
            correct_answers: req.correct_answers,
        };

        let survey = track_db_operation(
            "create_survey",
            self.store.name(),
            self.store.create_survey(new_survey),
        )
        .await?;

        record_survey_operation("create");
        tracing::info!(
            "Survey created: id={}, questions={}, scored={}",
            survey.id,
            survey.questions.len(),
            survey.correct_answers.is_some()
        );

        Ok(survey)
    }

    pub async fn list_surveys(&self) -> Result<Vec<Survey>, SurveyError> {
        let surveys =
            track_db_operation("list_surveys", self.store.name(), self.store.list_surveys())
                .await?;
        Ok(surveys)
    }

    pub async fn get_survey(&self, id: i64) -> Result<Survey, SurveyError> {
        let survey =
            track_db_operation("get_survey", self.store.name(), self.store.get_survey(id))
                .await?;
        Ok(survey)
    }

    /// Обновить опрос. The answer key is never touched.
    pub async fn update_survey(
        &self,
        id: i64,
        req: UpdateSurveyRequest,
    ) -> Result<Survey, SurveyError> {
        req.validate()?;

        let update = SurveyUpdate {
            title: req.title,
            description: req.description,
            questions: req.questions,
        };

        let survey = track_db_operation(
            "update_survey",
            self.store.name(),
            self.store.update_survey(id, update),
        )
        .await?;

        record_survey_operation("update");
        tracing::info!("Survey updated: id={}", id);

        Ok(survey)
    }

    /// Удалить опрос вместе со всеми ответами
    pub async fn delete_survey(&self, id: i64) -> Result<(), SurveyError> {
        track_db_operation(
            "delete_survey",
            self.store.name(),
            self.store.delete_survey(id),
        )
        .await?;

        record_survey_operation("delete");
        tracing::info!("Survey deleted: id={}", id);

        Ok(())
    }

    pub async fn submit_response(
        &self,
        survey_id: i64,
        req: SubmitResponseRequest,
    ) -> Result<ScoredResponse, SurveyError> {
        // Stored timestamps keep millisecond precision
        let new_response = NewResponse {
            answers: req.answers,
            student_name: req.student_name,
            timestamp: Utc::now().trunc_subsecs(3),
        };

        let submission = track_db_operation(
            "insert_response",
            self.store.name(),
            self.store.insert_response(survey_id, new_response),
        )
        .await?;

        let result = scoring::score(
            submission.correct_answers.as_ref(),
            &submission.response.answers,
        );

        record_response_submitted(result.is_some());
        tracing::info!(
            "Response submitted: survey={}, response={}, score={:?}",
            survey_id,
            submission.response.id,
            result
        );

        Ok(ScoredResponse {
            response: submission.response,
            score: result.map(|s| s.score),
            total: result.map(|s| s.total),
        })
    }

    /// Responses of a survey in creation order. An unknown survey id yields an
    /// empty list rather than NotFound.
    pub async fn list_responses(
        &self,
        survey_id: i64,
    ) -> Result<Vec<SurveyResponse>, SurveyError> {
        let responses = track_db_operation(
            "list_responses",
            self.store.name(),
            self.store.list_responses(survey_id),
        )
        .await?;
        Ok(responses)
    }
}
