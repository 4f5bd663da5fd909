use axum::{
    extract::State,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::ApiError;
use crate::{
    extractors::{AppJson, AppPath},
    models::survey::{
        CreateSurveyRequest, DeleteSurveyResponse, SubmitResponseRequest, UpdateSurveyRequest,
    },
    services::{survey_service::SurveyService, AppState},
};

/// POST /surveys/ - Создать опрос
pub async fn create_survey(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreateSurveyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let survey_service = SurveyService::new(state.store.clone());
    let survey = survey_service.create_survey(req).await?;
    Ok(Json(survey))
}

/// GET /surveys/ - Список опросов
pub async fn list_surveys(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let survey_service = SurveyService::new(state.store.clone());
    let surveys = survey_service.list_surveys().await?;
    Ok(Json(surveys))
}

/// GET /surveys/{id} - Получить опрос
pub async fn get_survey(
    State(state): State<Arc<AppState>>,
    AppPath(survey_id): AppPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let survey_service = SurveyService::new(state.store.clone());
    let survey = survey_service.get_survey(survey_id).await?;
    Ok(Json(survey))
}

/// PUT /surveys/{id} - Обновить опрос (ключ ответов не меняется)
pub async fn update_survey(
    State(state): State<Arc<AppState>>,
    AppPath(survey_id): AppPath<i64>,
    AppJson(req): AppJson<UpdateSurveyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let survey_service = SurveyService::new(state.store.clone());
    let survey = survey_service.update_survey(survey_id, req).await?;
    Ok(Json(survey))
}

/// DELETE /surveys/{id} - Удалить опрос и все ответы
pub async fn delete_survey(
    State(state): State<Arc<AppState>>,
    AppPath(survey_id): AppPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let survey_service = SurveyService::new(state.store.clone());
    survey_service.delete_survey(survey_id).await?;
    Ok(Json(DeleteSurveyResponse {
        detail: "Survey deleted".to_string(),
    }))
}

/// POST /surveys/{id}/responses - Отправить ответы
pub async fn submit_response(
    State(state): State<Arc<AppState>>,
    AppPath(survey_id): AppPath<i64>,
    AppJson(req): AppJson<SubmitResponseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let survey_service = SurveyService::new(state.store.clone());
    let scored = survey_service.submit_response(survey_id, req).await?;
    Ok(Json(scored))
}

/// GET /surveys/{id}/responses - Список ответов (без пересчёта баллов)
pub async fn list_responses(
    State(state): State<Arc<AppState>>,
    AppPath(survey_id): AppPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let survey_service = SurveyService::new(state.store.clone());
    let responses = survey_service.list_responses(survey_id).await?;
    Ok(Json(responses))
}
