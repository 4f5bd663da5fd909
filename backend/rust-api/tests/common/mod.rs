#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use survey_api::{
    config::Config, create_router, services::AppState, store::memory::MemorySurveyStore,
};
use tower::ServiceExt;

pub async fn create_test_app() -> Router {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let app_state = Arc::new(AppState::with_store(
        Config::in_memory(),
        Arc::new(MemorySurveyStore::new()),
    ));

    create_router(app_state)
}

/// Sends a request and returns the status with the decoded JSON body
/// (`Value::Null` for an empty or non-JSON body).
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

pub async fn create_survey(app: &Router, body: Value) -> Value {
    let (status, json) = send(app, "POST", "/surveys/", Some(body)).await;
    assert_eq!(status, StatusCode::OK, "create failed: {}", json);
    json
}
