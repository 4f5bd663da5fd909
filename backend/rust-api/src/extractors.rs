use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, Path, Request,
    },
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Custom JSON extractor that returns JSON error responses instead of plain text.
///
/// Keeps the rejection's status: 422 for missing or mistyped fields, 400 for
/// malformed JSON, 415 for a missing content type.
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: serde::de::DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(json_rejection_response(rejection)),
        }
    }
}

fn json_rejection_response(rejection: JsonRejection) -> Response {
    let status = rejection.status();
    let detail = rejection.body_text();
    tracing::warn!("Rejected JSON request body ({}): {}", status, detail);
    (status, Json(json!({ "detail": detail }))).into_response()
}

/// Path extractor with the same `{"detail": ...}` error body as [`AppJson`].
///
/// A segment that does not parse into `T` (e.g. `/surveys/abc`) is a 422.
pub struct AppPath<T>(pub T);

impl<T, S> FromRequestParts<S> for AppPath<T>
where
    T: serde::de::DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(AppPath(value)),
            Err(rejection) => Err(path_rejection_response(rejection)),
        }
    }
}

fn path_rejection_response(rejection: PathRejection) -> Response {
    let status = match rejection {
        PathRejection::FailedToDeserializePathParams(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => rejection.status(),
    };
    let detail = rejection.body_text();
    tracing::warn!("Rejected path parameters ({}): {}", status, detail);
    (status, Json(json!({ "detail": detail }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::get, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new().route(
            "/items/{id}",
            get(|AppPath(id): AppPath<i64>| async move { id.to_string() }),
        )
    }

    #[tokio::test]
    async fn test_app_path_parses_integer_id() {
        let response = app()
            .oneshot(Request::builder().uri("/items/42").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"42");
    }

    #[tokio::test]
    async fn test_app_path_rejects_non_integer_with_json_detail() {
        let response = app()
            .oneshot(Request::builder().uri("/items/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["detail"].as_str().unwrap().contains("abc"));
    }
}
