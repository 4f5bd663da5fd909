use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::metrics::{HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS};

/// Records request count and latency per normalized route
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = normalize_path(req.uri().path());

    let response = next.run(req).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[&method, &path])
        .observe(duration);

    response
}

/// Collapses survey ids into `{id}` so label cardinality stays bounded.
/// A trailing slash is dropped, so `/surveys/` and `/surveys` share a label.
fn normalize_path(path: &str) -> String {
    let normalized: Vec<&str> = path
        .trim_end_matches('/')
        .split('/')
        .map(|segment| if is_numeric_id(segment) { "{id}" } else { segment })
        .collect();

    if normalized.len() <= 1 {
        return "/".to_string();
    }
    normalized.join("/")
}

fn is_numeric_id(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/surveys/42"), "/surveys/{id}");
        assert_eq!(
            normalize_path("/surveys/42/responses"),
            "/surveys/{id}/responses"
        );
        assert_eq!(normalize_path("/surveys/"), "/surveys");
        assert_eq!(normalize_path("/surveys"), "/surveys");
        assert_eq!(normalize_path("/health"), "/health");
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn test_is_numeric_id() {
        assert!(is_numeric_id("123"));
        assert!(is_numeric_id("-1"));
        assert!(!is_numeric_id("abc"));
        assert!(!is_numeric_id("-"));
        assert!(!is_numeric_id(""));
    }
}
