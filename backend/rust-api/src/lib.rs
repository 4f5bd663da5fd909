use axum::{
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod shutdown;
pub mod store;
pub mod utils;

pub use config::Config;
pub use services::AppState;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Survey clients are browser frontends served from other origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        // Metrics endpoint with Basic Auth protection
        .route(
            "/metrics",
            get(handlers::metrics_handler).layer(middleware::from_fn_with_state(
                app_state.clone(),
                handlers::metrics_auth_middleware,
            )),
        )
        .merge(survey_routes())
        .with_state(app_state)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http().make_span_with(middlewares::trace::make_request_span))
        .layer(middleware::from_fn(
            middlewares::trace::trace_context_middleware,
        ))
}

fn survey_routes() -> Router<Arc<AppState>> {
    let collection = || {
        get(handlers::surveys::list_surveys).post(handlers::surveys::create_survey)
    };

    Router::new()
        .route("/surveys", collection())
        .route("/surveys/", collection())
        .route(
            "/surveys/{id}",
            get(handlers::surveys::get_survey)
                .put(handlers::surveys::update_survey)
                .delete(handlers::surveys::delete_survey),
        )
        .route(
            "/surveys/{id}/responses",
            get(handlers::surveys::list_responses).post(handlers::surveys::submit_response),
        )
}
