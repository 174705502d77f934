//! Route definitions for the LessonHub HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.
//! The router receives `AppState` and passes it to all handlers via
//! Axum's `State` extractor.

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(code_routes())
        .merge(student_lesson_routes())
        .merge(expiration_routes())
        .merge(health_routes());

    let cors = build_cors_layer(&state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        .with_state(state)
}

/// Access code generation and redemption
fn code_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/lessons/{lesson_id}/generate-codes",
            post(handlers::codes::generate_codes),
        )
        .route("/lessons/{lesson_id}/codes", get(handlers::codes::list_codes))
        .route("/codes/redeem", post(handlers::codes::redeem_code))
}

/// Student-lesson table view, grant lifecycle, and progress events
fn student_lesson_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/student-lessons",
            get(handlers::student_lessons::list_student_lessons)
                .post(handlers::student_lessons::create_grant),
        )
        .route(
            "/student-lessons/{id}",
            get(handlers::student_lessons::get_student_lesson)
                .put(handlers::student_lessons::override_fields),
        )
        .route(
            "/student-lessons/{id}/attempts",
            get(handlers::student_lessons::list_attempts),
        )
        .route(
            "/student-lessons/{id}/reset",
            post(handlers::student_lessons::reset_progress),
        )
        .route(
            "/student-lessons/{id}/extend",
            post(handlers::student_lessons::extend_grant),
        )
        .route(
            "/student-lessons/{id}/revoke",
            post(handlers::student_lessons::revoke_grant),
        )
        .route(
            "/student-lessons/{id}/grant",
            post(handlers::student_lessons::regrant),
        )
        .route(
            "/student-lessons/{id}/video-view",
            post(handlers::student_lessons::record_video_view),
        )
        .route(
            "/student-lessons/{id}/exam",
            post(handlers::student_lessons::record_exam),
        )
        .route(
            "/student-lessons/{id}/assignment-graded",
            post(handlers::student_lessons::record_assignment_graded),
        )
}

/// Expiry statistics, expiring-soon report, repurchase eligibility
fn expiration_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/lesson-expiration/statistics",
            get(handlers::expiration::statistics),
        )
        .route(
            "/lesson-expiration/expiring-soon",
            get(handlers::expiration::expiring_soon),
        )
        .route(
            "/lesson-expiration/can-repurchase",
            get(handlers::expiration::can_repurchase),
        )
}

/// Health check endpoints (no auth required)
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/health/detailed", get(handlers::health::detailed_health))
}

/// Build CORS layer from configuration
fn build_cors_layer(state: &AppState) -> CorsLayer {
    use http::Method;
    use tower_http::cors::Any;

    let cors_config = &state.config.server.cors;

    let mut cors = CorsLayer::new();

    if cors_config.allowed_origins.contains(&"*".to_string()) {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<http::HeaderValue> = cors_config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    let methods: Vec<Method> = cors_config
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    cors = cors.allow_methods(methods);

    if cors_config.allowed_headers.contains(&"*".to_string()) {
        cors = cors.allow_headers(Any);
    }

    cors.max_age(std::time::Duration::from_secs(cors_config.max_age_seconds))
}
