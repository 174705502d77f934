//! # lessonhub-api
//!
//! HTTP API layer for LessonHub. Contains the axum router, handlers,
//! request/response DTOs, the bearer-token extractor, middleware, and
//! the `AppError` → HTTP status mapping.

pub mod app;
pub mod auth;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use error::ApiError;
pub use state::AppState;
