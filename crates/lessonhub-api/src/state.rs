//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use sqlx::PgPool;

use lessonhub_core::config::AppConfig;
use lessonhub_service::{
    AccessCodeService, EligibilityService, ExpirationService, GrantService, ProgressService,
};

use crate::auth::JwtVerifier;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// PostgreSQL connection pool (health checks)
    pub db_pool: PgPool,
    /// Bearer token verifier
    pub jwt_verifier: Arc<JwtVerifier>,

    /// Grant lifecycle service
    pub grant_service: Arc<GrantService>,
    /// Progress state machine service
    pub progress_service: Arc<ProgressService>,
    /// Access code service
    pub code_service: Arc<AccessCodeService>,
    /// Repurchase eligibility service
    pub eligibility_service: Arc<EligibilityService>,
    /// Expiration sweep and reporting service
    pub expiration_service: Arc<ExpirationService>,
}
