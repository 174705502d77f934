//! Application builder — wires repositories, services, router and the
//! background sweeper into a running Axum server.

use std::sync::Arc;

use axum::Router;
use sqlx::PgPool;

use lessonhub_core::clock::{Clock, SystemClock};
use lessonhub_core::config::AppConfig;
use lessonhub_core::error::AppError;
use lessonhub_database::repositories::{
    AccessCodeRepository, AuditLogRepository, CatalogRepository, ExamAttemptRepository,
    GrantRepository, ProgressRepository, StudentLessonRepository,
};
use lessonhub_service::{
    AccessCodeService, EligibilityService, ExpirationService, GrantService, ProgressService,
};
use lessonhub_worker::SweepScheduler;

use crate::auth::JwtVerifier;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}

/// Builds the application state from configuration and a database pool.
///
/// Wires repositories into services with the system clock. Also used by
/// the integration test harness, which swaps in its own pool.
pub fn build_state(config: AppConfig, db_pool: PgPool) -> AppState {
    let clock = Arc::new(SystemClock);

    let grants = Arc::new(GrantRepository::new(db_pool.clone()));
    let progress = Arc::new(ProgressRepository::new(db_pool.clone()));
    let attempts = Arc::new(ExamAttemptRepository::new(db_pool.clone()));
    let codes = Arc::new(AccessCodeRepository::new(db_pool.clone()));
    let catalog = Arc::new(CatalogRepository::new(db_pool.clone()));
    let audit = Arc::new(AuditLogRepository::new(db_pool.clone()));
    let student_lessons = Arc::new(StudentLessonRepository::new(db_pool.clone()));

    let grant_service = Arc::new(GrantService::new(
        db_pool.clone(),
        Arc::clone(&grants),
        Arc::clone(&progress),
        Arc::clone(&attempts),
        Arc::clone(&catalog),
        Arc::clone(&audit),
        Arc::clone(&clock) as Arc<dyn Clock>,
    ));
    let progress_service = Arc::new(ProgressService::new(
        db_pool.clone(),
        Arc::clone(&grants),
        Arc::clone(&progress),
        Arc::clone(&attempts),
        Arc::clone(&catalog),
        Arc::clone(&audit),
        Arc::clone(&student_lessons),
        Arc::clone(&clock) as Arc<dyn Clock>,
        config.access.clone(),
    ));
    let code_service = Arc::new(AccessCodeService::new(
        db_pool.clone(),
        Arc::clone(&codes),
        Arc::clone(&grants),
        Arc::clone(&progress),
        Arc::clone(&catalog),
        Arc::clone(&audit),
        Arc::clone(&clock) as Arc<dyn Clock>,
        config.access.clone(),
    ));
    let eligibility_service = Arc::new(EligibilityService::new(
        Arc::clone(&grants),
        Arc::clone(&catalog),
        Arc::clone(&clock) as Arc<dyn Clock>,
    ));
    let expiration_service = Arc::new(ExpirationService::new(
        db_pool.clone(),
        Arc::clone(&grants),
        Arc::clone(&audit),
        clock as Arc<dyn Clock>,
        config.access.clone(),
    ));

    let jwt_verifier = Arc::new(JwtVerifier::new(&config.auth));

    AppState {
        config: Arc::new(config),
        db_pool,
        jwt_verifier,
        grant_service,
        progress_service,
        code_service,
        eligibility_service,
        expiration_service,
    }
}

/// Runs the LessonHub server with the given configuration and pool.
pub async fn run_server(config: AppConfig, db_pool: PgPool) -> Result<(), AppError> {
    tracing::info!("Starting LessonHub server...");

    let worker_config = config.worker.clone();
    let server_config = config.server.clone();
    let state = build_state(config, db_pool);

    // Background sweeper
    let mut scheduler = if worker_config.enabled {
        let scheduler =
            SweepScheduler::new(Arc::clone(&state.expiration_service), worker_config).await?;
        scheduler.register_sweep().await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Background worker disabled; expiration sweep will not run");
        None
    };

    let app = build_app(state);
    let addr = format!("{}:{}", server_config.host, server_config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("LessonHub server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.shutdown().await?;
    }

    Ok(())
}

async fn shutdown_signal() {
    // If signal installation fails there is no way to shut down cleanly.
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
    }
}
