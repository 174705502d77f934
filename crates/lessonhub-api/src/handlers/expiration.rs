//! Expiry reporting and repurchase-eligibility handlers.

use axum::extract::{Query, State};
use axum::Json;

use crate::dto::request::{CanRepurchaseQuery, ExpiringSoonQuery};
use crate::dto::response::ExpiringSoonEntry;
use crate::dto::validate;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/lesson-expiration/statistics
pub async fn statistics(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let stats = state.expiration_service.statistics().await?;
    Ok(Json(serde_json::json!({ "success": true, "data": stats })))
}

/// GET /api/lesson-expiration/expiring-soon
pub async fn expiring_soon(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<ExpiringSoonQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate(&params)?;

    let entries: Vec<ExpiringSoonEntry> = state
        .expiration_service
        .list_expiring_soon(params.days)
        .await?
        .into_iter()
        .map(ExpiringSoonEntry)
        .collect();

    Ok(Json(serde_json::json!({ "success": true, "data": entries })))
}

/// GET /api/lesson-expiration/can-repurchase
pub async fn can_repurchase(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<CanRepurchaseQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let verdict = state
        .eligibility_service
        .can_repurchase(params.student_id, params.lesson_id)
        .await?;

    Ok(Json(serde_json::json!({ "success": true, "data": verdict })))
}
