//! Access code generation and redemption handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use crate::dto::request::{GenerateCodesQuery, RedeemRequest};
use crate::dto::validate;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/lessons/{lesson_id}/generate-codes
pub async fn generate_codes(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(lesson_id): Path<Uuid>,
    Query(params): Query<GenerateCodesQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate(&params)?;

    let codes = state
        .code_service
        .generate(auth.context(), lesson_id, params.count)
        .await?;

    Ok(Json(serde_json::json!({ "success": true, "data": codes })))
}

/// GET /api/lessons/{lesson_id}/codes
pub async fn list_codes(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(lesson_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let codes = state.code_service.list_for_lesson(lesson_id).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": codes })))
}

/// POST /api/codes/redeem
pub async fn redeem_code(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<RedeemRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate(&req)?;

    let grant = state
        .code_service
        .redeem(auth.context(), req.student_id, &req.code)
        .await?;

    Ok(Json(serde_json::json!({ "success": true, "data": grant })))
}
