//! Student-lesson handlers: the admin table view, grant lifecycle
//! actions, admin corrections, and student-path progress events.

use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use lessonhub_entity::progress::ProgressStatus;

use crate::dto::request::{
    CreateGrantRequest, ExamRequest, ExtendQuery, ListStudentLessonsQuery,
    OverrideFieldsRequest, RegrantRequest, RevokeQuery,
};
use crate::dto::validate;
use crate::error::ApiError;
use crate::extractors::{AuthUser, PaginationParams};
use crate::handlers::require_admin;
use crate::state::AppState;

/// POST /api/student-lessons — grant access (purchase path).
pub async fn create_grant(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateGrantRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate(&req)?;

    let grant = state
        .grant_service
        .grant(
            auth.context(),
            req.student_id,
            req.lesson_id,
            req.duration_days,
            req.payment_reference,
        )
        .await?;

    Ok(Json(serde_json::json!({ "success": true, "data": grant })))
}

/// GET /api/student-lessons — filtered, paginated table view.
pub async fn list_student_lessons(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<ListStudentLessonsQuery>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let status = params
        .status
        .as_deref()
        .map(ProgressStatus::from_str)
        .transpose()?;
    let page = pagination.into_page_request();

    let result = state
        .progress_service
        .list(params.student_id, params.lesson_id, status, &page)
        .await?;

    Ok(Json(serde_json::json!({ "success": true, "data": result })))
}

/// GET /api/student-lessons/{id}
pub async fn get_student_lesson(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let row = state.progress_service.get(id).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": row })))
}

/// GET /api/student-lessons/{id}/attempts
pub async fn list_attempts(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let attempts = state.progress_service.list_attempts(id).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": attempts })))
}

/// PUT /api/student-lessons/{id} — admin field override.
pub async fn override_fields(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<OverrideFieldsRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&auth)?;
    let fields = req.into_fields()?;

    let row = state
        .progress_service
        .admin_override(auth.context(), id, fields)
        .await?;

    Ok(Json(serde_json::json!({ "success": true, "data": row })))
}

/// POST /api/student-lessons/{id}/reset — admin reset.
pub async fn reset_progress(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&auth)?;

    let record = state
        .progress_service
        .admin_reset(auth.context(), id)
        .await?;

    Ok(Json(serde_json::json!({ "success": true, "data": record })))
}

/// POST /api/student-lessons/{id}/extend
pub async fn extend_grant(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(params): Query<ExtendQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate(&params)?;
    let row = state.progress_service.get(id).await?;

    let grant = state
        .grant_service
        .extend(auth.context(), row.student_id, row.lesson_id, params.days)
        .await?;

    Ok(Json(serde_json::json!({ "success": true, "data": grant })))
}

/// POST /api/student-lessons/{id}/revoke
pub async fn revoke_grant(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(params): Query<RevokeQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&auth)?;
    let row = state.progress_service.get(id).await?;

    let grant = state
        .grant_service
        .revoke(
            auth.context(),
            row.student_id,
            row.lesson_id,
            params.delete_data,
        )
        .await?;

    Ok(Json(serde_json::json!({ "success": true, "data": grant })))
}

/// POST /api/student-lessons/{id}/grant — repurchase via an existing row.
pub async fn regrant(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<RegrantRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate(&req)?;
    let row = state.progress_service.get(id).await?;

    let grant = state
        .grant_service
        .grant(
            auth.context(),
            row.student_id,
            row.lesson_id,
            req.duration_days,
            req.payment_reference,
        )
        .await?;

    Ok(Json(serde_json::json!({ "success": true, "data": grant })))
}

/// POST /api/student-lessons/{id}/video-view — student-path event.
pub async fn record_video_view(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let row = state.progress_service.get(id).await?;

    let record = state
        .progress_service
        .record_video_view(auth.context(), row.student_id, row.lesson_id)
        .await?;

    Ok(Json(serde_json::json!({ "success": true, "data": record })))
}

/// POST /api/student-lessons/{id}/exam — student-path event.
pub async fn record_exam(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ExamRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate(&req)?;
    let row = state.progress_service.get(id).await?;

    let (record, passed) = state
        .progress_service
        .record_exam_result(auth.context(), row.student_id, row.lesson_id, req.score)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "data": { "progress": record, "passed": passed }
    })))
}

/// POST /api/student-lessons/{id}/assignment-graded — student-path event.
pub async fn record_assignment_graded(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let row = state.progress_service.get(id).await?;

    let record = state
        .progress_service
        .record_assignment_graded(auth.context(), row.student_id, row.lesson_id)
        .await?;

    Ok(Json(serde_json::json!({ "success": true, "data": record })))
}
