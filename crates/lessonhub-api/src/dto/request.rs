//! Request DTOs.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use lessonhub_core::error::AppError;
use lessonhub_entity::progress::ProgressStatus;
use lessonhub_service::OverrideFields;

/// Distinguishes an absent JSON field from an explicit `null`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Body for `POST /api/student-lessons` — create a grant.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateGrantRequest {
    /// The student receiving access.
    pub student_id: Uuid,
    /// The lesson to unlock.
    pub lesson_id: Uuid,
    /// Grant duration in days; omit for unlimited access.
    #[validate(range(min = 1))]
    pub duration_days: Option<i64>,
    /// Opaque payment reference.
    pub payment_reference: Option<String>,
}

/// Body for `POST /api/student-lessons/{id}/grant` — repurchase.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RegrantRequest {
    /// Grant duration in days; omit for unlimited access.
    #[validate(range(min = 1))]
    pub duration_days: Option<i64>,
    /// Opaque payment reference.
    pub payment_reference: Option<String>,
}

/// Query for `POST /api/lessons/{lesson_id}/generate-codes`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenerateCodesQuery {
    /// Number of codes to generate.
    #[serde(default = "default_count")]
    #[validate(range(min = 1, max = 100))]
    pub count: i64,
}

fn default_count() -> i64 {
    1
}

/// Body for `POST /api/codes/redeem`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RedeemRequest {
    /// The code being redeemed.
    #[validate(length(min = 1))]
    pub code: String,
    /// The student redeeming it.
    pub student_id: Uuid,
}

/// Query for `POST /api/student-lessons/{id}/extend`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExtendQuery {
    /// Days to add to the current expiry.
    #[validate(range(min = 1))]
    pub days: i64,
}

/// Query for `POST /api/student-lessons/{id}/revoke`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevokeQuery {
    /// Also delete the progress record and exam attempts for the pair.
    #[serde(default)]
    pub delete_data: bool,
}

/// Body for `POST /api/student-lessons/{id}/exam`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExamRequest {
    /// Score achieved on the exam.
    #[validate(range(min = 0.0, max = 100.0))]
    pub score: f64,
}

/// Body for `PUT /api/student-lessons/{id}` — admin field override.
///
/// Absent fields stay untouched; `null` clears the nullable ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverrideFieldsRequest {
    /// New progress status (wire form, e.g. `"EXAM_PASSED"`).
    pub status: Option<String>,
    /// New video view count.
    pub video_view_count: Option<i32>,
    /// New exam score; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub exam_score: Option<Option<f64>>,
    /// New completion flag.
    pub completed: Option<bool>,
    /// New grant expiry; `null` makes the grant unlimited.
    #[serde(default, deserialize_with = "double_option")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl OverrideFieldsRequest {
    /// Parse the wire form into service-level override fields.
    pub fn into_fields(self) -> Result<OverrideFields, AppError> {
        let status = self
            .status
            .as_deref()
            .map(ProgressStatus::from_str)
            .transpose()?;
        Ok(OverrideFields {
            status,
            video_view_count: self.video_view_count,
            exam_score: self.exam_score,
            completed: self.completed,
            expires_at: self.expires_at,
        })
    }
}

/// Query for `GET /api/student-lessons` (filters only; paging comes
/// from [`crate::extractors::PaginationParams`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListStudentLessonsQuery {
    /// Filter by student.
    pub student_id: Option<Uuid>,
    /// Filter by lesson.
    pub lesson_id: Option<Uuid>,
    /// Filter by status (wire form).
    pub status: Option<String>,
}

/// Query for `GET /api/lesson-expiration/expiring-soon`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ExpiringSoonQuery {
    /// Window in days; defaults to the configured window.
    #[validate(range(min = 1))]
    pub days: Option<i64>,
}

/// Query for `GET /api/lesson-expiration/can-repurchase`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanRepurchaseQuery {
    /// The prospective buyer.
    pub student_id: Uuid,
    /// The lesson in question.
    pub lesson_id: Uuid,
}
