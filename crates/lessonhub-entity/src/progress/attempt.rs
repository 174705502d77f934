//! Exam attempt history entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One exam submission for a lesson.
///
/// Attempts accumulate on every `record_exam_result` and are deleted in
/// the same transaction as an admin reset.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExamAttempt {
    /// Unique attempt identifier.
    pub id: Uuid,
    /// The student who submitted the exam.
    pub student_id: Uuid,
    /// The lesson the exam belongs to.
    pub lesson_id: Uuid,
    /// The achieved score.
    pub score: f64,
    /// Whether the score met the lesson's pass threshold.
    pub passed: bool,
    /// When the attempt was recorded.
    pub created_at: DateTime<Utc>,
}
