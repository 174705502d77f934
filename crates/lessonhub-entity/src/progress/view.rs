//! Operator projection of a student-lesson record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::ProgressStatus;

/// One row of the admin console's student-lessons table: progress joined
/// with student/lesson names and the paired grant's expiry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudentLessonView {
    /// Progress record identifier (the `{id}` in the admin API).
    pub id: Uuid,
    /// The student.
    pub student_id: Uuid,
    /// Student display name.
    pub student_name: String,
    /// The lesson.
    pub lesson_id: Uuid,
    /// Lesson title.
    pub lesson_title: String,
    /// Current progress status.
    pub status: ProgressStatus,
    /// Recorded video views.
    pub video_view_count: i32,
    /// Most recent exam score.
    pub exam_score: Option<f64>,
    /// Whether the lesson cycle is complete.
    pub completed: bool,
    /// Paired grant expiry (None = unlimited or no grant).
    pub expires_at: Option<DateTime<Utc>>,
    /// Whether the paired grant is revoked.
    pub revoked: bool,
    /// When progress was last updated.
    pub last_updated: DateTime<Utc>,
}
