//! Exam attempt repository implementation.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use lessonhub_core::error::{AppError, ErrorKind};
use lessonhub_core::result::AppResult;
use lessonhub_entity::progress::ExamAttempt;

/// Repository for exam attempt history.
#[derive(Debug, Clone)]
pub struct ExamAttemptRepository {
    pool: PgPool,
}

impl ExamAttemptRepository {
    /// Create a new exam attempt repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record an attempt inside the exam-result transaction.
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        student_id: Uuid,
        lesson_id: Uuid,
        score: f64,
        passed: bool,
        created_at: DateTime<Utc>,
    ) -> AppResult<ExamAttempt> {
        sqlx::query_as::<_, ExamAttempt>(
            "INSERT INTO exam_attempts (student_id, lesson_id, score, passed, created_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(student_id)
        .bind(lesson_id)
        .bind(score)
        .bind(passed)
        .bind(created_at)
        .fetch_one(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record exam attempt", e))
    }

    /// List attempts for a pair, newest first.
    pub async fn list_for_pair(
        &self,
        student_id: Uuid,
        lesson_id: Uuid,
    ) -> AppResult<Vec<ExamAttempt>> {
        sqlx::query_as::<_, ExamAttempt>(
            "SELECT * FROM exam_attempts WHERE student_id = $1 AND lesson_id = $2 \
             ORDER BY created_at DESC",
        )
        .bind(student_id)
        .bind(lesson_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list exam attempts", e))
    }

    /// Delete all attempts for a pair inside the reset transaction.
    pub async fn delete_for_pair(
        &self,
        conn: &mut PgConnection,
        student_id: Uuid,
        lesson_id: Uuid,
    ) -> AppResult<u64> {
        let result =
            sqlx::query("DELETE FROM exam_attempts WHERE student_id = $1 AND lesson_id = $2")
                .bind(student_id)
                .bind(lesson_id)
                .execute(conn)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to delete exam attempts", e)
                })?;
        Ok(result.rows_affected())
    }
}
