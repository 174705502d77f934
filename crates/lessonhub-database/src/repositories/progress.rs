//! Lesson progress repository implementation.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use lessonhub_core::error::{AppError, ErrorKind};
use lessonhub_core::result::AppResult;
use lessonhub_entity::progress::LessonProgress;

/// Repository for lesson progress records.
#[derive(Debug, Clone)]
pub struct ProgressRepository {
    pool: PgPool,
}

impl ProgressRepository {
    /// Create a new progress repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a progress record by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<LessonProgress>> {
        sqlx::query_as::<_, LessonProgress>("SELECT * FROM lesson_progress WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find progress", e))
    }

    /// Find the progress record for a (student, lesson) pair.
    pub async fn find_by_pair(
        &self,
        student_id: Uuid,
        lesson_id: Uuid,
    ) -> AppResult<Option<LessonProgress>> {
        sqlx::query_as::<_, LessonProgress>(
            "SELECT * FROM lesson_progress WHERE student_id = $1 AND lesson_id = $2",
        )
        .bind(student_id)
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find progress", e))
    }

    /// Find and row-lock the progress record for a pair inside a transaction.
    pub async fn find_by_pair_for_update(
        &self,
        conn: &mut PgConnection,
        student_id: Uuid,
        lesson_id: Uuid,
    ) -> AppResult<Option<LessonProgress>> {
        sqlx::query_as::<_, LessonProgress>(
            "SELECT * FROM lesson_progress WHERE student_id = $1 AND lesson_id = $2 FOR UPDATE",
        )
        .bind(student_id)
        .bind(lesson_id)
        .fetch_optional(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock progress", e))
    }

    /// Insert a progress record inside a transaction.
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        progress: &LessonProgress,
    ) -> AppResult<LessonProgress> {
        sqlx::query_as::<_, LessonProgress>(
            "INSERT INTO lesson_progress \
             (id, student_id, lesson_id, status, video_view_count, exam_score, completed, last_updated) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(progress.id)
        .bind(progress.student_id)
        .bind(progress.lesson_id)
        .bind(progress.status)
        .bind(progress.video_view_count)
        .bind(progress.exam_score)
        .bind(progress.completed)
        .bind(progress.last_updated)
        .fetch_one(conn)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::with_source(
                ErrorKind::Conflict,
                "Concurrent progress creation for the same student and lesson",
                e,
            ),
            _ => AppError::with_source(ErrorKind::Database, "Failed to create progress", e),
        })
    }

    /// Persist all mutable fields of a progress record inside a transaction.
    pub async fn update(
        &self,
        conn: &mut PgConnection,
        progress: &LessonProgress,
    ) -> AppResult<LessonProgress> {
        sqlx::query_as::<_, LessonProgress>(
            "UPDATE lesson_progress SET status = $2, video_view_count = $3, exam_score = $4, \
             completed = $5, last_updated = $6 WHERE id = $1 RETURNING *",
        )
        .bind(progress.id)
        .bind(progress.status)
        .bind(progress.video_view_count)
        .bind(progress.exam_score)
        .bind(progress.completed)
        .bind(progress.last_updated)
        .fetch_one(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update progress", e))
    }

    /// Delete the progress record for a pair inside a transaction.
    ///
    /// Used by revoke-and-delete. Returns the number of rows removed.
    pub async fn delete_by_pair(
        &self,
        conn: &mut PgConnection,
        student_id: Uuid,
        lesson_id: Uuid,
    ) -> AppResult<u64> {
        let result =
            sqlx::query("DELETE FROM lesson_progress WHERE student_id = $1 AND lesson_id = $2")
                .bind(student_id)
                .bind(lesson_id)
                .execute(conn)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to delete progress", e)
                })?;
        Ok(result.rows_affected())
    }
}
