//! Access code repository implementation.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use lessonhub_core::error::{AppError, ErrorKind};
use lessonhub_core::result::AppResult;
use lessonhub_entity::code::AccessCode;

/// Repository for access code records.
#[derive(Debug, Clone)]
pub struct AccessCodeRepository {
    pool: PgPool,
}

impl AccessCodeRepository {
    /// Create a new access code repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Try to insert a freshly generated code.
    ///
    /// Returns `None` when the token collided with an existing one
    /// (`ON CONFLICT DO NOTHING`); the caller regenerates and retries
    /// that single code rather than failing the batch.
    pub async fn try_insert(&self, code: &str, lesson_id: Uuid) -> AppResult<Option<AccessCode>> {
        sqlx::query_as::<_, AccessCode>(
            "INSERT INTO access_codes (code, lesson_id) VALUES ($1, $2) \
             ON CONFLICT (code) DO NOTHING RETURNING *",
        )
        .bind(code)
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert access code", e))
    }

    /// Find and row-lock a code by its token inside a transaction.
    ///
    /// The row lock serializes concurrent redemptions of the same code so
    /// exactly one can consume it.
    pub async fn find_by_code_for_update(
        &self,
        conn: &mut PgConnection,
        code: &str,
    ) -> AppResult<Option<AccessCode>> {
        sqlx::query_as::<_, AccessCode>("SELECT * FROM access_codes WHERE code = $1 FOR UPDATE")
            .bind(code)
            .fetch_optional(conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock access code", e))
    }

    /// Mark a code consumed inside the redemption transaction.
    pub async fn mark_used(
        &self,
        conn: &mut PgConnection,
        code_id: Uuid,
        student_id: Uuid,
        used_at: DateTime<Utc>,
    ) -> AppResult<AccessCode> {
        sqlx::query_as::<_, AccessCode>(
            "UPDATE access_codes SET is_used = TRUE, used_by_student_id = $2, used_at = $3 \
             WHERE id = $1 RETURNING *",
        )
        .bind(code_id)
        .bind(student_id)
        .bind(used_at)
        .fetch_one(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark code used", e))
    }

    /// List codes generated for a lesson, newest first.
    pub async fn list_for_lesson(&self, lesson_id: Uuid) -> AppResult<Vec<AccessCode>> {
        sqlx::query_as::<_, AccessCode>(
            "SELECT * FROM access_codes WHERE lesson_id = $1 ORDER BY created_at DESC",
        )
        .bind(lesson_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list access codes", e))
    }
}
