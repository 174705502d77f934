//! Access grant repository implementation.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use lessonhub_core::error::{AppError, ErrorKind};
use lessonhub_core::result::AppResult;
use lessonhub_entity::grant::{AccessGrant, ExpiringGrant};

/// Repository for access grant records.
#[derive(Debug, Clone)]
pub struct GrantRepository {
    pool: PgPool,
}

impl GrantRepository {
    /// Create a new grant repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the grant for a (student, lesson) pair.
    pub async fn find_by_pair(
        &self,
        student_id: Uuid,
        lesson_id: Uuid,
    ) -> AppResult<Option<AccessGrant>> {
        sqlx::query_as::<_, AccessGrant>(
            "SELECT * FROM access_grants WHERE student_id = $1 AND lesson_id = $2",
        )
        .bind(student_id)
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find grant", e))
    }

    /// Find and row-lock the grant for a pair inside a transaction.
    ///
    /// Serializes grant/extend/revoke and progress writes racing on the
    /// same entitlement.
    pub async fn find_by_pair_for_update(
        &self,
        conn: &mut PgConnection,
        student_id: Uuid,
        lesson_id: Uuid,
    ) -> AppResult<Option<AccessGrant>> {
        sqlx::query_as::<_, AccessGrant>(
            "SELECT * FROM access_grants WHERE student_id = $1 AND lesson_id = $2 FOR UPDATE",
        )
        .bind(student_id)
        .bind(lesson_id)
        .fetch_optional(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock grant", e))
    }

    /// Insert a new grant inside a transaction.
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        student_id: Uuid,
        lesson_id: Uuid,
        purchased_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
        payment_reference: Option<&str>,
    ) -> AppResult<AccessGrant> {
        sqlx::query_as::<_, AccessGrant>(
            "INSERT INTO access_grants (student_id, lesson_id, purchased_at, expires_at, payment_reference) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(student_id)
        .bind(lesson_id)
        .bind(purchased_at)
        .bind(expires_at)
        .bind(payment_reference)
        .fetch_one(conn)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::with_source(
                ErrorKind::Conflict,
                "Concurrent grant creation for the same student and lesson",
                e,
            ),
            _ => AppError::with_source(ErrorKind::Database, "Failed to create grant", e),
        })
    }

    /// Reactivate an existing grant row for a repurchase or re-redemption.
    pub async fn reactivate(
        &self,
        conn: &mut PgConnection,
        grant_id: Uuid,
        purchased_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
        payment_reference: Option<&str>,
    ) -> AppResult<AccessGrant> {
        sqlx::query_as::<_, AccessGrant>(
            "UPDATE access_grants SET revoked = FALSE, purchased_at = $2, expires_at = $3, \
             payment_reference = COALESCE($4, payment_reference), expiry_processed_at = NULL, \
             updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(grant_id)
        .bind(purchased_at)
        .bind(expires_at)
        .bind(payment_reference)
        .fetch_one(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to reactivate grant", e))
    }

    /// Update a grant's expiry inside a transaction (extend/override).
    pub async fn update_expiry(
        &self,
        conn: &mut PgConnection,
        grant_id: Uuid,
        expires_at: Option<DateTime<Utc>>,
    ) -> AppResult<AccessGrant> {
        sqlx::query_as::<_, AccessGrant>(
            "UPDATE access_grants SET expires_at = $2, expiry_processed_at = NULL, \
             updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(grant_id)
        .bind(expires_at)
        .fetch_one(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update grant expiry", e))
    }

    /// Mark a grant revoked inside a transaction.
    pub async fn revoke(&self, conn: &mut PgConnection, grant_id: Uuid) -> AppResult<AccessGrant> {
        sqlx::query_as::<_, AccessGrant>(
            "UPDATE access_grants SET revoked = TRUE, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(grant_id)
        .fetch_one(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to revoke grant", e))
    }

    /// Claim all newly expired grants for sweep processing.
    ///
    /// Stamps `expiry_processed_at` on every unrevoked grant whose expiry
    /// has passed and that has not been processed yet, returning the
    /// claimed rows. The update is atomic, so concurrent sweeps never
    /// report the same grant twice.
    pub async fn claim_expired(
        &self,
        conn: &mut PgConnection,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<AccessGrant>> {
        sqlx::query_as::<_, AccessGrant>(
            "UPDATE access_grants SET expiry_processed_at = $1, updated_at = NOW() \
             WHERE revoked = FALSE AND expires_at IS NOT NULL AND expires_at <= $1 \
             AND expiry_processed_at IS NULL RETURNING *",
        )
        .bind(now)
        .fetch_all(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to claim expired grants", e))
    }

    /// List unrevoked grants expiring in `(now, until]`, joined with
    /// lesson titles, soonest first.
    pub async fn list_expiring_between(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> AppResult<Vec<ExpiringGrant>> {
        sqlx::query_as::<_, ExpiringGrant>(
            "SELECT g.student_id, g.lesson_id, l.title AS lesson_title, g.expires_at \
             FROM access_grants g JOIN lessons l ON l.id = g.lesson_id \
             WHERE g.revoked = FALSE AND g.expires_at > $1 AND g.expires_at <= $2 \
             ORDER BY g.expires_at ASC",
        )
        .bind(now)
        .bind(until)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list expiring grants", e)
        })
    }

    /// Count unrevoked grants whose expiry has passed.
    pub async fn count_expired(&self, now: DateTime<Utc>) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM access_grants \
             WHERE revoked = FALSE AND expires_at IS NOT NULL AND expires_at <= $1",
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count expired grants", e))
    }

    /// Count unrevoked grants expiring in `(now, until]`.
    pub async fn count_expiring_between(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM access_grants \
             WHERE revoked = FALSE AND expires_at > $1 AND expires_at <= $2",
        )
        .bind(now)
        .bind(until)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count expiring grants", e)
        })
    }

    /// Count distinct lessons with at least one active grant.
    pub async fn count_active_lessons(&self, now: DateTime<Utc>) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(DISTINCT lesson_id) FROM access_grants \
             WHERE revoked = FALSE AND (expires_at IS NULL OR expires_at > $1)",
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count active lessons", e))
    }

    /// Count distinct students holding an expired, unrevoked grant.
    pub async fn count_affected_students(&self, now: DateTime<Utc>) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(DISTINCT student_id) FROM access_grants \
             WHERE revoked = FALSE AND expires_at IS NOT NULL AND expires_at <= $1",
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count affected students", e)
        })
    }
}
