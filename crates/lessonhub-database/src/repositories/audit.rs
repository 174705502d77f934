//! Audit log repository implementation.

use sqlx::{PgConnection, PgPool};

use lessonhub_core::error::{AppError, ErrorKind};
use lessonhub_core::result::AppResult;
use lessonhub_entity::audit::{AuditLogEntry, CreateAuditLogEntry};

/// Repository for audit log entries.
///
/// Every mutating operation in the access core writes exactly one entry,
/// inside the same transaction as the mutation it records.
#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    pool: PgPool,
}

impl AuditLogRepository {
    /// Create a new audit log repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create an audit log entry inside an open transaction.
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        data: &CreateAuditLogEntry,
    ) -> AppResult<AuditLogEntry> {
        sqlx::query_as::<_, AuditLogEntry>(
            "INSERT INTO audit_log (actor_id, action, target_type, target_id, details, ip_address) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(data.actor_id)
        .bind(&data.action)
        .bind(&data.target_type)
        .bind(data.target_id)
        .bind(&data.details)
        .bind(&data.ip_address)
        .fetch_one(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create audit entry", e))
    }

    /// Count occurrences of an action since a specific time.
    pub async fn count_actions_since(
        &self,
        action: &str,
        since: chrono::DateTime<chrono::Utc>,
    ) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM audit_log WHERE action = $1 AND created_at >= $2",
        )
        .bind(action)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count audit actions", e)
        })
    }
}
