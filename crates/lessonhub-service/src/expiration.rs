//! Expiration sweep and expiry reporting.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use lessonhub_core::clock::Clock;
use lessonhub_core::config::access::AccessConfig;
use lessonhub_core::error::AppError;
use lessonhub_core::result::AppResult;
use lessonhub_database::repositories::{AuditLogRepository, GrantRepository};
use lessonhub_entity::audit::CreateAuditLogEntry;
use lessonhub_entity::grant::ExpiringGrant;

use crate::tx_err;

/// Actor recorded on sweep-produced audit entries.
///
/// The sweeper acts on its own schedule with no authenticated user, so
/// its entries carry the nil UUID as a reserved system actor.
pub const SYSTEM_ACTOR: Uuid = Uuid::nil();

/// Outcome of one expiration sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    /// Number of grants newly marked as processed.
    pub processed: u64,
    /// The grants the sweep picked up.
    pub grants: Vec<SweptGrant>,
    /// When the sweep ran.
    pub swept_at: DateTime<Utc>,
}

/// One grant processed by a sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweptGrant {
    /// The grant that expired.
    pub grant_id: Uuid,
    /// The student who lost access.
    pub student_id: Uuid,
    /// The lesson access was lost to.
    pub lesson_id: Uuid,
    /// When the grant expired.
    pub expires_at: DateTime<Utc>,
}

/// Aggregate expiry counters for the admin dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpirationStatistics {
    /// Unrevoked grants whose expiry has passed.
    pub total_expired: i64,
    /// Unrevoked grants expiring within the default window.
    pub expiring_soon: i64,
    /// Distinct lessons with at least one active grant.
    pub active_lessons: i64,
    /// Distinct students holding an expired grant.
    pub affected_students: i64,
}

/// Service owning the expiration sweep and expiry reporting.
///
/// Expiry is enforced by the grant activity predicate at read time; the
/// sweep only stamps newly expired grants and records the event, so a
/// missed run never extends anyone's access.
#[derive(Debug)]
pub struct ExpirationService {
    pool: PgPool,
    grants: Arc<GrantRepository>,
    audit: Arc<AuditLogRepository>,
    clock: Arc<dyn Clock>,
    access: AccessConfig,
}

impl ExpirationService {
    /// Creates a new expiration service.
    pub fn new(
        pool: PgPool,
        grants: Arc<GrantRepository>,
        audit: Arc<AuditLogRepository>,
        clock: Arc<dyn Clock>,
        access: AccessConfig,
    ) -> Self {
        Self {
            pool,
            grants,
            audit,
            clock,
            access,
        }
    }

    /// Process all newly expired grants.
    ///
    /// Claims unprocessed expired grants atomically and writes one audit
    /// entry per grant in the same transaction. Safe to run concurrently
    /// and repeatedly: a grant is reported exactly once per expiry.
    pub async fn process_expired(&self) -> AppResult<SweepReport> {
        let now = self.clock.now();
        let mut tx = self.pool.begin().await.map_err(tx_err)?;

        let claimed = self.grants.claim_expired(&mut tx, now).await?;

        let mut grants = Vec::with_capacity(claimed.len());
        for grant in &claimed {
            // claim_expired only returns rows with a set expiry.
            let expires_at = grant.expires_at.ok_or_else(|| {
                AppError::internal("Claimed grant is missing its expiry timestamp")
            })?;
            self.audit
                .insert(
                    &mut tx,
                    &CreateAuditLogEntry {
                        actor_id: SYSTEM_ACTOR,
                        action: "grant.expired".to_string(),
                        target_type: "grant".to_string(),
                        target_id: Some(grant.id),
                        details: Some(json!({
                            "student_id": grant.student_id,
                            "lesson_id": grant.lesson_id,
                            "expires_at": expires_at,
                        })),
                        ip_address: None,
                    },
                )
                .await?;
            grants.push(SweptGrant {
                grant_id: grant.id,
                student_id: grant.student_id,
                lesson_id: grant.lesson_id,
                expires_at,
            });
        }

        tx.commit().await.map_err(tx_err)?;

        let report = SweepReport {
            processed: grants.len() as u64,
            grants,
            swept_at: now,
        };
        info!(processed = report.processed, "Expiration sweep completed");
        Ok(report)
    }

    /// List unrevoked grants expiring within the next `within_days` days
    /// (default window from config), soonest first.
    pub async fn list_expiring_soon(
        &self,
        within_days: Option<i64>,
    ) -> AppResult<Vec<ExpiringGrant>> {
        let days = within_days.unwrap_or(self.access.default_expiring_window_days);
        if days < 1 {
            return Err(AppError::validation(
                "Expiring-soon window must be at least 1 day",
            ));
        }
        let now = self.clock.now();
        self.grants
            .list_expiring_between(now, now + Duration::days(days))
            .await
    }

    /// Aggregate expiry counters for the admin dashboard.
    pub async fn statistics(&self) -> AppResult<ExpirationStatistics> {
        let now = self.clock.now();
        let window = now + Duration::days(self.access.default_expiring_window_days);

        Ok(ExpirationStatistics {
            total_expired: self.grants.count_expired(now).await?,
            expiring_soon: self.grants.count_expiring_between(now, window).await?,
            active_lessons: self.grants.count_active_lessons(now).await?,
            affected_students: self.grants.count_affected_students(now).await?,
        })
    }
}
