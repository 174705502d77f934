//! Grant lifecycle service: purchase, repurchase, extend, revoke.

use std::sync::Arc;

use chrono::Duration;
use serde_json::json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use lessonhub_core::clock::Clock;
use lessonhub_core::error::AppError;
use lessonhub_core::result::AppResult;
use lessonhub_database::repositories::{
    AuditLogRepository, CatalogRepository, ExamAttemptRepository, GrantRepository,
    ProgressRepository,
};
use lessonhub_entity::audit::CreateAuditLogEntry;
use lessonhub_entity::grant::{AccessGrant, RepurchaseEligibility};
use lessonhub_entity::progress::LessonProgress;

use crate::context::RequestContext;
use crate::tx_err;

/// Service owning the access grant lifecycle.
///
/// Every mutation runs in one transaction that row-locks the grant for
/// the `(student, lesson)` pair, so concurrent purchases, extensions and
/// revocations serialize instead of interleaving.
#[derive(Debug)]
pub struct GrantService {
    pool: PgPool,
    grants: Arc<GrantRepository>,
    progress: Arc<ProgressRepository>,
    attempts: Arc<ExamAttemptRepository>,
    catalog: Arc<CatalogRepository>,
    audit: Arc<AuditLogRepository>,
    clock: Arc<dyn Clock>,
}

impl GrantService {
    /// Creates a new grant service.
    pub fn new(
        pool: PgPool,
        grants: Arc<GrantRepository>,
        progress: Arc<ProgressRepository>,
        attempts: Arc<ExamAttemptRepository>,
        catalog: Arc<CatalogRepository>,
        audit: Arc<AuditLogRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            pool,
            grants,
            progress,
            attempts,
            catalog,
            audit,
            clock,
        }
    }

    /// Grant a student access to a lesson (purchase or repurchase).
    ///
    /// `duration_days = None` grants unlimited access. Fails with
    /// `AlreadyActive` when the student already holds an active grant;
    /// an expired or revoked grant row is reactivated in place so the
    /// student's progress history survives the repurchase.
    pub async fn grant(
        &self,
        ctx: &RequestContext,
        student_id: Uuid,
        lesson_id: Uuid,
        duration_days: Option<i64>,
        payment_reference: Option<String>,
    ) -> AppResult<AccessGrant> {
        if let Some(days) = duration_days {
            if days < 1 {
                return Err(AppError::validation(
                    "Grant duration must be at least 1 day",
                ));
            }
        }
        self.catalog
            .find_student(student_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Student {student_id} not found")))?;
        self.catalog
            .find_lesson(lesson_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Lesson {lesson_id} not found")))?;

        let now = self.clock.now();
        let expires_at = duration_days.map(|days| now + Duration::days(days));

        let mut tx = self.pool.begin().await.map_err(tx_err)?;

        let existing = self
            .grants
            .find_by_pair_for_update(&mut tx, student_id, lesson_id)
            .await?;

        let eligibility = RepurchaseEligibility::evaluate(existing.as_ref(), now);
        if !eligibility.can_repurchase {
            return Err(AppError::already_active(
                "Student already holds an active grant for this lesson",
            ));
        }

        let (grant, action) = match existing {
            Some(prior) => {
                let grant = self
                    .grants
                    .reactivate(
                        &mut tx,
                        prior.id,
                        now,
                        expires_at,
                        payment_reference.as_deref(),
                    )
                    .await?;
                (grant, "grant.repurchase")
            }
            None => {
                let grant = self
                    .grants
                    .insert(
                        &mut tx,
                        student_id,
                        lesson_id,
                        now,
                        expires_at,
                        payment_reference.as_deref(),
                    )
                    .await?;
                (grant, "grant.create")
            }
        };

        // Progress is created with the first grant and kept across repurchases.
        if self
            .progress
            .find_by_pair_for_update(&mut tx, student_id, lesson_id)
            .await?
            .is_none()
        {
            self.progress
                .insert(&mut tx, &LessonProgress::new(student_id, lesson_id, now))
                .await?;
        }

        self.audit
            .insert(
                &mut tx,
                &CreateAuditLogEntry {
                    actor_id: ctx.actor_id,
                    action: action.to_string(),
                    target_type: "grant".to_string(),
                    target_id: Some(grant.id),
                    details: Some(json!({
                        "student_id": student_id,
                        "lesson_id": lesson_id,
                        "expires_at": expires_at,
                        "prior_state": eligibility.reason,
                    })),
                    ip_address: ctx.ip_address.clone(),
                },
            )
            .await?;

        tx.commit().await.map_err(tx_err)?;

        info!(
            grant_id = %grant.id,
            %student_id,
            %lesson_id,
            expires_at = ?expires_at,
            action,
            "Access granted"
        );
        Ok(grant)
    }

    /// Extend a grant's expiry by `additional_days`.
    ///
    /// The extension anchors at `max(current expiry, now)`, so extending
    /// an already-expired grant restores `additional_days` of access from
    /// now rather than producing a window still in the past. Unlimited
    /// grants stay unlimited.
    pub async fn extend(
        &self,
        ctx: &RequestContext,
        student_id: Uuid,
        lesson_id: Uuid,
        additional_days: i64,
    ) -> AppResult<AccessGrant> {
        if additional_days < 1 {
            return Err(AppError::validation("Extension must be at least 1 day"));
        }

        let now = self.clock.now();
        let mut tx = self.pool.begin().await.map_err(tx_err)?;

        let grant = self
            .grants
            .find_by_pair_for_update(&mut tx, student_id, lesson_id)
            .await?
            .filter(|g| !g.revoked)
            .ok_or_else(|| {
                AppError::not_found("No grant exists for this student and lesson")
            })?;

        let new_expiry = grant.extended_expiry(now, additional_days);
        let updated = self
            .grants
            .update_expiry(&mut tx, grant.id, new_expiry)
            .await?;

        self.audit
            .insert(
                &mut tx,
                &CreateAuditLogEntry {
                    actor_id: ctx.actor_id,
                    action: "grant.extend".to_string(),
                    target_type: "grant".to_string(),
                    target_id: Some(grant.id),
                    details: Some(json!({
                        "student_id": student_id,
                        "lesson_id": lesson_id,
                        "additional_days": additional_days,
                        "previous_expiry": grant.expires_at,
                        "new_expiry": new_expiry,
                    })),
                    ip_address: ctx.ip_address.clone(),
                },
            )
            .await?;

        tx.commit().await.map_err(tx_err)?;

        info!(
            grant_id = %grant.id,
            %student_id,
            %lesson_id,
            additional_days,
            new_expiry = ?new_expiry,
            "Grant extended"
        );
        Ok(updated)
    }

    /// Revoke a student's access to a lesson.
    ///
    /// Idempotent: revoking an already-revoked grant succeeds without a
    /// second audit entry. With `delete_data`, the progress record and
    /// exam attempt history for the pair are removed in the same
    /// transaction.
    pub async fn revoke(
        &self,
        ctx: &RequestContext,
        student_id: Uuid,
        lesson_id: Uuid,
        delete_data: bool,
    ) -> AppResult<AccessGrant> {
        let mut tx = self.pool.begin().await.map_err(tx_err)?;

        let grant = self
            .grants
            .find_by_pair_for_update(&mut tx, student_id, lesson_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found("No grant exists for this student and lesson")
            })?;

        let newly_revoked = !grant.revoked;
        let grant = if newly_revoked {
            self.grants.revoke(&mut tx, grant.id).await?
        } else {
            grant
        };

        let mut deleted_progress = 0;
        let mut deleted_attempts = 0;
        if delete_data {
            deleted_progress = self
                .progress
                .delete_by_pair(&mut tx, student_id, lesson_id)
                .await?;
            deleted_attempts = self
                .attempts
                .delete_for_pair(&mut tx, student_id, lesson_id)
                .await?;
        }

        if newly_revoked || deleted_progress > 0 || deleted_attempts > 0 {
            self.audit
                .insert(
                    &mut tx,
                    &CreateAuditLogEntry {
                        actor_id: ctx.actor_id,
                        action: "grant.revoke".to_string(),
                        target_type: "grant".to_string(),
                        target_id: Some(grant.id),
                        details: Some(json!({
                            "student_id": student_id,
                            "lesson_id": lesson_id,
                            "delete_data": delete_data,
                            "deleted_progress": deleted_progress,
                            "deleted_attempts": deleted_attempts,
                        })),
                        ip_address: ctx.ip_address.clone(),
                    },
                )
                .await?;
        }

        tx.commit().await.map_err(tx_err)?;

        info!(
            grant_id = %grant.id,
            %student_id,
            %lesson_id,
            delete_data,
            "Grant revoked"
        );
        Ok(grant)
    }

    /// Whether the student currently has active access to the lesson.
    pub async fn is_active(&self, student_id: Uuid, lesson_id: Uuid) -> AppResult<bool> {
        let now = self.clock.now();
        Ok(self
            .grants
            .find_by_pair(student_id, lesson_id)
            .await?
            .map(|g| g.is_active_at(now))
            .unwrap_or(false))
    }

    /// Fetch the grant for a pair, if one exists.
    pub async fn find(&self, student_id: Uuid, lesson_id: Uuid) -> AppResult<Option<AccessGrant>> {
        self.grants.find_by_pair(student_id, lesson_id).await
    }
}
