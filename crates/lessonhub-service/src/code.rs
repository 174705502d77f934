//! Access code service: batch generation and single-use redemption.

use std::sync::Arc;

use chrono::Duration;
use rand::Rng;
use serde_json::json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use lessonhub_core::clock::Clock;
use lessonhub_core::config::access::AccessConfig;
use lessonhub_core::error::AppError;
use lessonhub_core::result::AppResult;
use lessonhub_database::repositories::{
    AccessCodeRepository, AuditLogRepository, CatalogRepository, GrantRepository,
    ProgressRepository,
};
use lessonhub_entity::audit::CreateAuditLogEntry;
use lessonhub_entity::code::AccessCode;
use lessonhub_entity::grant::AccessGrant;
use lessonhub_entity::progress::LessonProgress;

use crate::context::RequestContext;
use crate::tx_err;

/// Characters used in generated codes. Excludes `I`, `O`, `0` and `1`,
/// which are easy to confuse when codes are read aloud or printed.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Retries per code before giving up on token generation.
const MAX_COLLISION_RETRIES: usize = 16;

/// Service owning access code generation and redemption.
#[derive(Debug)]
pub struct AccessCodeService {
    pool: PgPool,
    codes: Arc<AccessCodeRepository>,
    grants: Arc<GrantRepository>,
    progress: Arc<ProgressRepository>,
    catalog: Arc<CatalogRepository>,
    audit: Arc<AuditLogRepository>,
    clock: Arc<dyn Clock>,
    access: AccessConfig,
}

impl AccessCodeService {
    /// Creates a new access code service.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pool: PgPool,
        codes: Arc<AccessCodeRepository>,
        grants: Arc<GrantRepository>,
        progress: Arc<ProgressRepository>,
        catalog: Arc<CatalogRepository>,
        audit: Arc<AuditLogRepository>,
        clock: Arc<dyn Clock>,
        access: AccessConfig,
    ) -> Self {
        Self {
            pool,
            codes,
            grants,
            progress,
            catalog,
            audit,
            clock,
            access,
        }
    }

    /// Generate a batch of single-use codes for a lesson.
    ///
    /// Each code is a fresh random token; a token that collides with an
    /// existing one is silently regenerated, so the batch always comes
    /// back with exactly `count` distinct codes.
    pub async fn generate(
        &self,
        ctx: &RequestContext,
        lesson_id: Uuid,
        count: i64,
    ) -> AppResult<Vec<AccessCode>> {
        if count < 1 || count > self.access.max_code_batch {
            return Err(AppError::validation(format!(
                "Code batch size must be between 1 and {}",
                self.access.max_code_batch
            )));
        }
        self.catalog
            .find_lesson(lesson_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Lesson {lesson_id} not found")))?;

        let mut generated = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let mut inserted = None;
            for _ in 0..MAX_COLLISION_RETRIES {
                let token = generate_token(self.access.code_length);
                if let Some(code) = self.codes.try_insert(&token, lesson_id).await? {
                    inserted = Some(code);
                    break;
                }
            }
            let code = inserted.ok_or_else(|| {
                AppError::internal("Exhausted retries generating a unique access code")
            })?;
            generated.push(code);
        }

        let mut conn = self.pool.acquire().await.map_err(tx_err)?;
        self.audit
            .insert(
                &mut conn,
                &CreateAuditLogEntry {
                    actor_id: ctx.actor_id,
                    action: "code.generate".to_string(),
                    target_type: "access_code".to_string(),
                    target_id: None,
                    details: Some(json!({
                        "lesson_id": lesson_id,
                        "count": count,
                    })),
                    ip_address: ctx.ip_address.clone(),
                },
            )
            .await?;

        info!(%lesson_id, count, actor = %ctx.actor_id, "Access codes generated");
        Ok(generated)
    }

    /// Redeem a code on behalf of a student.
    ///
    /// Runs as one transaction that row-locks the code, so two students
    /// racing on the same code see exactly one success and one
    /// `AlreadyUsed`. A student who already holds an active grant gets
    /// `AlreadyActive` and the code stays unredeemed.
    pub async fn redeem(
        &self,
        ctx: &RequestContext,
        student_id: Uuid,
        code: &str,
    ) -> AppResult<AccessGrant> {
        self.catalog
            .find_student(student_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Student {student_id} not found")))?;

        let now = self.clock.now();
        let expires_at = Some(now + Duration::days(self.access.code_grant_days));

        let mut tx = self.pool.begin().await.map_err(tx_err)?;

        let code_row = self
            .codes
            .find_by_code_for_update(&mut tx, code)
            .await?
            .ok_or_else(|| AppError::invalid_code("Access code does not exist"))?;
        if code_row.is_used {
            return Err(AppError::already_used("Access code has already been redeemed"));
        }

        let existing = self
            .grants
            .find_by_pair_for_update(&mut tx, student_id, code_row.lesson_id)
            .await?;
        if existing.as_ref().is_some_and(|g| g.is_active_at(now)) {
            return Err(AppError::already_active(
                "Student already holds an active grant for this lesson",
            ));
        }

        self.codes
            .mark_used(&mut tx, code_row.id, student_id, now)
            .await?;

        let grant = match existing {
            Some(prior) => {
                self.grants
                    .reactivate(&mut tx, prior.id, now, expires_at, None)
                    .await?
            }
            None => {
                self.grants
                    .insert(&mut tx, student_id, code_row.lesson_id, now, expires_at, None)
                    .await?
            }
        };

        if self
            .progress
            .find_by_pair_for_update(&mut tx, student_id, code_row.lesson_id)
            .await?
            .is_none()
        {
            self.progress
                .insert(
                    &mut tx,
                    &LessonProgress::new(student_id, code_row.lesson_id, now),
                )
                .await?;
        }

        self.audit
            .insert(
                &mut tx,
                &CreateAuditLogEntry {
                    actor_id: student_id,
                    action: "code.redeem".to_string(),
                    target_type: "access_code".to_string(),
                    target_id: Some(code_row.id),
                    details: Some(json!({
                        "lesson_id": code_row.lesson_id,
                        "grant_id": grant.id,
                        "expires_at": expires_at,
                    })),
                    ip_address: ctx.ip_address.clone(),
                },
            )
            .await?;

        tx.commit().await.map_err(tx_err)?;

        info!(
            %student_id,
            lesson_id = %code_row.lesson_id,
            grant_id = %grant.id,
            "Access code redeemed"
        );
        Ok(grant)
    }

    /// List the codes generated for a lesson, newest first.
    pub async fn list_for_lesson(&self, lesson_id: Uuid) -> AppResult<Vec<AccessCode>> {
        self.codes.list_for_lesson(lesson_id).await
    }
}

/// Generate a random code token of the given length.
fn generate_token(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[idx] as char
        })
        .collect()
}
