//! Progress lifecycle service: student events and admin corrections.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use lessonhub_core::clock::Clock;
use lessonhub_core::config::access::AccessConfig;
use lessonhub_core::error::AppError;
use lessonhub_core::result::AppResult;
use lessonhub_core::types::pagination::{PageRequest, PageResponse};
use lessonhub_database::repositories::{
    AuditLogRepository, CatalogRepository, ExamAttemptRepository, GrantRepository,
    ProgressRepository, StudentLessonRepository,
};
use lessonhub_entity::audit::CreateAuditLogEntry;
use lessonhub_entity::progress::{
    ExamAttempt, LessonProgress, ProgressStatus, StudentLessonView,
};

use crate::context::RequestContext;
use crate::tx_err;

/// Field overrides for an admin correction.
///
/// Outer `None` leaves a field untouched; for the nullable fields the
/// inner `None` clears the stored value. `expires_at` targets the grant
/// row for the same pair, everything else the progress row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverrideFields {
    /// New progress status, bypassing forward-only ordering.
    pub status: Option<ProgressStatus>,
    /// New video view count.
    pub video_view_count: Option<i32>,
    /// New exam score (`Some(None)` clears it).
    pub exam_score: Option<Option<f64>>,
    /// New completion flag.
    pub completed: Option<bool>,
    /// New grant expiry (`Some(None)` makes the grant unlimited).
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl OverrideFields {
    /// Whether the request changes anything at all.
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.video_view_count.is_none()
            && self.exam_score.is_none()
            && self.completed.is_none()
            && self.expires_at.is_none()
    }
}

/// Service owning the lesson progress state machine.
///
/// Student events re-validate grant activity inside the same transaction
/// as the progress write, so a revocation or expiry committed a moment
/// earlier is always honored.
#[derive(Debug)]
pub struct ProgressService {
    pool: PgPool,
    grants: Arc<GrantRepository>,
    progress: Arc<ProgressRepository>,
    attempts: Arc<ExamAttemptRepository>,
    catalog: Arc<CatalogRepository>,
    audit: Arc<AuditLogRepository>,
    student_lessons: Arc<StudentLessonRepository>,
    clock: Arc<dyn Clock>,
    access: AccessConfig,
}

impl ProgressService {
    /// Creates a new progress service.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pool: PgPool,
        grants: Arc<GrantRepository>,
        progress: Arc<ProgressRepository>,
        attempts: Arc<ExamAttemptRepository>,
        catalog: Arc<CatalogRepository>,
        audit: Arc<AuditLogRepository>,
        student_lessons: Arc<StudentLessonRepository>,
        clock: Arc<dyn Clock>,
        access: AccessConfig,
    ) -> Self {
        Self {
            pool,
            grants,
            progress,
            attempts,
            catalog,
            audit,
            student_lessons,
            clock,
            access,
        }
    }

    /// Record that the student viewed the lesson video.
    ///
    /// Counts up to the configured cap; views past the cap succeed
    /// without changing the record. Advances `Purchased` to
    /// `VideoWatched` on the first view.
    pub async fn record_video_view(
        &self,
        ctx: &RequestContext,
        student_id: Uuid,
        lesson_id: Uuid,
    ) -> AppResult<LessonProgress> {
        let now = self.clock.now();
        let mut tx = self.pool.begin().await.map_err(tx_err)?;

        self.require_active_grant(&mut tx, student_id, lesson_id, now)
            .await?;
        let mut record = self.locked_progress(&mut tx, student_id, lesson_id).await?;

        let changed = record.record_video_view(self.access.video_view_cap, now);
        if changed {
            record = self.progress.update(&mut tx, &record).await?;
            self.audit
                .insert(
                    &mut tx,
                    &CreateAuditLogEntry {
                        actor_id: student_id,
                        action: "progress.video_view".to_string(),
                        target_type: "progress".to_string(),
                        target_id: Some(record.id),
                        details: Some(json!({
                            "lesson_id": lesson_id,
                            "video_view_count": record.video_view_count,
                            "status": record.status,
                        })),
                        ip_address: ctx.ip_address.clone(),
                    },
                )
                .await?;
        }

        tx.commit().await.map_err(tx_err)?;

        info!(
            %student_id,
            %lesson_id,
            views = record.video_view_count,
            changed,
            "Video view recorded"
        );
        Ok(record)
    }

    /// Record an exam result for the student.
    ///
    /// The attempt is stored in full history and the latest score kept on
    /// the progress record. The status advances only on a passing score
    /// with the video gate already satisfied. Returns the updated record
    /// and whether the attempt passed.
    pub async fn record_exam_result(
        &self,
        ctx: &RequestContext,
        student_id: Uuid,
        lesson_id: Uuid,
        score: f64,
    ) -> AppResult<(LessonProgress, bool)> {
        if !(0.0..=self.access.max_exam_score).contains(&score) {
            return Err(AppError::validation(format!(
                "Exam score must be between 0 and {}",
                self.access.max_exam_score
            )));
        }
        let lesson = self
            .catalog
            .find_lesson(lesson_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Lesson {lesson_id} not found")))?;

        let now = self.clock.now();
        let mut tx = self.pool.begin().await.map_err(tx_err)?;

        self.require_active_grant(&mut tx, student_id, lesson_id, now)
            .await?;
        let mut record = self.locked_progress(&mut tx, student_id, lesson_id).await?;

        let passed = record.record_exam_result(score, lesson.pass_threshold, now);
        self.attempts
            .insert(&mut tx, student_id, lesson_id, score, passed, now)
            .await?;
        record = self.progress.update(&mut tx, &record).await?;

        self.audit
            .insert(
                &mut tx,
                &CreateAuditLogEntry {
                    actor_id: student_id,
                    action: "progress.exam_result".to_string(),
                    target_type: "progress".to_string(),
                    target_id: Some(record.id),
                    details: Some(json!({
                        "lesson_id": lesson_id,
                        "score": score,
                        "passed": passed,
                        "status": record.status,
                    })),
                    ip_address: ctx.ip_address.clone(),
                },
            )
            .await?;

        tx.commit().await.map_err(tx_err)?;

        info!(%student_id, %lesson_id, score, passed, "Exam result recorded");
        Ok((record, passed))
    }

    /// Record that the student's assignment was graded.
    ///
    /// Closes the lesson cycle when the exam gate is already passed; a
    /// grade arriving out of order is accepted without a status change.
    pub async fn record_assignment_graded(
        &self,
        ctx: &RequestContext,
        student_id: Uuid,
        lesson_id: Uuid,
    ) -> AppResult<LessonProgress> {
        let now = self.clock.now();
        let mut tx = self.pool.begin().await.map_err(tx_err)?;

        self.require_active_grant(&mut tx, student_id, lesson_id, now)
            .await?;
        let mut record = self.locked_progress(&mut tx, student_id, lesson_id).await?;

        let changed = record.record_assignment_graded(now);
        if changed {
            record = self.progress.update(&mut tx, &record).await?;
            self.audit
                .insert(
                    &mut tx,
                    &CreateAuditLogEntry {
                        actor_id: student_id,
                        action: "progress.assignment_graded".to_string(),
                        target_type: "progress".to_string(),
                        target_id: Some(record.id),
                        details: Some(json!({
                            "lesson_id": lesson_id,
                            "status": record.status,
                            "completed": record.completed,
                        })),
                        ip_address: ctx.ip_address.clone(),
                    },
                )
                .await?;
        }

        tx.commit().await.map_err(tx_err)?;

        info!(%student_id, %lesson_id, changed, "Assignment grade recorded");
        Ok(record)
    }

    /// Admin reset: force a progress record back to its initial state and
    /// drop its exam attempt history. Idempotent.
    pub async fn admin_reset(
        &self,
        ctx: &RequestContext,
        progress_id: Uuid,
    ) -> AppResult<LessonProgress> {
        let now = self.clock.now();
        let target = self
            .progress
            .find_by_id(progress_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Progress {progress_id} not found")))?;

        let mut tx = self.pool.begin().await.map_err(tx_err)?;

        let mut record = self
            .locked_progress(&mut tx, target.student_id, target.lesson_id)
            .await?;
        record.reset(now);
        record = self.progress.update(&mut tx, &record).await?;
        let dropped_attempts = self
            .attempts
            .delete_for_pair(&mut tx, record.student_id, record.lesson_id)
            .await?;

        self.audit
            .insert(
                &mut tx,
                &CreateAuditLogEntry {
                    actor_id: ctx.actor_id,
                    action: "progress.reset".to_string(),
                    target_type: "progress".to_string(),
                    target_id: Some(record.id),
                    details: Some(json!({
                        "student_id": record.student_id,
                        "lesson_id": record.lesson_id,
                        "dropped_attempts": dropped_attempts,
                    })),
                    ip_address: ctx.ip_address.clone(),
                },
            )
            .await?;

        tx.commit().await.map_err(tx_err)?;

        info!(
            %progress_id,
            student_id = %record.student_id,
            lesson_id = %record.lesson_id,
            dropped_attempts,
            "Progress reset"
        );
        Ok(record)
    }

    /// Admin override: set individual progress (and grant expiry) fields
    /// directly, bypassing the forward-only state machine.
    ///
    /// Bounds still apply: the view count must fit the cap and the score
    /// the score range. Every submitted field lands in the audit details.
    pub async fn admin_override(
        &self,
        ctx: &RequestContext,
        progress_id: Uuid,
        fields: OverrideFields,
    ) -> AppResult<StudentLessonView> {
        if fields.is_empty() {
            return Err(AppError::validation("No fields to override"));
        }
        if let Some(count) = fields.video_view_count {
            if !(0..=self.access.video_view_cap).contains(&count) {
                return Err(AppError::validation(format!(
                    "Video view count must be between 0 and {}",
                    self.access.video_view_cap
                )));
            }
        }
        if let Some(Some(score)) = fields.exam_score {
            if !(0.0..=self.access.max_exam_score).contains(&score) {
                return Err(AppError::validation(format!(
                    "Exam score must be between 0 and {}",
                    self.access.max_exam_score
                )));
            }
        }

        let now = self.clock.now();
        let target = self
            .progress
            .find_by_id(progress_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Progress {progress_id} not found")))?;

        let mut tx = self.pool.begin().await.map_err(tx_err)?;

        let mut record = self
            .locked_progress(&mut tx, target.student_id, target.lesson_id)
            .await?;

        if let Some(status) = fields.status {
            record.status = status;
        }
        if let Some(count) = fields.video_view_count {
            record.video_view_count = count;
        }
        if let Some(score) = fields.exam_score {
            record.exam_score = score;
        }
        if let Some(completed) = fields.completed {
            record.completed = completed;
        }
        record.last_updated = now;
        self.progress.update(&mut tx, &record).await?;

        if let Some(expires_at) = fields.expires_at {
            let grant = self
                .grants
                .find_by_pair_for_update(&mut tx, record.student_id, record.lesson_id)
                .await?
                .ok_or_else(|| {
                    AppError::not_found("No grant exists for this student and lesson")
                })?;
            self.grants
                .update_expiry(&mut tx, grant.id, expires_at)
                .await?;
        }

        self.audit
            .insert(
                &mut tx,
                &CreateAuditLogEntry {
                    actor_id: ctx.actor_id,
                    action: "progress.override".to_string(),
                    target_type: "progress".to_string(),
                    target_id: Some(record.id),
                    details: Some(json!({
                        "student_id": record.student_id,
                        "lesson_id": record.lesson_id,
                        "fields": fields,
                    })),
                    ip_address: ctx.ip_address.clone(),
                },
            )
            .await?;

        tx.commit().await.map_err(tx_err)?;

        info!(%progress_id, actor = %ctx.actor_id, "Progress fields overridden");

        self.student_lessons
            .find_by_id(progress_id)
            .await?
            .ok_or_else(|| AppError::internal("Overridden progress row disappeared"))
    }

    /// List student-lesson rows for the admin table view.
    pub async fn list(
        &self,
        student_id: Option<Uuid>,
        lesson_id: Option<Uuid>,
        status: Option<ProgressStatus>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<StudentLessonView>> {
        self.student_lessons
            .list(student_id, lesson_id, status, page)
            .await
    }

    /// Fetch one student-lesson row by progress ID.
    pub async fn get(&self, progress_id: Uuid) -> AppResult<StudentLessonView> {
        self.student_lessons
            .find_by_id(progress_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Progress {progress_id} not found")))
    }

    /// List the exam attempt history behind a progress record.
    pub async fn list_attempts(&self, progress_id: Uuid) -> AppResult<Vec<ExamAttempt>> {
        let record = self
            .progress
            .find_by_id(progress_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Progress {progress_id} not found")))?;
        self.attempts
            .list_for_pair(record.student_id, record.lesson_id)
            .await
    }

    /// Row-lock the grant and require it active, inside an open transaction.
    async fn require_active_grant(
        &self,
        conn: &mut PgConnection,
        student_id: Uuid,
        lesson_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let active = self
            .grants
            .find_by_pair_for_update(conn, student_id, lesson_id)
            .await?
            .map(|g| g.is_active_at(now))
            .unwrap_or(false);
        if !active {
            return Err(AppError::forbidden(
                "Lesson access is not active for this student",
            ));
        }
        Ok(())
    }

    /// Row-lock the progress record for a pair, inside an open transaction.
    async fn locked_progress(
        &self,
        conn: &mut PgConnection,
        student_id: Uuid,
        lesson_id: Uuid,
    ) -> AppResult<LessonProgress> {
        self.progress
            .find_by_pair_for_update(conn, student_id, lesson_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found("No progress record exists for this student and lesson")
            })
    }
}
