//! Lesson progress entity model and student-path event transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::ProgressStatus;

/// A student's pedagogical progress within one lesson.
///
/// Created atomically with its [`crate::grant::AccessGrant`] (1:1 on the
/// `(student_id, lesson_id)` pair). Student events mutate it through the
/// methods below, which enforce the forward-only state machine; each
/// method returns whether anything changed so callers can skip no-op
/// writes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LessonProgress {
    /// Unique progress record identifier.
    pub id: Uuid,
    /// The student this record belongs to.
    pub student_id: Uuid,
    /// The lesson this record belongs to.
    pub lesson_id: Uuid,
    /// Current progress status.
    pub status: ProgressStatus,
    /// Number of recorded video views, capped by policy.
    pub video_view_count: i32,
    /// Most recent exam score, if any.
    pub exam_score: Option<f64>,
    /// Whether the lesson cycle is complete (stored convenience flag).
    pub completed: bool,
    /// When the record was last updated.
    pub last_updated: DateTime<Utc>,
}

impl LessonProgress {
    /// Fresh record for a newly granted lesson.
    pub fn new(student_id: Uuid, lesson_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_id,
            lesson_id,
            status: ProgressStatus::Purchased,
            video_view_count: 0,
            exam_score: None,
            completed: false,
            last_updated: now,
        }
    }

    /// Record a video view.
    ///
    /// Increments the view counter up to `cap` (views past the cap are
    /// accepted without incrementing) and advances `Purchased` to
    /// `VideoWatched`. Never downgrades a later status.
    pub fn record_video_view(&mut self, cap: i32, now: DateTime<Utc>) -> bool {
        let mut changed = false;

        if self.video_view_count < cap {
            self.video_view_count += 1;
            changed = true;
        }
        if self.status == ProgressStatus::Purchased {
            self.status = ProgressStatus::VideoWatched;
            changed = true;
        }
        if changed {
            self.last_updated = now;
        }
        changed
    }

    /// Record an exam result.
    ///
    /// The score is always stored; the status advances to `ExamPassed`
    /// only when the score meets the threshold and the video gate
    /// (`VideoWatched` or later) is already satisfied. Returns whether the
    /// attempt passed.
    pub fn record_exam_result(
        &mut self,
        score: f64,
        pass_threshold: f64,
        now: DateTime<Utc>,
    ) -> bool {
        let passed = score >= pass_threshold;

        self.exam_score = Some(score);
        if passed
            && self.status.rank() >= ProgressStatus::VideoWatched.rank()
            && self.status.rank() < ProgressStatus::ExamPassed.rank()
        {
            self.status = ProgressStatus::ExamPassed;
        }
        self.last_updated = now;
        passed
    }

    /// Record that a graded assignment submission closed the lesson cycle.
    ///
    /// Only moves `ExamPassed` to `AssignmentDone`; a grade arriving before
    /// the exam gate is accepted but does not change the status.
    pub fn record_assignment_graded(&mut self, now: DateTime<Utc>) -> bool {
        if self.status != ProgressStatus::ExamPassed {
            return false;
        }
        self.status = ProgressStatus::AssignmentDone;
        self.completed = true;
        self.last_updated = now;
        true
    }

    /// Admin reset: force the record back to its initial state.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.status = ProgressStatus::Purchased;
        self.video_view_count = 0;
        self.exam_score = None;
        self.completed = false;
        self.last_updated = now;
    }
}
