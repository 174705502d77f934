//! Repurchase eligibility checks for the storefront.

use std::sync::Arc;

use uuid::Uuid;

use lessonhub_core::clock::Clock;
use lessonhub_core::error::AppError;
use lessonhub_core::result::AppResult;
use lessonhub_database::repositories::{CatalogRepository, GrantRepository};
use lessonhub_entity::grant::RepurchaseEligibility;

/// Read-only service answering "may this student buy this lesson again?".
///
/// The verdict is computed from the same grant predicate that gates
/// purchase and redemption, so the storefront can never advertise a
/// repurchase the grant service would reject.
#[derive(Debug)]
pub struct EligibilityService {
    grants: Arc<GrantRepository>,
    catalog: Arc<CatalogRepository>,
    clock: Arc<dyn Clock>,
}

impl EligibilityService {
    /// Creates a new eligibility service.
    pub fn new(
        grants: Arc<GrantRepository>,
        catalog: Arc<CatalogRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            grants,
            catalog,
            clock,
        }
    }

    /// Evaluate repurchase eligibility for a (student, lesson) pair.
    pub async fn can_repurchase(
        &self,
        student_id: Uuid,
        lesson_id: Uuid,
    ) -> AppResult<RepurchaseEligibility> {
        self.catalog
            .find_student(student_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Student {student_id} not found")))?;
        self.catalog
            .find_lesson(lesson_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Lesson {lesson_id} not found")))?;

        let grant = self.grants.find_by_pair(student_id, lesson_id).await?;
        Ok(RepurchaseEligibility::evaluate(
            grant.as_ref(),
            self.clock.now(),
        ))
    }
}
