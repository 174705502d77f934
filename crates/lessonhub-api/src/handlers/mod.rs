//! HTTP request handlers, organized by domain.

pub mod codes;
pub mod expiration;
pub mod health;
pub mod student_lessons;

use lessonhub_core::error::AppError;

use crate::extractors::AuthUser;

/// Reject non-admin actors on destructive admin operations.
pub(crate) fn require_admin(auth: &AuthUser) -> Result<(), AppError> {
    if !auth.is_admin() {
        return Err(AppError::forbidden("Admin role required"));
    }
    Ok(())
}
