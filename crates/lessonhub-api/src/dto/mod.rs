//! Request and response DTOs.

pub mod request;
pub mod response;

use validator::Validate;

use lessonhub_core::error::AppError;

/// Run derive-based validation and map failures to a validation error.
pub fn validate<T: Validate>(value: &T) -> Result<(), AppError> {
    value
        .validate()
        .map_err(|e| AppError::validation(format!("Invalid request: {e}")))
}
