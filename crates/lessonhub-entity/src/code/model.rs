//! Access code entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A single-use redemption code scoped to one lesson.
///
/// A code transitions `is_used: false → true` exactly once; redemption and
/// the grant mutation it triggers commit as one transaction.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccessCode {
    /// Unique code record identifier.
    pub id: Uuid,
    /// The human-typeable token.
    pub code: String,
    /// The lesson this code unlocks.
    pub lesson_id: Uuid,
    /// Whether the code has been redeemed.
    pub is_used: bool,
    /// Which student redeemed the code, if any.
    pub used_by_student_id: Option<Uuid>,
    /// When the code was generated.
    pub created_at: DateTime<Utc>,
    /// When the code was redeemed, if it was.
    pub used_at: Option<DateTime<Utc>>,
}
