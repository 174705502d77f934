//! Expiring-grant projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A grant nearing expiry, joined with its lesson title for dashboards.
///
/// Named record internally; the HTTP layer flattens it to the legacy
/// 4-tuple wire shape.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExpiringGrant {
    /// The student holding the grant.
    pub student_id: Uuid,
    /// The lesson the grant covers.
    pub lesson_id: Uuid,
    /// Lesson title for display.
    pub lesson_title: String,
    /// When the grant expires.
    pub expires_at: DateTime<Utc>,
}
