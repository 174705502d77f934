//! Access grant entity model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A time-bounded entitlement letting a student access a lesson.
///
/// Exactly one grant exists per `(student_id, lesson_id)` pair; repurchase
/// reactivates the existing row rather than inserting a second one.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccessGrant {
    /// Unique grant identifier.
    pub id: Uuid,
    /// The student holding the entitlement.
    pub student_id: Uuid,
    /// The lesson the entitlement covers.
    pub lesson_id: Uuid,
    /// When the grant was (last) purchased or redeemed.
    pub purchased_at: DateTime<Utc>,
    /// When the grant expires (None = unlimited).
    pub expires_at: Option<DateTime<Utc>>,
    /// Whether the grant was revoked by an admin.
    pub revoked: bool,
    /// Opaque payment reference, if the grant came from a purchase.
    pub payment_reference: Option<String>,
    /// When the expiration sweeper processed this grant (None = not yet).
    pub expiry_processed_at: Option<DateTime<Utc>>,
    /// Record creation time.
    pub created_at: DateTime<Utc>,
    /// Record update time.
    pub updated_at: DateTime<Utc>,
}

impl AccessGrant {
    /// Whether the grant is active at the given instant.
    ///
    /// A grant is active iff it is not revoked and its expiry is either
    /// unset (unlimited) or strictly in the future. This predicate is the
    /// single source of truth for access checks; the sweeper only reports.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && self.expires_at.map_or(true, |exp| exp > now)
    }

    /// Whether the grant's expiry has passed at the given instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    /// Compute the new expiry after extending by `additional_days`.
    ///
    /// Extension is anchored at `max(expires_at, now)` so that extending an
    /// already-expired grant reactivates it from now rather than from the
    /// stale expiry. An unlimited grant stays unlimited.
    pub fn extended_expiry(
        &self,
        now: DateTime<Utc>,
        additional_days: i64,
    ) -> Option<DateTime<Utc>> {
        self.expires_at
            .map(|exp| exp.max(now) + Duration::days(additional_days))
    }
}
