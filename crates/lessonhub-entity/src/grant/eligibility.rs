//! Repurchase eligibility evaluation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::AccessGrant;

/// Why a student is or is not eligible to repurchase a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityReason {
    /// The student never held a grant for the lesson.
    NoGrant,
    /// The previous grant was revoked.
    Revoked,
    /// The previous grant has expired.
    Expired,
    /// The student currently holds an active grant.
    ActiveGrant,
}

impl EligibilityReason {
    /// Human-readable explanation for the admin console.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoGrant => "no previous grant",
            Self::Revoked => "previous grant was revoked",
            Self::Expired => "previous grant has expired",
            Self::ActiveGrant => "an active grant already exists",
        }
    }
}

/// Result of a repurchase-eligibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepurchaseEligibility {
    /// Whether the student may repurchase or re-redeem the lesson.
    pub can_repurchase: bool,
    /// The grant state that produced this verdict.
    pub reason: EligibilityReason,
}

impl RepurchaseEligibility {
    /// Evaluate eligibility from the current grant record, if any.
    ///
    /// A student may repurchase only when no grant exists, the grant is
    /// revoked, or the grant is expired. An active grant blocks repurchase.
    /// The same evaluation gates purchase and code redemption so the admin
    /// view stays truthful.
    pub fn evaluate(grant: Option<&AccessGrant>, now: DateTime<Utc>) -> Self {
        match grant {
            None => Self {
                can_repurchase: true,
                reason: EligibilityReason::NoGrant,
            },
            Some(g) if g.revoked => Self {
                can_repurchase: true,
                reason: EligibilityReason::Revoked,
            },
            Some(g) if g.is_expired_at(now) => Self {
                can_repurchase: true,
                reason: EligibilityReason::Expired,
            },
            Some(_) => Self {
                can_repurchase: false,
                reason: EligibilityReason::ActiveGrant,
            },
        }
    }
}
