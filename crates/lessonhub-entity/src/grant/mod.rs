//! Access grant entity and repurchase eligibility.

pub mod eligibility;
pub mod expiring;
pub mod model;

pub use eligibility::{EligibilityReason, RepurchaseEligibility};
pub use expiring::ExpiringGrant;
pub use model::AccessGrant;
