//! # lessonhub-service
//!
//! Business logic service layer for LessonHub. Each service orchestrates
//! repositories, the injected clock, and the audit trail to implement
//! application-level use cases.
//!
//! Services follow constructor injection — all dependencies are provided
//! at construction time via `Arc` references. Every mutating operation
//! runs as one short transaction and writes one audit record inside it.

pub mod code;
pub mod context;
pub mod eligibility;
pub mod expiration;
pub mod grant;
pub mod progress;

pub use code::AccessCodeService;
pub use context::{ActorRole, RequestContext};
pub use eligibility::EligibilityService;
pub use expiration::{ExpirationService, ExpirationStatistics, SweepReport};
pub use grant::GrantService;
pub use progress::{OverrideFields, ProgressService};

use lessonhub_core::error::{AppError, ErrorKind};

/// Map a transaction begin/commit failure into the unified error type.
pub(crate) fn tx_err(err: sqlx::Error) -> AppError {
    AppError::with_source(ErrorKind::Database, "Transaction failure", err)
}
