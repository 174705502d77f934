//! # lessonhub-entity
//!
//! Domain entity models for LessonHub: access grants, lesson progress,
//! access codes, exam attempts, the audit log, and the minimal catalog
//! records (students, lessons) joined into operator projections.
//!
//! Domain rules that do not need a database — the grant activity
//! predicate, expiry extension math, the progress state machine, and
//! repurchase eligibility — live on these types so they can be tested
//! in isolation.

pub mod audit;
pub mod catalog;
pub mod code;
pub mod grant;
pub mod progress;

pub use audit::{AuditLogEntry, CreateAuditLogEntry};
pub use catalog::{Lesson, Student};
pub use code::AccessCode;
pub use grant::{AccessGrant, EligibilityReason, ExpiringGrant, RepurchaseEligibility};
pub use progress::{ExamAttempt, LessonProgress, ProgressStatus, StudentLessonView};
