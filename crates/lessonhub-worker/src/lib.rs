//! # lessonhub-worker
//!
//! Background processing for LessonHub. The only periodic task is the
//! expiration sweep, which stamps newly expired grants and records the
//! expiry events; access enforcement itself happens at read time, so a
//! missed run never extends anyone's access.

pub mod scheduler;

pub use scheduler::SweepScheduler;
