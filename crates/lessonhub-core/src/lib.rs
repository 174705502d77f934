//! # lessonhub-core
//!
//! Core crate for LessonHub. Contains configuration schemas, the clock
//! abstraction used for expiry evaluation, pagination types, and the
//! unified error system.
//!
//! This crate has **no** internal dependencies on other LessonHub crates.

pub mod clock;
pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::AppError;
pub use result::AppResult;
