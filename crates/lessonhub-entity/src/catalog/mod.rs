//! Minimal catalog models referenced by access-control records.

pub mod model;

pub use model::{Lesson, Student};
