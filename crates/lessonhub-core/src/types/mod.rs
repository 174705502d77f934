//! Core type definitions used across the LessonHub workspace.

pub mod pagination;

pub use pagination::{PageRequest, PageResponse};
