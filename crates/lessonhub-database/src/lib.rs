//! # lessonhub-database
//!
//! PostgreSQL connection management and concrete repository
//! implementations for all LessonHub entities.
//!
//! Repository read methods run against the pool; mutation methods that
//! must compose into a larger unit of work take `&mut PgConnection` so
//! services can hold one transaction across repositories.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
