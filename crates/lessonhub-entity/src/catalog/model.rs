//! Student and lesson reference models.
//!
//! Course/lesson CRUD lives in a separate service; these records exist
//! here only for foreign keys, grading thresholds, and name joins in
//! operator projections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A student account, as referenced by grants and progress records.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Student {
    /// Unique student identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Record creation time.
    pub created_at: DateTime<Utc>,
}

/// A lesson, as referenced by grants, codes, and progress records.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lesson {
    /// Unique lesson identifier.
    pub id: Uuid,
    /// Lesson title.
    pub title: String,
    /// Minimum exam score required to pass.
    pub pass_threshold: f64,
    /// Record creation time.
    pub created_at: DateTime<Utc>,
}
