//! Response DTOs.

use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize, Serializer};

use lessonhub_entity::grant::ExpiringGrant;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
}

/// Detailed health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    /// Overall status.
    pub status: String,
    /// Database status.
    pub database: String,
    /// Version.
    pub version: String,
}

/// One expiring-soon entry on the wire.
///
/// Serialized as the legacy 4-tuple
/// `[student_id, lesson_id, lesson_title, expires_at]` the admin console
/// consumes, not as an object.
#[derive(Debug, Clone)]
pub struct ExpiringSoonEntry(pub ExpiringGrant);

impl Serialize for ExpiringSoonEntry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut tuple = serializer.serialize_tuple(4)?;
        tuple.serialize_element(&self.0.student_id)?;
        tuple.serialize_element(&self.0.lesson_id)?;
        tuple.serialize_element(&self.0.lesson_title)?;
        tuple.serialize_element(&self.0.expires_at)?;
        tuple.end()
    }
}
