//! Request context carrying the authenticated actor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use lessonhub_core::AppError;

/// Role of the authenticated actor on the admin API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    /// Platform administrator.
    Admin,
    /// Course instructor.
    Instructor,
}

impl FromStr for ActorRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "instructor" => Ok(Self::Instructor),
            _ => Err(AppError::validation(format!(
                "Invalid actor role: '{s}'. Expected one of: admin, instructor"
            ))),
        }
    }
}

/// Context for the current authenticated request.
///
/// Extracted by the API layer and passed into service methods so that
/// every audited operation knows *who* is acting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated actor's ID.
    pub actor_id: Uuid,
    /// The actor's role at the time the token was issued.
    pub role: ActorRole,
    /// IP address of the request origin.
    pub ip_address: Option<String>,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(actor_id: Uuid, role: ActorRole, ip_address: Option<String>) -> Self {
        Self {
            actor_id,
            role,
            ip_address,
            request_time: Utc::now(),
        }
    }

    /// Returns whether the current actor is an admin.
    pub fn is_admin(&self) -> bool {
        matches!(self.role, ActorRole::Admin)
    }
}
