//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Authentication configuration for the admin/instructor API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT validation (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Expected JWT issuer claim.
    #[serde(default = "default_issuer")]
    pub jwt_issuer: String,
    /// Leeway in seconds when validating token expiry.
    #[serde(default = "default_leeway")]
    pub jwt_leeway_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_issuer: default_issuer(),
            jwt_leeway_seconds: default_leeway(),
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_issuer() -> String {
    "lessonhub".to_string()
}

fn default_leeway() -> u64 {
    30
}
