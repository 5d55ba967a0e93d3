//! API request and response bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Username that routes a login to the OIDC path; `password` then carries the
/// identity provider's access token.
pub const OIDC_SENTINEL_USERNAME: &str = "oauth2-token";

/// Request header naming the tenant the caller logs into.
pub const TENANT_HEADER: &str = "x-tenant-name";

/// Platform error code for authentication failures.
pub const ERROR_CODE_AUTHENTICATION: u32 = 10;

/// Platform error code for malformed request parameters.
pub const ERROR_CODE_BAD_REQUEST_PARAMS: u32 = 31;

/// Platform error code for anything else.
pub const ERROR_CODE_GENERAL: u32 = 2;

/// Login body. Both fields are optional so that any JSON object can be
/// inspected for the sentinel and otherwise forwarded untouched.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<serde_json::Value>,
    #[serde(default)]
    pub password: Option<serde_json::Value>,
}

impl LoginRequest {
    /// Whether this login carries an identity provider token.
    pub fn is_oidc(&self) -> bool {
        self.username.as_ref().and_then(serde_json::Value::as_str) == Some(OIDC_SENTINEL_USERNAME)
    }

    /// The presented token, if `password` is a string.
    pub fn token(&self) -> Option<&str> {
        self.password.as_ref().and_then(serde_json::Value::as_str)
    }
}

/// Error body in the platform's own shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status: u16,
    pub message: String,
    pub error_code: u32,
    pub timestamp: DateTime<Utc>,
}
