//! Application error types.
//!
//! This is the only place where login failures are collapsed into HTTP
//! responses. Callers on the OIDC path see one of two outcomes: a generic
//! 401 for every credential, store or signing failure, or a 403 when the
//! token is valid but grants no role for the requested tenant.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tbauth_core::auth::{IdentityError, LoginError};
use thiserror::Error;

use crate::models::{
    ERROR_CODE_AUTHENTICATION, ERROR_CODE_BAD_REQUEST_PARAMS, ERROR_CODE_GENERAL, ErrorResponse,
};
use crate::services::legacy::ForwardError;

/// Message of every 401 on the OIDC path.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

/// Plain-text body of the 403 for a token without a tenant role.
pub const AUTHENTICATION_FAILED_MESSAGE: &str = "Authentication failed";

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("upstream unreachable: {0}")]
    BadGateway(String),

    #[error("upstream timed out: {0}")]
    GatewayTimeout(String),

    #[error("internal server error: {0}")]
    Internal(String),
}

fn error_body(status: StatusCode, message: &str, error_code: u32) -> Response {
    let body = Json(ErrorResponse {
        status: status.as_u16(),
        message: message.to_string(),
        error_code,
        timestamp: Utc::now(),
    });
    (status, body).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::InvalidCredentials => error_body(
                StatusCode::UNAUTHORIZED,
                INVALID_CREDENTIALS_MESSAGE,
                ERROR_CODE_AUTHENTICATION,
            ),
            AppError::AuthenticationFailed => (
                StatusCode::FORBIDDEN,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                AUTHENTICATION_FAILED_MESSAGE,
            )
                .into_response(),
            AppError::BadRequest(m) => {
                error_body(StatusCode::BAD_REQUEST, m, ERROR_CODE_BAD_REQUEST_PARAMS)
            }
            AppError::BadGateway(_) => error_body(
                StatusCode::BAD_GATEWAY,
                "Authentication service unavailable",
                ERROR_CODE_GENERAL,
            ),
            AppError::GatewayTimeout(_) => error_body(
                StatusCode::GATEWAY_TIMEOUT,
                "Authentication service timed out",
                ERROR_CODE_GENERAL,
            ),
            AppError::Internal(_) => error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                ERROR_CODE_GENERAL,
            ),
        }
    }
}

impl From<LoginError> for AppError {
    fn from(e: LoginError) -> Self {
        match e {
            LoginError::Identity(IdentityError::NoMatchingRole { .. }) => {
                AppError::AuthenticationFailed
            }
            LoginError::Identity(IdentityError::MissingRealmAccess)
            | LoginError::Verify(_)
            | LoginError::Lookup(_)
            | LoginError::Mint(_) => AppError::InvalidCredentials,
        }
    }
}

impl From<ForwardError> for AppError {
    fn from(e: ForwardError) -> Self {
        match e {
            ForwardError::Timeout(_) => AppError::GatewayTimeout(e.to_string()),
            ForwardError::Transport(_) => AppError::BadGateway(e.to_string()),
            ForwardError::Response(_) => AppError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tbauth_core::auth::{LookupError, VerifyError};

    #[test]
    fn credential_failures_collapse_to_401() {
        let kinds = [
            LoginError::Verify(VerifyError::KeyNotFound("k9".into())),
            LoginError::Verify(VerifyError::SignatureInvalid),
            LoginError::Verify(VerifyError::MalformedToken("x".into())),
            LoginError::Lookup(LookupError::NotFound("a".into())),
            LoginError::Lookup(LookupError::MultipleMatches("a".into())),
            LoginError::Lookup(LookupError::Store(sqlx::Error::PoolTimedOut)),
            LoginError::Identity(IdentityError::MissingRealmAccess),
        ];
        for kind in kinds {
            let resp = AppError::from(kind).into_response();
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn missing_role_is_403() {
        let err = LoginError::Identity(IdentityError::NoMatchingRole { tenant: None });
        let resp = AppError::from(err).into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
