//! Login request handler.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use tracing::{error, warn};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{LoginRequest, TENANT_HEADER};
use crate::services::auth;

/// `POST /api/auth/login`: OIDC token exchange, or legacy pass-through.
///
/// The raw body is kept so the legacy path forwards exactly the bytes the
/// caller sent.
pub async fn login_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let request = if is_json(&headers) {
        let value: serde_json::Value = serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))?;
        serde_json::from_value(value).unwrap_or_default()
    } else {
        LoginRequest::default()
    };

    if !request.is_oidc() {
        return match state.forwarder.forward(&headers, body).await {
            Ok(resp) => Ok(resp),
            Err(e) => {
                error!(error = %e, url = %state.forwarder.login_url(), "legacy login forward failed");
                Err(e.into())
            }
        };
    }

    let tenant = headers.get(TENANT_HEADER).and_then(|v| v.to_str().ok());
    let token = request.token().unwrap_or_default();

    match auth::oidc_login(&state, token, tenant).await {
        Ok(result) => Ok(Json(result).into_response()),
        Err(e) => {
            if e.is_internal() {
                error!(error = %e, tenant = tenant.unwrap_or_default(), "OIDC login failed");
            } else {
                warn!(error = %e, tenant = tenant.unwrap_or_default(), "OIDC login rejected");
            }
            Err(e.into())
        }
    }
}

/// Whether the body is declared as JSON (`application/json` or `*/*+json`).
/// Only such bodies are inspected for the OIDC sentinel.
fn is_json(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let essence = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn with_type(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn json_content_types_are_inspected() {
        assert!(is_json(&with_type("application/json")));
        assert!(is_json(&with_type("Application/JSON; charset=utf-8")));
        assert!(is_json(&with_type("application/vnd.api+json")));
    }

    #[test]
    fn other_content_types_are_not() {
        assert!(!is_json(&HeaderMap::new()));
        assert!(!is_json(&with_type("application/x-www-form-urlencoded")));
        assert!(!is_json(&with_type("text/plain")));
    }
}
