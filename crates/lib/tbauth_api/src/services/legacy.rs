//! Legacy login pass-through.
//!
//! Username/password logins are not inspected: the original request bytes go
//! to the platform's native login endpoint and its response (status, headers
//! and a streamed body) comes back unchanged.

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Headers that describe a single connection and must not be relayed.
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Legacy forwarding errors.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("upstream did not answer in time: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("upstream request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("response build failed: {0}")]
    Response(#[from] axum::http::Error),
}

impl From<reqwest::Error> for ForwardError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ForwardError::Timeout(e)
        } else {
            ForwardError::Transport(e)
        }
    }
}

/// Forwards non-OIDC logins to the platform.
#[derive(Clone, Debug)]
pub struct LegacyForwarder {
    http: reqwest::Client,
    login_url: Url,
}

impl LegacyForwarder {
    /// Forwarder for `login_url`, each call bounded by `timeout`.
    pub fn new(login_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, login_url })
    }

    pub fn login_url(&self) -> &Url {
        &self.login_url
    }

    /// POST `body` as-is upstream and relay the answer.
    pub async fn forward(&self, headers: &HeaderMap, body: Bytes) -> Result<Response, ForwardError> {
        let content_type = headers
            .get(CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("application/json"));

        let mut request = self
            .http
            .post(self.login_url.clone())
            .header(CONTENT_TYPE.as_str(), content_type.as_bytes());
        if let Some(accept) = headers.get(ACCEPT) {
            request = request.header(ACCEPT.as_str(), accept.as_bytes());
        }

        let upstream = request.body(body).send().await?;

        let status = StatusCode::from_u16(upstream.status().as_u16())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        debug!(status = status.as_u16(), url = %self.login_url, "legacy login relayed");

        let mut response = Response::builder().status(status);
        for (name, value) in upstream.headers() {
            if !HOP_BY_HOP_HEADERS.contains(&name.as_str()) {
                response = response.header(name.as_str(), value.as_bytes());
            }
        }

        Ok(response.body(Body::from_stream(upstream.bytes_stream()))?)
    }
}
