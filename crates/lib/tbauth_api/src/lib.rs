//! # tbauth_api
//!
//! HTTP API library for the tbauth login gateway.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tbauth_core::auth::jwt::TokenMinter;
use tbauth_core::auth::keyset::KeySetCache;
use tbauth_core::auth::queries::UserStore;
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{auth, health};
use crate::services::legacy::LegacyForwarder;

/// Login endpoint, shared by the OIDC and legacy paths.
pub const POST_AUTH_LOGIN: &str = "/api/auth/login";

/// Liveness endpoint.
pub const GET_ROOT: &str = "/";

/// Shared application state passed to all handlers.
///
/// Built once at startup; nothing in it is mutated per request except the
/// key set's optional refetch.
#[derive(Clone)]
pub struct AppState {
    /// Identity provider signing keys.
    pub keys: Arc<KeySetCache>,
    /// Platform user table.
    pub users: Arc<dyn UserStore>,
    /// Session token signer.
    pub minter: Arc<TokenMinter>,
    /// Pass-through to the platform's native login.
    pub forwarder: LegacyForwarder,
}

impl AppState {
    /// Assemble the state from configuration and already-initialised
    /// collaborators.
    pub fn new(
        config: &ApiConfig,
        keys: KeySetCache,
        users: Arc<dyn UserStore>,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            keys: Arc::new(keys),
            users,
            minter: Arc::new(TokenMinter::new(
                config.signing_key.as_bytes(),
                config.access_token_ttl,
                config.refresh_token_ttl,
            )),
            forwarder: LegacyForwarder::new(
                config.upstream_login_url.clone(),
                config.upstream_timeout,
            )?,
        })
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(GET_ROOT, get(health::liveness))
        .route(POST_AUTH_LOGIN, post(auth::login_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
