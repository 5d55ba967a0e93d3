//! Platform session token minting.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use uuid::Uuid;

use super::MintError;
use crate::models::auth::{
    AccessTokenClaims, LoginResult, PLATFORM_ISSUER, REFRESH_TOKEN_SCOPE, RefreshTokenClaims,
    UserRecord,
};

/// Default access token lifetime: 2.5 hours.
pub const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::from_secs(9000);

/// Default refresh token lifetime: 7 days.
pub const DEFAULT_REFRESH_TOKEN_TTL: Duration = Duration::from_secs(604_800);

/// Signs access/refresh token pairs with the platform's shared secret (HS512).
#[derive(Clone)]
pub struct TokenMinter {
    key: EncodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenMinter {
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            key: EncodingKey::from_secret(secret),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Mint a session for `user`. Both tokens share one fresh session id.
    pub fn mint(&self, user: &UserRecord) -> Result<LoginResult, MintError> {
        let session_id = Uuid::new_v4().to_string();
        let iat = Utc::now().timestamp();

        let access = AccessTokenClaims {
            user_id: user.id.clone(),
            scopes: vec![user.authority.clone()],
            session_id: session_id.clone(),
            enabled: true,
            is_public: false,
            tenant_id: user.tenant_id.clone(),
            customer_id: user.customer_id.clone(),
            sub: user.email.clone(),
            iss: PLATFORM_ISSUER.to_string(),
            iat,
            exp: iat + ttl_secs(self.access_ttl),
        };
        let refresh = RefreshTokenClaims {
            user_id: user.id.clone(),
            scopes: vec![REFRESH_TOKEN_SCOPE.to_string()],
            session_id,
            is_public: false,
            sub: user.email.clone(),
            iss: PLATFORM_ISSUER.to_string(),
            iat,
            exp: iat + ttl_secs(self.refresh_ttl),
        };

        let header = Header::new(Algorithm::HS512);
        Ok(LoginResult {
            token: encode(&header, &access, &self.key)?,
            refresh_token: encode(&header, &refresh, &self.key)?,
            scope: None,
        })
    }
}

/// Whole seconds of `ttl`, never less than one so `exp` always exceeds `iat`.
fn ttl_secs(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_secs().max(1)).unwrap_or(i64::MAX / 2)
}
