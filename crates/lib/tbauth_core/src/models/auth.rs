//! Authentication domain models.
//!
//! Wire names follow the platform's own token format (camelCase claims,
//! `userId`, `sessionId`, ...), so the serde renames here are load-bearing.

use serde::{Deserialize, Serialize};

/// Literal `iss` claim carried by every minted session token.
pub const PLATFORM_ISSUER: &str = "thingsboard.io";

/// Scope carried by refresh tokens in place of the user's authority.
pub const REFRESH_TOKEN_SCOPE: &str = "REFRESH_TOKEN";

/// A row of the platform's `tb_user` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub authority: String,
    pub tenant_id: Option<String>,
    pub customer_id: Option<String>,
}

/// `realm_access` block of an identity-provider access token. A block
/// without `roles` does not deserialize.
#[derive(Debug, Clone, Deserialize)]
pub struct RealmAccess {
    pub roles: Vec<String>,
}

/// Claims read from a verified identity-provider access token.
///
/// Only the fields the gateway acts on are modelled; everything else in the
/// payload is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct OidcClaims {
    pub email: String,
    #[serde(default)]
    pub realm_access: Option<RealmAccess>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub iss: Option<String>,
    /// Expiry (unix timestamp); validated by `jsonwebtoken`.
    pub exp: i64,
}

impl OidcClaims {
    /// Realm roles granted to the caller, empty when the block is absent.
    pub fn roles(&self) -> &[String] {
        self.realm_access
            .as_ref()
            .map(|r| r.roles.as_slice())
            .unwrap_or_default()
    }
}

/// Claims of a minted access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenClaims {
    pub user_id: String,
    pub scopes: Vec<String>,
    pub session_id: String,
    pub enabled: bool,
    pub is_public: bool,
    pub tenant_id: Option<String>,
    pub customer_id: Option<String>,
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// Claims of a minted refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenClaims {
    pub user_id: String,
    pub scopes: Vec<String>,
    pub session_id: String,
    pub is_public: bool,
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// Successful login payload, shaped like the platform's own login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub token: String,
    pub refresh_token: String,
    /// Always `null` for OIDC logins.
    pub scope: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_result_serializes_null_scope() {
        let result = LoginResult {
            token: "a".into(),
            refresh_token: "r".into(),
            scope: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["refreshToken"], "r");
        assert!(json["scope"].is_null());
        assert!(json.as_object().unwrap().contains_key("scope"));
    }

    #[test]
    fn oidc_claims_without_realm_access_have_no_roles() {
        let claims: OidcClaims =
            serde_json::from_str(r#"{"email":"a@b.c","exp":1}"#).unwrap();
        assert!(claims.roles().is_empty());
        assert!(claims.realm_access.is_none());
    }

    #[test]
    fn realm_access_without_roles_is_rejected() {
        let parsed = serde_json::from_str::<OidcClaims>(
            r#"{"email":"a@b.c","exp":1,"realm_access":{}}"#,
        );
        assert!(parsed.is_err());
    }
}
