//! Authentication pipeline.
//!
//! Each step of the OIDC login path has its own module and error type:
//! [`verify`] → [`identity`] → [`queries`] → [`jwt`]. The steps are composed
//! in `tbauth_api`, where [`LoginError`] is collapsed into an HTTP response.

pub mod identity;
pub mod jwt;
pub mod keyset;
pub mod queries;
pub mod verify;

use thiserror::Error;

/// Failure to obtain the published key set.
#[derive(Debug, Error)]
pub enum KeySetError {
    #[error("key set endpoint unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    #[error("key set endpoint returned HTTP {0}")]
    Status(u16),

    #[error("key set is not valid JSON: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Token verification errors.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("no key with kid '{0}' in key set")]
    KeyNotFound(String),

    #[error("unusable key material for kid '{0}'")]
    InvalidKey(String),

    #[error("algorithm {0} is not accepted")]
    UnsupportedAlgorithm(String),

    #[error("signature verification failed")]
    SignatureInvalid,

    #[error("token expired")]
    Expired,
}

/// Identity resolution errors.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("token has no realm_access claim")]
    MissingRealmAccess,

    #[error("no role for tenant {tenant:?}")]
    NoMatchingRole { tenant: Option<String> },
}

/// User lookup errors.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("no user with email '{0}'")]
    NotFound(String),

    #[error("more than one user with email '{0}'")]
    MultipleMatches(String),

    #[error("user store error: {0}")]
    Store(#[from] sqlx::Error),
}

/// Session token minting errors.
#[derive(Debug, Error)]
pub enum MintError {
    #[error("jwt encode: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),
}

/// Any failure on the OIDC login path.
#[derive(Debug, Error)]
pub enum LoginError {
    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Mint(#[from] MintError),
}

impl LoginError {
    /// Whether the failure comes from infrastructure rather than the caller's
    /// credentials.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Lookup(LookupError::Store(_)) | Self::Mint(_))
    }
}
