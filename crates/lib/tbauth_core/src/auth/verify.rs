//! Identity-provider token verification.
//!
//! Decoding and verifying are separate steps: [`UnverifiedToken::decode`]
//! only splits the token so the `kid` can be read, and nothing from it is
//! trusted until [`verify`] has checked the signature.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Header, Validation, decode, decode_header};

use super::VerifyError;
use crate::models::auth::OidcClaims;

/// Asymmetric algorithms a published key set can legitimately sign with.
const ACCEPTED_ALGORITHMS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
    Algorithm::ES256,
    Algorithm::ES384,
    Algorithm::EdDSA,
];

/// A token split into header and payload, signature not yet checked.
#[derive(Debug, Clone)]
pub struct UnverifiedToken {
    pub header: Header,
    pub payload: serde_json::Value,
}

impl UnverifiedToken {
    /// Split and decode a compact JWS without verifying it.
    pub fn decode(token: &str) -> Result<Self, VerifyError> {
        let header = decode_header(token)
            .map_err(|e| VerifyError::MalformedToken(format!("header: {e}")))?;

        let mut segments = token.split('.');
        let payload_segment = match (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) {
            (Some(_), Some(payload), Some(_), None) => payload,
            _ => {
                return Err(VerifyError::MalformedToken(
                    "expected three segments".into(),
                ));
            }
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload_segment)
            .map_err(|e| VerifyError::MalformedToken(format!("payload encoding: {e}")))?;
        let payload = serde_json::from_slice(&bytes)
            .map_err(|e| VerifyError::MalformedToken(format!("payload json: {e}")))?;

        Ok(Self { header, payload })
    }

    /// The `kid` naming the signing key.
    pub fn kid(&self) -> Result<&str, VerifyError> {
        self.header
            .kid
            .as_deref()
            .filter(|kid| !kid.is_empty())
            .ok_or_else(|| VerifyError::MalformedToken("header has no kid".into()))
    }
}

/// Verify `token` against `keys` and return its claims.
pub fn verify(token: &str, keys: &JwkSet) -> Result<OidcClaims, VerifyError> {
    let unverified = UnverifiedToken::decode(token)?;
    let kid = unverified.kid()?;
    let alg = unverified.header.alg;
    if !ACCEPTED_ALGORITHMS.contains(&alg) {
        return Err(VerifyError::UnsupportedAlgorithm(format!("{alg:?}")));
    }

    let jwk = keys
        .find(kid)
        .ok_or_else(|| VerifyError::KeyNotFound(kid.to_string()))?;
    let key =
        DecodingKey::from_jwk(jwk).map_err(|_| VerifyError::InvalidKey(kid.to_string()))?;

    let mut validation = Validation::new(alg);
    validation.validate_aud = false;

    decode::<OidcClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => VerifyError::SignatureInvalid,
            ErrorKind::ExpiredSignature => VerifyError::Expired,
            ErrorKind::InvalidAlgorithm => VerifyError::UnsupportedAlgorithm(format!("{alg:?}")),
            _ => VerifyError::MalformedToken(e.to_string()),
        })
}
