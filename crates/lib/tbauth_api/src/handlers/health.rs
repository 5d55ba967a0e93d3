//! Liveness endpoint.

/// `GET /`: always `OK`. Does not touch the database or the key set.
pub async fn liveness() -> &'static str {
    "OK"
}
