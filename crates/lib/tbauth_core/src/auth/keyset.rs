//! Published signing-key set (JWKS) cache.
//!
//! The set is fetched once before the service accepts traffic. Without a
//! refetch interval it is never replaced, so keys rotated upstream after
//! startup stay unverifiable until restart. With one, an unknown `kid`
//! triggers at most one refetch per interval.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::jwk::JwkSet;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::verify::verify;
use super::{KeySetError, VerifyError};
use crate::models::auth::OidcClaims;

/// Where the key set is published.
#[derive(Debug, Clone)]
struct KeySetSource {
    http: reqwest::Client,
    url: String,
}

/// Fetch a key set from `url`.
pub async fn fetch_key_set(http: &reqwest::Client, url: &str) -> Result<JwkSet, KeySetError> {
    let response = http.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(KeySetError::Status(status.as_u16()));
    }
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Process-wide key set shared by all requests.
pub struct KeySetCache {
    keys: RwLock<Arc<JwkSet>>,
    source: Option<KeySetSource>,
    refetch_interval: Option<Duration>,
    last_refetch: Mutex<Option<Instant>>,
}

impl KeySetCache {
    /// Fetch the key set from `url`. Fails if the endpoint is unreachable.
    pub async fn fetch(http: reqwest::Client, url: &str) -> Result<Self, KeySetError> {
        let keys = fetch_key_set(&http, url).await?;
        info!(url, keys = keys.keys.len(), "fetched signing key set");
        Ok(Self {
            keys: RwLock::new(Arc::new(keys)),
            source: Some(KeySetSource {
                http,
                url: url.to_string(),
            }),
            refetch_interval: None,
            last_refetch: Mutex::new(None),
        })
    }

    /// A fixed key set with no upstream source.
    pub fn from_key_set(keys: JwkSet) -> Self {
        Self {
            keys: RwLock::new(Arc::new(keys)),
            source: None,
            refetch_interval: None,
            last_refetch: Mutex::new(None),
        }
    }

    /// Allow refetching on an unknown `kid`, at most once per `interval`.
    pub fn with_refetch_interval(mut self, interval: Duration) -> Self {
        self.refetch_interval = Some(interval);
        self
    }

    /// Snapshot of the current key set.
    pub async fn current(&self) -> Arc<JwkSet> {
        self.keys.read().await.clone()
    }

    /// Verify `token` against the cached set, refetching once if its key is
    /// unknown and refetching is enabled.
    pub async fn verify(&self, token: &str) -> Result<OidcClaims, VerifyError> {
        let keys = self.current().await;
        match verify(token, &keys) {
            Err(VerifyError::KeyNotFound(kid)) => match self.refetch(&kid, &keys).await {
                Some(fresh) => verify(token, &fresh),
                None => Err(VerifyError::KeyNotFound(kid)),
            },
            result => result,
        }
    }

    /// Replace the key set from its source if the interval allows it.
    ///
    /// `seen` is the snapshot in which `kid` was missing. If another request
    /// replaced the set while this one waited for the lock, that set is
    /// returned without fetching again.
    ///
    /// Returns the fresh set, or `None` when refetching is disabled, too soon,
    /// or failed (the previous set is kept).
    async fn refetch(&self, kid: &str, seen: &Arc<JwkSet>) -> Option<Arc<JwkSet>> {
        let source = self.source.as_ref()?;
        let interval = self.refetch_interval?;

        let mut last = self.last_refetch.lock().await;
        let current = self.current().await;
        if !Arc::ptr_eq(&current, seen) || current.find(kid).is_some() {
            debug!(kid, "key set replaced while waiting, using it");
            return Some(current);
        }
        if let Some(at) = *last
            && at.elapsed() < interval
        {
            debug!(kid, "key set refetch suppressed, interval not elapsed");
            return None;
        }
        *last = Some(Instant::now());

        match fetch_key_set(&source.http, &source.url).await {
            Ok(keys) => {
                info!(url = %source.url, keys = keys.keys.len(), "refetched signing key set");
                let fresh = Arc::new(keys);
                *self.keys.write().await = fresh.clone();
                Some(fresh)
            }
            Err(e) => {
                warn!(url = %source.url, error = %e, "key set refetch failed, keeping previous set");
                None
            }
        }
    }
}
