//! JWKS retrieval and caching
//!
//! Fetches the provider's public signing keys and caches them, indexed by
//! key ID, with one expiry window shared by the whole set.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use jsonwebtoken::DecodingKey;
use serde::Deserialize;

use crate::AuthError;

/// JWKS (JSON Web Key Set) structure
#[derive(Debug, Clone, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

/// Individual JWK (JSON Web Key)
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    pub kid: String,
    pub kty: String,
    #[serde(default)]
    pub alg: Option<String>,
    #[serde(default)]
    pub n: Option<String>,
    #[serde(default)]
    pub e: Option<String>,
}

#[derive(Default)]
struct CachedKeys {
    keys: HashMap<String, Arc<DecodingKey>>,
    /// Expiry of the whole set; `None` until the first successful fetch
    valid_until: Option<Instant>,
}

/// Caching resolver for provider verification keys.
///
/// `resolve` serves from the cache while it is populated and unexpired; on
/// miss or expiry it refetches the full set. The network call happens outside
/// the lock; only the whole-map swap is exclusive, so a failed fetch leaves
/// the previous set intact.
pub struct JwksCache {
    http_client: reqwest::Client,
    jwks_url: String,
    refresh_interval: Duration,
    cache: RwLock<CachedKeys>,
}

impl JwksCache {
    /// Create a new cache with an HTTP client tuned for JWKS fetching
    pub fn new(jwks_url: impl Into<String>, refresh_interval: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self::with_client(jwks_url, refresh_interval, http_client)
    }

    /// Create a cache with a custom HTTP client
    pub fn with_client(
        jwks_url: impl Into<String>,
        refresh_interval: Duration,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            http_client,
            jwks_url: jwks_url.into(),
            refresh_interval,
            cache: RwLock::new(CachedKeys::default()),
        }
    }

    /// Resolve a key ID to a verification key.
    ///
    /// A hit in a fresh cache performs no I/O. A miss or an expired cache
    /// triggers exactly one fetch of the full key set, which atomically
    /// replaces the cached set and resets the expiry window before the
    /// lookup is retried.
    pub async fn resolve(&self, kid: &str) -> Result<Arc<DecodingKey>, AuthError> {
        if let Some(key) = self.lookup_fresh(kid) {
            return Ok(key);
        }

        // Fetch and decode outside the lock; concurrent stale callers may
        // each fetch, the last swap wins with an equivalent set.
        let jwks = self.fetch_jwks().await?;
        let keys = decode_keys(&jwks);

        {
            let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
            cache.keys = keys;
            cache.valid_until = Some(Instant::now() + self.refresh_interval);
        }

        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys
            .get(kid)
            .cloned()
            .ok_or_else(|| AuthError::KeyNotFound(kid.to_string()))
    }

    /// Drop the cached set, forcing a fetch on the next resolve
    pub fn invalidate(&self) {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        cache.keys.clear();
        cache.valid_until = None;
    }

    fn lookup_fresh(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        match cache.valid_until {
            Some(until) if Instant::now() < until && !cache.keys.is_empty() => {
                cache.keys.get(kid).cloned()
            }
            _ => None,
        }
    }

    async fn fetch_jwks(&self) -> Result<Jwks, AuthError> {
        tracing::debug!("Fetching JWKS from {}", self.jwks_url);

        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch JWKS: {}", e);
                AuthError::KeyFetchError(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("JWKS fetch returned status: {}", status);
            return Err(AuthError::KeyFetchError(format!("status {status}")));
        }

        response.json::<Jwks>().await.map_err(|e| {
            tracing::error!("Failed to parse JWKS: {}", e);
            AuthError::KeyFetchError(e.to_string())
        })
    }
}

impl std::fmt::Debug for JwksCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksCache")
            .field("jwks_url", &self.jwks_url)
            .field("refresh_interval", &self.refresh_interval)
            .finish_non_exhaustive()
    }
}

/// Decode RSA keys from a JWKS payload, skipping entries of other key types
/// and entries with unusable material.
fn decode_keys(jwks: &Jwks) -> HashMap<String, Arc<DecodingKey>> {
    let mut keys = HashMap::with_capacity(jwks.keys.len());
    for jwk in &jwks.keys {
        if jwk.kty != "RSA" {
            continue;
        }
        let (Some(n), Some(e)) = (&jwk.n, &jwk.e) else {
            continue;
        };
        match DecodingKey::from_rsa_components(n, e) {
            Ok(key) => {
                keys.insert(jwk.kid.clone(), Arc::new(key));
            }
            Err(err) => {
                tracing::warn!("Skipping undecodable JWK {}: {}", jwk.kid, err);
            }
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_keys_skips_non_rsa_and_partial_entries() {
        let jwks: Jwks = serde_json::from_value(serde_json::json!({
            "keys": [
                {"kid": "ec-key", "kty": "EC", "crv": "P-256"},
                {"kid": "partial", "kty": "RSA"},
                {"kid": "bad-material", "kty": "RSA", "n": "!!!", "e": "AQAB"},
            ]
        }))
        .unwrap();

        assert!(decode_keys(&jwks).is_empty());
    }
}
