//! JWKS client for fetching and caching the identity provider's public keys.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::ApiError;

/// A cached set of decoding keys fetched from the provider's JWKS endpoint.
#[derive(Clone)]
pub struct JwksClient {
    jwks_url: String,
    http: reqwest::Client,
    cache: Arc<RwLock<JwksCache>>,
}

struct JwksCache {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Option<std::time::Instant>,
}

/// How long to cache JWKS before re-fetching (1 hour).
const CACHE_TTL: std::time::Duration = std::time::Duration::from_secs(3600);

#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<JwkEntry>,
}

#[derive(Debug, Deserialize)]
struct JwkEntry {
    kid: Option<String>,
    kty: String,
    crv: Option<String>,
    x: Option<String>,
    n: Option<String>,
    e: Option<String>,
}

impl JwksClient {
    pub fn new(jwks_url: &str) -> Self {
        Self {
            jwks_url: jwks_url.to_string(),
            http: reqwest::Client::new(),
            cache: Arc::new(RwLock::new(JwksCache {
                keys: HashMap::new(),
                fetched_at: None,
            })),
        }
    }

    /// For tests: create a client pre-loaded with a known key.
    pub fn with_static_key(kid: &str, decoding_key: DecodingKey) -> Self {
        let mut keys = HashMap::new();
        keys.insert(kid.to_string(), decoding_key);
        Self {
            jwks_url: String::new(),
            http: reqwest::Client::new(),
            cache: Arc::new(RwLock::new(JwksCache {
                keys,
                // Set fetched_at far in the future so it never expires in tests.
                fetched_at: Some(std::time::Instant::now() + std::time::Duration::from_secs(86400)),
            })),
        }
    }

    /// Get the decoding key for a given `kid`. Fetches/re-fetches JWKS as needed.
    pub async fn get_key(&self, kid: &str) -> Result<DecodingKey, ApiError> {
        {
            let cache = self.cache.read().await;
            if let Some(key) = cache.keys.get(kid) {
                if cache_is_fresh(&cache) {
                    return Ok(key.clone());
                }
            }
        }

        // Unknown kid or stale cache: the provider may have rotated keys.
        self.refresh().await?;

        let cache = self.cache.read().await;
        cache
            .keys
            .get(kid)
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Unknown signing key"))
    }

    async fn refresh(&self) -> Result<(), ApiError> {
        if self.jwks_url.is_empty() {
            return Err(ApiError::unauthorized("Unknown signing key"));
        }
        tracing::info!(url = %self.jwks_url, "fetching identity provider JWKS");

        let resp: JwksResponse = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                tracing::error!(?e, "JWKS fetch failed");
                ApiError::internal("Failed to fetch identity provider JWKS")
            })?
            .json()
            .await
            .map_err(|e| {
                tracing::error!(?e, "JWKS parse failed");
                ApiError::internal("Failed to parse identity provider JWKS")
            })?;

        let keys = parse_keys(resp.keys);
        tracing::info!(count = keys.len(), "JWKS refreshed");

        let mut cache = self.cache.write().await;
        cache.keys = keys;
        cache.fetched_at = Some(std::time::Instant::now());

        Ok(())
    }
}

fn cache_is_fresh(cache: &JwksCache) -> bool {
    match cache.fetched_at {
        // A pinned test key has a future timestamp; `elapsed` saturates to zero.
        Some(t) => t.elapsed() < CACHE_TTL,
        None => false,
    }
}

/// Convert JWKS entries into decoding keys. Unsupported or malformed entries
/// are skipped so one bad key cannot lock everyone out.
fn parse_keys(entries: Vec<JwkEntry>) -> HashMap<String, DecodingKey> {
    let mut keys = HashMap::new();
    for entry in entries {
        let Some(kid) = entry.kid else {
            continue;
        };

        let decoding = match entry.kty.as_str() {
            "RSA" => {
                let (Some(n), Some(e)) = (entry.n.as_deref(), entry.e.as_deref()) else {
                    continue;
                };
                match DecodingKey::from_rsa_components(n, e) {
                    Ok(key) => key,
                    Err(err) => {
                        tracing::warn!(?err, %kid, "bad RSA JWKS entry");
                        continue;
                    }
                }
            }
            "OKP" if entry.crv.as_deref() == Some("Ed25519") => {
                let Some(x) = entry.x.as_deref() else {
                    continue;
                };
                match URL_SAFE_NO_PAD.decode(x) {
                    Ok(public_bytes) => DecodingKey::from_ed_der(&public_bytes),
                    Err(err) => {
                        tracing::warn!(?err, %kid, "bad JWKS x value");
                        continue;
                    }
                }
            }
            _ => continue,
        };

        keys.insert(kid, decoding);
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kid: &str, kty: &str) -> JwkEntry {
        JwkEntry {
            kid: Some(kid.into()),
            kty: kty.into(),
            crv: None,
            x: None,
            n: None,
            e: None,
        }
    }

    #[test]
    fn parse_keys_accepts_rsa_and_ed25519() {
        let rsa = JwkEntry {
            n: Some(URL_SAFE_NO_PAD.encode([0xc3u8; 256])),
            e: Some("AQAB".into()),
            ..entry("rsa-1", "RSA")
        };
        let ed = JwkEntry {
            crv: Some("Ed25519".into()),
            x: Some(URL_SAFE_NO_PAD.encode([7u8; 32])),
            ..entry("ed-1", "OKP")
        };

        let keys = parse_keys(vec![rsa, ed]);
        assert!(keys.contains_key("rsa-1"));
        assert!(keys.contains_key("ed-1"));
    }

    #[test]
    fn parse_keys_skips_unusable_entries() {
        let no_kid = JwkEntry {
            kid: None,
            ..entry("", "RSA")
        };
        let rsa_missing_e = JwkEntry {
            n: Some("AQAB".into()),
            ..entry("rsa-2", "RSA")
        };
        let wrong_curve = JwkEntry {
            crv: Some("X25519".into()),
            x: Some(URL_SAFE_NO_PAD.encode([7u8; 32])),
            ..entry("x-1", "OKP")
        };
        let ec = entry("ec-1", "EC");

        let keys = parse_keys(vec![no_kid, rsa_missing_e, wrong_curve, ec]);
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn static_key_is_served_without_fetching() {
        let client = JwksClient::with_static_key("k1", DecodingKey::from_ed_der(&[7u8; 32]));
        assert!(client.get_key("k1").await.is_ok());

        let err = client.get_key("other").await.err().unwrap();
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);
    }
}
