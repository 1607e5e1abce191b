//! JWKS (JSON Web Key Set) fetching and caching.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::OidcError;

/// JWKS response from the endpoint.
#[derive(Debug, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

/// Individual JSON Web Key.
#[derive(Debug, Deserialize)]
pub struct Jwk {
    /// Key type (RSA, EC, ...)
    pub kty: String,
    /// Key ID
    pub kid: Option<String>,
    /// Algorithm
    pub alg: Option<String>,
    /// Key use (sig, enc)
    #[serde(rename = "use")]
    pub key_use: Option<String>,
    /// RSA modulus (base64url)
    pub n: Option<String>,
    /// RSA exponent (base64url)
    pub e: Option<String>,
}

impl Jwk {
    /// Convert an RSA signing key into a `DecodingKey`.
    pub fn to_decoding_key(&self) -> Result<DecodingKey, String> {
        if self.kty != "RSA" {
            return Err(format!("unsupported key type: {}", self.kty));
        }
        let n = self.n.as_deref().ok_or("RSA key missing 'n'")?;
        let e = self.e.as_deref().ok_or("RSA key missing 'e'")?;

        DecodingKey::from_rsa_components(n, e).map_err(|e| e.to_string())
    }
}

#[derive(Default)]
struct CacheState {
    keys: HashMap<String, DecodingKey>,
    last_refresh: Option<Instant>,
}

/// JWKS cache with automatic refresh.
///
/// Keys are fetched lazily on first use, refetched once `refresh_interval`
/// has passed, and refetched early when a token names a `kid` the cache has
/// not seen (key rotation). Early refetches are spaced at least
/// `min_refetch_interval` apart.
pub struct JwksCache {
    state: RwLock<CacheState>,
    refresh_interval: Duration,
    min_refetch_interval: Duration,
    jwks_url: String,
    http_client: reqwest::Client,
}

impl JwksCache {
    pub fn new(
        jwks_url: impl Into<String>,
        refresh_interval: Duration,
        min_refetch_interval: Duration,
        http_timeout: Duration,
    ) -> Result<Self, OidcError> {
        let http_client = reqwest::Client::builder()
            .timeout(http_timeout)
            .build()
            .map_err(|e| OidcError::JwksFetch(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            state: RwLock::new(CacheState::default()),
            refresh_interval,
            min_refetch_interval,
            jwks_url: jwks_url.into(),
            http_client,
        })
    }

    /// Get a decoding key by key ID.
    pub async fn get_key(&self, kid: &str) -> Result<DecodingKey, OidcError> {
        {
            let state = self.state.read().await;
            let fresh = state
                .last_refresh
                .is_some_and(|t| t.elapsed() < self.refresh_interval);
            if fresh {
                if let Some(key) = state.keys.get(kid) {
                    return Ok(key.clone());
                }
            }
        }

        if self.should_refetch().await {
            debug!(kid = %kid, "Key not cached or cache stale, fetching JWKS");
            self.refresh().await?;
        }

        let state = self.state.read().await;
        state
            .keys
            .get(kid)
            .cloned()
            .ok_or_else(|| OidcError::UnknownKid(kid.to_string()))
    }

    async fn should_refetch(&self) -> bool {
        let state = self.state.read().await;
        match state.last_refresh {
            None => true,
            Some(t) => {
                let elapsed = t.elapsed();
                elapsed >= self.refresh_interval || elapsed >= self.min_refetch_interval
            }
        }
    }

    /// Number of cached signing keys.
    pub async fn len(&self) -> usize {
        self.state.read().await.keys.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Force refresh the JWKS cache.
    pub async fn refresh(&self) -> Result<(), OidcError> {
        debug!(url = %self.jwks_url, "Fetching JWKS");

        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| OidcError::JwksFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OidcError::JwksFetch(format!(
                "JWKS endpoint returned status {}",
                response.status()
            )));
        }

        let jwks: Jwks = response
            .json()
            .await
            .map_err(|e| OidcError::JwksFetch(format!("failed to parse JWKS: {}", e)))?;

        let mut new_keys = HashMap::new();
        for jwk in jwks.keys {
            if jwk.key_use.as_deref() == Some("enc") {
                continue;
            }
            let Some(kid) = jwk.kid.clone() else {
                debug!(kty = %jwk.kty, "Skipping JWK without kid");
                continue;
            };

            match jwk.to_decoding_key() {
                Ok(key) => {
                    debug!(kid = %kid, alg = ?jwk.alg, "Loaded JWK");
                    new_keys.insert(kid, key);
                }
                Err(e) => {
                    warn!(kid = %kid, kty = %jwk.kty, error = %e, "Failed to parse JWK, skipping");
                }
            }
        }

        if new_keys.is_empty() {
            return Err(OidcError::JwksFetch(
                "no usable signing keys in JWKS".to_string(),
            ));
        }

        let key_count = new_keys.len();
        {
            let mut state = self.state.write().await;
            state.keys = new_keys;
            state.last_refresh = Some(Instant::now());
        }

        info!(url = %self.jwks_url, key_count, "JWKS cache refreshed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::oidc::test_keys::{jwks_json, TEST_KID};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cache_for(server: &MockServer) -> JwksCache {
        cache_with_refetch_floor(server, Duration::from_secs(10))
    }

    fn cache_with_refetch_floor(server: &MockServer, floor: Duration) -> JwksCache {
        JwksCache::new(
            format!("{}/keys", server.uri()),
            Duration::from_secs(3600),
            floor,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn rotated_jwks() -> serde_json::Value {
        let mut doc = jwks_json();
        doc["keys"][0]["kid"] = json!("test-key-2");
        doc
    }

    #[test]
    fn test_jwk_parsing() {
        let jwk: Jwk = serde_json::from_value(jwks_json()["keys"][0].clone()).unwrap();
        assert_eq!(jwk.kty, "RSA");
        assert_eq!(jwk.kid.as_deref(), Some(TEST_KID));
        assert_eq!(jwk.key_use.as_deref(), Some("sig"));
        assert!(jwk.to_decoding_key().is_ok());
    }

    #[test]
    fn test_non_rsa_key_is_rejected() {
        let jwk: Jwk = serde_json::from_value(json!({
            "kty": "EC", "kid": "ec-1", "crv": "P-256", "x": "AA", "y": "AA"
        }))
        .unwrap();
        assert!(jwk.to_decoding_key().is_err());
    }

    #[tokio::test]
    async fn fetches_lazily_and_caches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/keys"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks_json()))
            .expect(1)
            .mount(&server)
            .await;

        let cache = cache_for(&server);
        assert!(cache.is_empty().await);

        cache.get_key(TEST_KID).await.unwrap();
        cache.get_key(TEST_KID).await.unwrap();

        // encryption key skipped
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn unknown_kid_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/keys"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks_json()))
            .mount(&server)
            .await;

        let cache = cache_for(&server);
        let err = cache.get_key("rotated-away").await.err().unwrap();
        assert!(matches!(err, OidcError::UnknownKid(ref kid) if kid == "rotated-away"));

        // encryption-only keys are never usable for signatures
        let err = cache.get_key("encryption-only").await.err().unwrap();
        assert!(matches!(err, OidcError::UnknownKid(_)));
    }

    #[tokio::test]
    async fn unknown_kid_refetches_and_picks_up_rotated_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/keys"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks_json()))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/keys"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rotated_jwks()))
            .mount(&server)
            .await;

        let cache = cache_with_refetch_floor(&server, Duration::ZERO);
        cache.get_key(TEST_KID).await.unwrap();

        cache.get_key("test-key-2").await.unwrap();
        assert_eq!(server.received_requests().await.unwrap().len(), 2);

        // the rotated set replaced the old one
        assert!(matches!(
            cache.get_key(TEST_KID).await.err(),
            Some(OidcError::UnknownKid(_))
        ));
    }

    #[tokio::test]
    async fn unknown_kid_refetch_respects_floor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/keys"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks_json()))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/keys"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rotated_jwks()))
            .mount(&server)
            .await;

        let cache = cache_with_refetch_floor(&server, Duration::from_secs(3600));
        cache.get_key(TEST_KID).await.unwrap();

        let err = cache.get_key("test-key-2").await.err();
        assert!(matches!(err, Some(OidcError::UnknownKid(_))));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn endpoint_errors_surface_as_fetch_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/keys"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let cache = cache_for(&server);
        let err = cache.get_key(TEST_KID).await.err().unwrap();
        assert!(matches!(err, OidcError::JwksFetch(_)));
    }

    #[tokio::test]
    async fn empty_key_set_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/keys"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "keys": [] })))
            .mount(&server)
            .await;

        let cache = cache_for(&server);
        assert!(matches!(
            cache.refresh().await,
            Err(OidcError::JwksFetch(_))
        ));
    }
}
