//! id_token validation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::jwks::JwksCache;
use super::OidcError;
use crate::config::OidcSettings;

/// Settings the verifier runs with
#[derive(Debug, Clone)]
pub struct OidcConfig {
    pub jwks_url: String,
    pub issuer_prefix: String,
    pub client_id: String,
    pub jwks_refresh_secs: u64,
    /// Floor between refetches triggered by an unknown `kid`
    pub jwks_min_refetch_secs: u64,
    pub clock_skew_secs: u64,
    pub http_timeout_secs: u64,
}

impl From<&OidcSettings> for OidcConfig {
    fn from(s: &OidcSettings) -> Self {
        Self {
            jwks_url: s.jwks_url.clone(),
            issuer_prefix: s.issuer_prefix.clone(),
            client_id: s.client_id.clone(),
            jwks_refresh_secs: s.jwks_refresh_secs,
            jwks_min_refetch_secs: s.jwks_min_refetch_secs,
            clock_skew_secs: s.clock_skew_secs,
            http_timeout_secs: s.http_timeout_secs,
        }
    }
}

/// Audience can be a single string or array of strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    #[default]
    None,
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    pub fn contains(&self, aud: &str) -> bool {
        match self {
            Audience::None => false,
            Audience::Single(s) => s == aud,
            Audience::Multiple(v) => v.iter().any(|a| a == aud),
        }
    }
}

/// Claims read from a verified id_token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub sub: String,
    pub iss: String,
    #[serde(default)]
    pub aud: Audience,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub nbf: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    /// Tenant id (Microsoft identity platform)
    #[serde(default)]
    pub tid: Option<String>,
    /// Object id (Microsoft identity platform)
    #[serde(default)]
    pub oid: Option<String>,
}

impl IdTokenClaims {
    /// Best available email: `email`, else a `preferred_username` that looks
    /// like an address.
    pub fn contact_email(&self) -> Option<String> {
        self.email.clone().or_else(|| {
            self.preferred_username
                .as_ref()
                .filter(|u| u.contains('@'))
                .cloned()
        })
    }
}

#[async_trait]
pub trait IdTokenVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<IdTokenClaims, OidcError>;
}

/// Verifies id_tokens against the provider's published key set.
pub struct OidcVerifier {
    config: OidcConfig,
    jwks: Arc<JwksCache>,
}

impl OidcVerifier {
    pub fn new(config: OidcConfig) -> Result<Self, OidcError> {
        let jwks = JwksCache::new(
            config.jwks_url.clone(),
            Duration::from_secs(config.jwks_refresh_secs),
            Duration::from_secs(config.jwks_min_refetch_secs),
            Duration::from_secs(config.http_timeout_secs),
        )?;
        Ok(Self::with_cache(config, Arc::new(jwks)))
    }

    pub fn with_cache(config: OidcConfig, jwks: Arc<JwksCache>) -> Self {
        Self { config, jwks }
    }
}

fn is_rsa_family(alg: Algorithm) -> bool {
    matches!(
        alg,
        Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512
    )
}

fn map_jwt_error(e: jsonwebtoken::errors::Error) -> OidcError {
    match e.kind() {
        ErrorKind::InvalidSignature => OidcError::InvalidSignature,
        ErrorKind::ExpiredSignature => OidcError::Expired,
        ErrorKind::InvalidAudience => OidcError::InvalidAudience,
        ErrorKind::ImmatureSignature => OidcError::InvalidToken("token not yet valid".into()),
        ErrorKind::MissingRequiredClaim(claim) => {
            OidcError::InvalidToken(format!("missing required claim '{}'", claim))
        }
        _ => OidcError::InvalidToken(e.to_string()),
    }
}

#[async_trait]
impl IdTokenVerifier for OidcVerifier {
    async fn verify(&self, id_token: &str) -> Result<IdTokenClaims, OidcError> {
        let header = decode_header(id_token).map_err(|e| OidcError::Malformed(e.to_string()))?;

        let kid = header.kid.as_deref().ok_or(OidcError::MissingKid)?;
        if !is_rsa_family(header.alg) {
            return Err(OidcError::UnsupportedAlgorithm(header.alg));
        }

        debug!(kid = %kid, alg = ?header.alg, "Validating id_token");

        let key = self.jwks.get_key(kid).await?;

        let mut validation = Validation::new(header.alg);
        validation.leeway = self.config.clock_skew_secs;
        validation.validate_nbf = true;
        validation.set_audience(&[&self.config.client_id]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        let claims = decode::<IdTokenClaims>(id_token, &key, &validation)
            .map_err(map_jwt_error)?
            .claims;

        if !claims.iss.starts_with(&self.config.issuer_prefix) {
            return Err(OidcError::InvalidIssuer(claims.iss));
        }
        if !claims.aud.contains(&self.config.client_id) {
            return Err(OidcError::InvalidAudience);
        }

        debug!(sub = %claims.sub, tid = ?claims.tid, "id_token validated");
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::oidc::test_keys::{
        jwks_json, sign_id_token, valid_claims, TEST_CLIENT_ID, TEST_KID,
    };
    use jsonwebtoken::{encode, EncodingKey, Header};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn verifier() -> (MockServer, OidcVerifier) {
        verifier_with_skew(0).await
    }

    async fn verifier_with_skew(clock_skew_secs: u64) -> (MockServer, OidcVerifier) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/discovery/v2.0/keys"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks_json()))
            .mount(&server)
            .await;

        let config = OidcConfig {
            jwks_url: format!("{}/discovery/v2.0/keys", server.uri()),
            issuer_prefix: "https://login.microsoftonline.com/".into(),
            client_id: TEST_CLIENT_ID.into(),
            jwks_refresh_secs: 3600,
            jwks_min_refetch_secs: 10,
            clock_skew_secs,
            http_timeout_secs: 5,
        };
        let verifier = OidcVerifier::new(config).unwrap();
        (server, verifier)
    }

    #[test]
    fn test_audience_contains() {
        let single = Audience::Single("api".to_string());
        assert!(single.contains("api"));
        assert!(!single.contains("other"));

        let multi = Audience::Multiple(vec!["api".to_string(), "web".to_string()]);
        assert!(multi.contains("web"));
        assert!(!Audience::None.contains("anything"));
    }

    #[test]
    fn test_contact_email_falls_back_to_upn() {
        let mut claims: IdTokenClaims = serde_json::from_value(valid_claims()).unwrap();
        assert_eq!(claims.contact_email().as_deref(), Some("alumni@example.com"));

        claims.email = None;
        claims.preferred_username = Some("someone@bpitindia.edu.in".into());
        assert_eq!(
            claims.contact_email().as_deref(),
            Some("someone@bpitindia.edu.in")
        );

        claims.preferred_username = Some("not-an-address".into());
        assert_eq!(claims.contact_email(), None);
    }

    #[tokio::test]
    async fn accepts_valid_token() {
        let (_server, verifier) = verifier().await;
        let token = sign_id_token(&valid_claims(), Some(TEST_KID));

        let claims = verifier.verify(&token).await.unwrap();
        assert_eq!(claims.sub, "AAAAAAAAAAAAAAAAAAAAAIkzqFVrSaSaFHy782bbtaQ");
        assert!(claims.aud.contains(TEST_CLIENT_ID));
        assert_eq!(claims.name.as_deref(), Some("Test Alumni"));
    }

    #[tokio::test]
    async fn accepts_audience_array() {
        let (_server, verifier) = verifier().await;
        let mut claims = valid_claims();
        claims["aud"] = serde_json::json!(["other-app", TEST_CLIENT_ID]);

        let token = sign_id_token(&claims, Some(TEST_KID));
        assert!(verifier.verify(&token).await.is_ok());
    }

    #[tokio::test]
    async fn rejects_garbage() {
        let (_server, verifier) = verifier().await;
        let err = verifier.verify("not.a.jwt").await.unwrap_err();
        assert!(matches!(err, OidcError::Malformed(_)));
    }

    #[tokio::test]
    async fn rejects_missing_kid() {
        let (_server, verifier) = verifier().await;
        let token = sign_id_token(&valid_claims(), None);
        let err = verifier.verify(&token).await.unwrap_err();
        assert!(matches!(err, OidcError::MissingKid));
    }

    #[tokio::test]
    async fn rejects_hmac_tokens_before_key_lookup() {
        let (server, verifier) = verifier().await;
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(TEST_KID.into());
        let token = encode(
            &header,
            &valid_claims(),
            &EncodingKey::from_secret(b"guessable"),
        )
        .unwrap();

        let err = verifier.verify(&token).await.unwrap_err();
        assert!(matches!(
            err,
            OidcError::UnsupportedAlgorithm(Algorithm::HS256)
        ));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_unknown_kid() {
        let (_server, verifier) = verifier().await;
        let token = sign_id_token(&valid_claims(), Some("some-other-key"));
        let err = verifier.verify(&token).await.unwrap_err();
        assert!(matches!(err, OidcError::UnknownKid(_)));
    }

    #[tokio::test]
    async fn rejects_tampered_payload() {
        let (_server, verifier) = verifier().await;
        let token = sign_id_token(&valid_claims(), Some(TEST_KID));

        let mut other = valid_claims();
        other["sub"] = serde_json::json!("someone-else");
        let forged_payload = sign_id_token(&other, Some(TEST_KID));

        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged_payload.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        let err = verifier.verify(&forged).await.unwrap_err();
        assert!(matches!(err, OidcError::InvalidSignature));
    }

    #[tokio::test]
    async fn rejects_foreign_issuer() {
        let (_server, verifier) = verifier().await;
        let mut claims = valid_claims();
        claims["iss"] = serde_json::json!("https://accounts.example.com/");

        let token = sign_id_token(&claims, Some(TEST_KID));
        let err = verifier.verify(&token).await.unwrap_err();
        assert!(matches!(err, OidcError::InvalidIssuer(_)));
    }

    #[tokio::test]
    async fn rejects_wrong_audience() {
        let (_server, verifier) = verifier().await;
        let mut claims = valid_claims();
        claims["aud"] = serde_json::json!("another-application");

        let token = sign_id_token(&claims, Some(TEST_KID));
        let err = verifier.verify(&token).await.unwrap_err();
        assert!(matches!(err, OidcError::InvalidAudience));
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let (_server, verifier) = verifier().await;
        let now = chrono::Utc::now().timestamp();
        let mut claims = valid_claims();
        claims["iat"] = serde_json::json!(now - 7200);
        claims["nbf"] = serde_json::json!(now - 7200);
        claims["exp"] = serde_json::json!(now - 3600);

        let token = sign_id_token(&claims, Some(TEST_KID));
        let err = verifier.verify(&token).await.unwrap_err();
        assert!(matches!(err, OidcError::Expired));
    }

    #[tokio::test]
    async fn rejects_token_without_expiry() {
        let (_server, verifier) = verifier().await;
        let mut claims = valid_claims();
        claims.as_object_mut().unwrap().remove("exp");

        let token = sign_id_token(&claims, Some(TEST_KID));
        let err = verifier.verify(&token).await.unwrap_err();
        assert!(matches!(err, OidcError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn honours_not_before() {
        let now = chrono::Utc::now().timestamp();
        let mut claims = valid_claims();
        claims["nbf"] = serde_json::json!(now + 300);
        let token = sign_id_token(&claims, Some(TEST_KID));

        let (_server, strict) = verifier().await;
        let err = strict.verify(&token).await.unwrap_err();
        assert!(matches!(err, OidcError::InvalidToken(ref m) if m == "token not yet valid"));

        let (_server, lenient) = verifier_with_skew(600).await;
        assert!(lenient.verify(&token).await.is_ok());
    }

    #[tokio::test]
    async fn clock_skew_applies_to_expiry() {
        let now = chrono::Utc::now().timestamp();
        let mut claims = valid_claims();
        claims["exp"] = serde_json::json!(now - 30);
        let token = sign_id_token(&claims, Some(TEST_KID));

        let (_server, strict) = verifier().await;
        assert!(matches!(strict.verify(&token).await, Err(OidcError::Expired)));

        let (_server, lenient) = verifier_with_skew(120).await;
        assert!(lenient.verify(&token).await.is_ok());
    }
}
