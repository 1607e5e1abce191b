//! Locally issued session tokens (HS256)

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::SecurityConfig;

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Token expiration time in hours
    pub expiration_hours: i64,
    /// Issuer claim
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self::from(&SecurityConfig::default())
    }
}

impl From<&SecurityConfig> for JwtConfig {
    fn from(cfg: &SecurityConfig) -> Self {
        Self {
            secret: cfg.jwt_secret.clone(),
            expiration_hours: cfg.jwt_expiration_hours,
            issuer: cfg.jwt_issuer.clone(),
        }
    }
}

impl JwtConfig {
    /// Lifetime of an issued token in seconds
    pub fn expires_in(&self) -> i64 {
        self.expiration_hours * 3600
    }
}

/// Claims of a session token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    /// Subject, copied from the identity provider's token
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

impl SessionClaims {
    pub fn new(subject: &str, config: &JwtConfig) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(config.expiration_hours);

        Self {
            sub: subject.to_string(),
            email: None,
            name: None,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: config.issuer.clone(),
        }
    }

    pub fn with_profile(mut self, email: Option<String>, name: Option<String>) -> Self {
        self.email = email;
        self.name = name;
        self
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// Sign session claims with the configured secret
pub fn create_token(
    claims: &SessionClaims,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Verify and decode a session token
pub fn verify_token(
    token: &str,
    config: &JwtConfig,
) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);

    let token_data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-at-least-16-bytes".into(),
            expiration_hours: 1,
            issuer: "alumni-auth".into(),
        }
    }

    #[test]
    fn test_create_and_verify_token() {
        let config = config();
        let claims = SessionClaims::new("subject-123", &config)
            .with_profile(Some("a@example.com".into()), None);
        let token = create_token(&claims, &config).unwrap();

        let decoded = verify_token(&token, &config).unwrap();
        assert_eq!(decoded.sub, "subject-123");
        assert_eq!(decoded.email.as_deref(), Some("a@example.com"));
        assert_eq!(decoded.name, None);
        assert_eq!(decoded.exp - decoded.iat, 3600);
        assert!(!decoded.is_expired());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let config = config();
        let token = create_token(&SessionClaims::new("s", &config), &config).unwrap();

        let other = JwtConfig {
            secret: "a-completely-different-secret".into(),
            ..config
        };
        assert!(verify_token(&token, &other).is_err());
    }

    #[test]
    fn test_foreign_issuer_is_rejected() {
        let config = config();
        let token = create_token(&SessionClaims::new("s", &config), &config).unwrap();

        let other = JwtConfig {
            issuer: "someone-else".into(),
            ..config
        };
        assert!(verify_token(&token, &other).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let config = config();
        let mut claims = SessionClaims::new("s", &config);
        claims.exp = Utc::now().timestamp() - 3600;
        claims.iat = claims.exp - 3600;
        let token = create_token(&claims, &config).unwrap();

        let err = verify_token(&token, &config).unwrap_err();
        assert!(matches!(
            err.kind(),
            jsonwebtoken::errors::ErrorKind::ExpiredSignature
        ));
    }

    #[test]
    fn test_invalid_token() {
        assert!(verify_token("invalid-token", &config()).is_err());
    }
}
