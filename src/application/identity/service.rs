//! Token exchange service
//!
//! HTTP handlers are thin wrappers that delegate to this service.

use std::sync::Arc;

use tracing::{info, warn};

use crate::infrastructure::crypto::jwt::{create_token, JwtConfig, SessionClaims};
use crate::infrastructure::oidc::{IdTokenVerifier, OidcError};

/// Session token returned after a successful exchange
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub claims: SessionClaims,
}

/// Verifies provider id_tokens and mints session tokens.
pub struct TokenExchangeService {
    verifier: Arc<dyn IdTokenVerifier>,
    jwt_config: JwtConfig,
}

impl TokenExchangeService {
    pub fn new(verifier: Arc<dyn IdTokenVerifier>, jwt_config: JwtConfig) -> Self {
        Self {
            verifier,
            jwt_config,
        }
    }

    /// Verify `id_token` and issue a session token for its subject.
    pub async fn exchange(&self, id_token: &str) -> Result<SessionToken, OidcError> {
        let id_claims = match self.verifier.verify(id_token).await {
            Ok(claims) => claims,
            Err(e) => {
                warn!(error = %e, "id_token rejected");
                return Err(e);
            }
        };

        let claims = SessionClaims::new(&id_claims.sub, &self.jwt_config)
            .with_profile(id_claims.contact_email(), id_claims.name.clone());

        let token = create_token(&claims, &self.jwt_config)
            .map_err(|e| OidcError::TokenCreation(e.to_string()))?;

        info!(sub = %claims.sub, tid = ?id_claims.tid, "Session token issued");

        Ok(SessionToken {
            token,
            token_type: "Bearer".into(),
            expires_in: self.jwt_config.expires_in(),
            claims,
        })
    }

    pub fn jwt_config(&self) -> &JwtConfig {
        &self.jwt_config
    }
}
