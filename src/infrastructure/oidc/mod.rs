//! OpenID Connect id_token verification
//!
//! - `jwks`: provider key set fetching and caching
//! - `verifier`: header checks, signature and claim validation

pub mod jwks;
pub mod verifier;

#[cfg(test)]
pub(crate) mod test_keys;

use jsonwebtoken::Algorithm;
use thiserror::Error;

pub use jwks::{Jwk, Jwks, JwksCache};
pub use verifier::{Audience, IdTokenClaims, IdTokenVerifier, OidcConfig, OidcVerifier};

/// Failure of any id_token verification step
#[derive(Debug, Error)]
pub enum OidcError {
    #[error("invalid token: {0}")]
    Malformed(String),

    #[error("token header has no key id")]
    MissingKid,

    #[error("unexpected signing method: {0:?}")]
    UnsupportedAlgorithm(Algorithm),

    #[error("failed to fetch JWKS: {0}")]
    JwksFetch(String),

    #[error("failed to find key: {0}")]
    UnknownKid(String),

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("invalid issuer: {0}")]
    InvalidIssuer(String),

    #[error("invalid audience")]
    InvalidAudience,

    #[error("failed to generate JWT: {0}")]
    TokenCreation(String),
}

impl OidcError {
    /// Failures caused by the provider or by us rather than by the token.
    pub fn is_upstream(&self) -> bool {
        matches!(self, OidcError::JwksFetch(_) | OidcError::TokenCreation(_))
    }
}
