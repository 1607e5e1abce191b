//! Authentication DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct OidcExchangeRequest {
    /// id_token issued by the identity provider
    #[validate(length(min = 1, message = "id_token is required"))]
    pub id_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionTokenResponse {
    pub token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: i64,
    pub user: SessionInfo,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionInfo {
    /// Subject copied from the identity provider
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub issuer: String,
    pub issued_at: i64,
    pub expires_at: i64,
}
