//! Authentication API handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Extension, Json};
use tracing::error;

use super::dto::{OidcExchangeRequest, SessionInfo, SessionTokenResponse};
use crate::application::TokenExchangeService;
use crate::infrastructure::oidc::OidcError;
use crate::interfaces::http::common::{ApiResponse, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedSession;

/// Auth state
#[derive(Clone)]
pub struct AuthHandlerState {
    pub token_exchange: Arc<TokenExchangeService>,
}

fn oidc_error_status(e: &OidcError) -> StatusCode {
    match e {
        OidcError::JwksFetch(_) => StatusCode::BAD_GATEWAY,
        OidcError::TokenCreation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::UNAUTHORIZED,
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/oidc/exchange",
    tag = "Authentication",
    request_body = OidcExchangeRequest,
    responses(
        (status = 200, description = "Session token issued", body = ApiResponse<SessionTokenResponse>),
        (status = 400, description = "Invalid request payload"),
        (status = 401, description = "id_token rejected"),
        (status = 502, description = "Identity provider key set unavailable")
    )
)]
pub async fn exchange_id_token(
    State(state): State<AuthHandlerState>,
    ValidatedJson(request): ValidatedJson<OidcExchangeRequest>,
) -> Result<Json<ApiResponse<SessionTokenResponse>>, (StatusCode, Json<ApiResponse<SessionTokenResponse>>)>
{
    let session = state
        .token_exchange
        .exchange(&request.id_token)
        .await
        .map_err(|e| {
            if e.is_upstream() {
                error!(error = %e, "Token exchange failed");
            }
            (oidc_error_status(&e), Json(ApiResponse::error(e.to_string())))
        })?;

    let claims = session.claims;
    let response = SessionTokenResponse {
        token: session.token,
        token_type: session.token_type,
        expires_in: session.expires_in,
        user: SessionInfo {
            sub: claims.sub,
            email: claims.email,
            name: claims.name,
            issuer: claims.iss,
            issued_at: claims.iat,
            expires_at: claims.exp,
        },
    };

    Ok(Json(ApiResponse::success(response)))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current session", body = ApiResponse<SessionInfo>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_current_session(
    Extension(session): Extension<AuthenticatedSession>,
) -> Json<ApiResponse<SessionInfo>> {
    Json(ApiResponse::success(SessionInfo {
        sub: session.subject,
        email: session.email,
        name: session.name,
        issuer: session.issuer,
        issued_at: session.issued_at,
        expires_at: session.expires_at,
    }))
}
