//! Password reset API handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use tracing::error;

use super::dto::{ForgotPasswordRequest, ForgotPasswordResponse, VerifyResetRequest};
use crate::application::{PasswordResetError, PasswordResetService};
use crate::infrastructure::database::{PasswordResetRepository, UserRepository};
use crate::interfaces::http::common::{ApiResponse, MessageResponse, ValidatedJson};

/// Reset service over the SeaORM repositories
pub type SeaOrmPasswordResetService = PasswordResetService<UserRepository, PasswordResetRepository>;

#[derive(Clone)]
pub struct PasswordResetHandlerState {
    pub service: Arc<SeaOrmPasswordResetService>,
}

fn reset_error_status(e: &PasswordResetError) -> StatusCode {
    match e {
        PasswordResetError::EmailNotFound | PasswordResetError::UserNotFound => {
            StatusCode::NOT_FOUND
        }
        PasswordResetError::InvalidPayload
        | PasswordResetError::MissingToken
        | PasswordResetError::InvalidToken
        | PasswordResetError::Expired
        | PasswordResetError::PasswordMismatch
        | PasswordResetError::PasswordTooShort(_) => StatusCode::BAD_REQUEST,
        PasswordResetError::MailDelivery(_)
        | PasswordResetError::Hashing(_)
        | PasswordResetError::UpdateFailed(_)
        | PasswordResetError::Storage(_)
        | PasswordResetError::ResetLink(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response<T>(e: PasswordResetError) -> (StatusCode, Json<ApiResponse<T>>) {
    let status = reset_error_status(&e);
    if status.is_server_error() {
        error!(error = ?e, "Password reset failed");
    }
    (status, Json(ApiResponse::error(e.to_string())))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/password/forgot",
    tag = "Password Reset",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset email sent", body = ApiResponse<ForgotPasswordResponse>),
        (status = 400, description = "Invalid request payload"),
        (status = 404, description = "Email not found"),
        (status = 500, description = "Failed to send email")
    )
)]
pub async fn forgot_password(
    State(state): State<PasswordResetHandlerState>,
    ValidatedJson(request): ValidatedJson<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<ForgotPasswordResponse>>, (StatusCode, Json<ApiResponse<ForgotPasswordResponse>>)>
{
    let issued = state
        .service
        .request_reset(&request.email)
        .await
        .map_err(error_response)?;

    let token = state
        .service
        .config()
        .echo_code_in_response
        .then_some(issued.code);

    Ok(Json(ApiResponse::success(ForgotPasswordResponse {
        message: "Email received for reset Password".to_string(),
        email: issued.email,
        token,
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/password/reset",
    tag = "Password Reset",
    request_body = VerifyResetRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<MessageResponse>),
        (status = 400, description = "Invalid, expired or mismatched input"),
        (status = 404, description = "Alumni not found"),
        (status = 500, description = "Failed to update password")
    )
)]
pub async fn reset_password(
    State(state): State<PasswordResetHandlerState>,
    ValidatedJson(request): ValidatedJson<VerifyResetRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, (StatusCode, Json<ApiResponse<MessageResponse>>)> {
    state
        .service
        .verify_reset(request.into())
        .await
        .map_err(error_response)?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password has been reset successfully",
    ))))
}
