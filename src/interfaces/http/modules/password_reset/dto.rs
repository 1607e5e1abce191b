//! Password reset DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::VerifyReset;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "invalid email format"))]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ForgotPasswordResponse {
    pub message: String,
    pub email: String,
    /// Reset code; only returned when echoing is enabled in the config
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Code redemption. Field names follow the existing front-end contract.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub struct VerifyResetRequest {
    #[serde(rename = "NewPassword")]
    pub new_password: String,
    pub token: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "ConfirmNewPassword")]
    pub confirm_new_password: String,
}

impl From<VerifyResetRequest> for VerifyReset {
    fn from(r: VerifyResetRequest) -> Self {
        Self {
            email: r.email,
            token: r.token,
            new_password: r.new_password,
            confirm_new_password: r.confirm_new_password,
        }
    }
}
