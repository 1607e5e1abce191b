//! Password reset service
//!
//! Codes are stored one per email address, mailed as a link, and deleted
//! once redeemed. Secrets (codes, passwords) never reach the logs.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::application::ports::{EmailMessage, EmailSender, MailError};
use crate::config::{MailSettings, PasswordResetSettings};
use crate::domain::{DomainError, PasswordResetRepositoryInterface, UserRepositoryInterface};
use crate::infrastructure::crypto::password::hash_password;
use crate::infrastructure::crypto::reset_code::{build_reset_link, generate_reset_code};
use crate::infrastructure::mail::render_reset_email;

/// Behaviour of the reset flow
#[derive(Debug, Clone)]
pub struct PasswordResetConfig {
    pub code_ttl_minutes: i64,
    pub reset_link_base: String,
    pub echo_code_in_response: bool,
    pub min_password_length: usize,
    pub mail_from: String,
    pub mail_subject: String,
}

impl Default for PasswordResetConfig {
    fn default() -> Self {
        Self::from_settings(&PasswordResetSettings::default(), &MailSettings::default())
    }
}

impl PasswordResetConfig {
    pub fn from_settings(reset: &PasswordResetSettings, mail: &MailSettings) -> Self {
        Self {
            code_ttl_minutes: reset.code_ttl_minutes,
            reset_link_base: reset.reset_link_base.clone(),
            echo_code_in_response: reset.echo_code_in_response,
            min_password_length: reset.min_password_length,
            mail_from: mail.from.clone(),
            mail_subject: mail.reset_subject.clone(),
        }
    }
}

/// Reset flow failures. The display strings are the client-facing messages.
#[derive(Debug, Error)]
pub enum PasswordResetError {
    #[error("Invalid request payload")]
    InvalidPayload,

    #[error("Email not found")]
    EmailNotFound,

    #[error("Failed to send email")]
    MailDelivery(#[source] MailError),

    #[error("Invalid token")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Token has expired")]
    Expired,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least {0} characters")]
    PasswordTooShort(usize),

    #[error("Failed to hash password")]
    Hashing(String),

    #[error("Alumni not found")]
    UserNotFound,

    #[error("Failed to update password")]
    UpdateFailed(#[source] DomainError),

    #[error("Internal server error")]
    Storage(#[from] DomainError),

    #[error("Internal server error")]
    ResetLink(#[from] url::ParseError),
}

/// Outcome of a successful reset request
#[derive(Debug, Clone)]
pub struct ResetIssued {
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// A code redemption
#[derive(Debug, Clone)]
pub struct VerifyReset {
    pub email: String,
    pub token: String,
    pub new_password: String,
    pub confirm_new_password: String,
}

pub struct PasswordResetService<U, R>
where
    U: UserRepositoryInterface,
    R: PasswordResetRepositoryInterface,
{
    users: Arc<U>,
    resets: Arc<R>,
    mailer: Arc<dyn EmailSender>,
    config: PasswordResetConfig,
}

impl<U, R> PasswordResetService<U, R>
where
    U: UserRepositoryInterface,
    R: PasswordResetRepositoryInterface,
{
    pub fn new(
        users: Arc<U>,
        resets: Arc<R>,
        mailer: Arc<dyn EmailSender>,
        config: PasswordResetConfig,
    ) -> Self {
        Self {
            users,
            resets,
            mailer,
            config,
        }
    }

    pub fn config(&self) -> &PasswordResetConfig {
        &self.config
    }

    /// Issue (or re-issue) a reset code for `email` and mail the link.
    pub async fn request_reset(&self, email: &str) -> Result<ResetIssued, PasswordResetError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(PasswordResetError::InvalidPayload);
        }

        let active = self
            .users
            .get_user_by_email(email)
            .await?
            .is_some_and(|user| user.is_active);
        if !active {
            info!(email = %email, "Password reset requested for unknown or inactive email");
            return Err(PasswordResetError::EmailNotFound);
        }

        let code = generate_reset_code();
        let link = build_reset_link(&self.config.reset_link_base, &code, email)?;
        let expires_at = Utc::now() + Duration::minutes(self.config.code_ttl_minutes);
        self.resets.upsert_for_email(email, &code, expires_at).await?;

        let message = EmailMessage {
            from: self.config.mail_from.clone(),
            to: email.to_string(),
            subject: self.config.mail_subject.clone(),
            html_body: render_reset_email(&link, self.config.code_ttl_minutes),
        };

        if let Err(e) = self.mailer.send(&message).await {
            error!(email = %email, error = %e, "Failed to send password reset email");
            return Err(PasswordResetError::MailDelivery(e));
        }

        info!(email = %email, expires_at = %expires_at, "Password reset code issued");

        Ok(ResetIssued {
            email: email.to_string(),
            code,
            expires_at,
        })
    }

    /// Redeem a code and store the new password hash.
    pub async fn verify_reset(&self, request: VerifyReset) -> Result<(), PasswordResetError> {
        if request.token.is_empty() {
            return Err(PasswordResetError::MissingToken);
        }

        let Some(reset) = self
            .resets
            .find_by_code_and_email(&request.token, &request.email)
            .await?
        else {
            return Err(PasswordResetError::InvalidToken);
        };

        if reset.is_expired_at(Utc::now()) {
            if let Err(e) = self.resets.delete(&reset.id).await {
                warn!(email = %reset.email, error = %e, "Failed to remove expired reset code");
            }
            return Err(PasswordResetError::Expired);
        }

        if request.new_password != request.confirm_new_password {
            return Err(PasswordResetError::PasswordMismatch);
        }

        if request.new_password.chars().count() < self.config.min_password_length {
            return Err(PasswordResetError::PasswordTooShort(
                self.config.min_password_length,
            ));
        }

        let password_hash = hash_password(&request.new_password)
            .map_err(|e| PasswordResetError::Hashing(e.to_string()))?;

        let Some(user) = self
            .users
            .get_user_by_email(&reset.email)
            .await?
            .filter(|user| user.is_active)
        else {
            return Err(PasswordResetError::UserNotFound);
        };

        let redeemed = self
            .resets
            .redeem(&reset, &user.id, &password_hash)
            .await
            .map_err(|e| {
                error!(user_id = %user.id, error = %e, "Failed to update password");
                PasswordResetError::UpdateFailed(e)
            })?;
        if !redeemed {
            warn!(email = %reset.email, "Reset code redeemed concurrently");
            return Err(PasswordResetError::InvalidToken);
        }

        info!(user_id = %user.id, "Password has been reset");
        Ok(())
    }
}
