//! Outbound ports: interfaces for delivering mail
//!
//! [`EmailSender`] decouples the password-reset service from the transport.
//! The bundled implementation is
//! [`LogEmailSender`](crate::infrastructure::mail::LogEmailSender); SMTP or
//! API-based delivery is plugged in by implementing the trait.

use async_trait::async_trait;
use thiserror::Error;

/// A rendered message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail transport error: {0}")]
    Transport(String),
}

/// Email delivery abstraction
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error.
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}
