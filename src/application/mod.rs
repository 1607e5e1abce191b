//! Application layer: use-case orchestration over the domain and the
//! outbound ports.

pub mod identity;
pub mod password_reset;
pub mod ports;

pub use identity::{SessionToken, TokenExchangeService};
pub use password_reset::{
    PasswordResetConfig, PasswordResetError, PasswordResetService, ResetIssued, VerifyReset,
};
pub use ports::{EmailMessage, EmailSender, MailError};
