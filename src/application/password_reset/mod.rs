//! Password reset: issue a code by email, redeem it for a new password.

pub mod service;

pub use service::{
    PasswordResetConfig, PasswordResetError, PasswordResetService, ResetIssued, VerifyReset,
};
