//! Password-reset codes
//!
//! One outstanding code per email address. Issuing a new code for an
//! address replaces the previous one.

pub mod model;
pub mod repository;

pub use model::PasswordReset;
pub use repository::PasswordResetRepositoryInterface;
