//! Domain layer: alumni accounts and password-reset codes
//!
//! Plain data types plus the repository traits the application layer
//! depends on. No persistence or HTTP concerns live here.

pub mod password_reset;
pub mod user;

pub use password_reset::{PasswordReset, PasswordResetRepositoryInterface};
pub use user::{CreateUserDto, User, UserRepositoryInterface};

pub use crate::shared::errors::{DomainError, DomainResult};
