//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories.

pub mod password_reset_repository;
pub mod user_repository;

pub use password_reset_repository::PasswordResetRepository;
pub use user_repository::UserRepository;
