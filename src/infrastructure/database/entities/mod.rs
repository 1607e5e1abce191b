//! Database entities module

pub mod password_reset;
pub mod user;

pub use password_reset::Entity as PasswordReset;
pub use user::Entity as User;
