//! Password reset module: request a reset code, redeem it

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
