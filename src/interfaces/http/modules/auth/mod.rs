//! Authentication module: id_token exchange and current session

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
