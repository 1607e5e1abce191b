//! Identity module: third-party sign-in and local session tokens
//!
//! Contains the `TokenExchangeService` which trades a verified OIDC
//! id_token for a locally signed session token.

pub mod service;

pub use service::{SessionToken, TokenExchangeService};
