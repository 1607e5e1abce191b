//! # Alumni Auth
//!
//! Authentication service for the alumni association backend: exchanges
//! OpenID Connect id_tokens for locally signed session tokens and runs the
//! emailed password-reset flow.
//!
//! ## Architecture
//!
//! - **domain**: accounts, reset codes and the repository traits
//! - **application**: token exchange and password reset use cases, outbound ports
//! - **infrastructure**: database, crypto, OIDC key sets, mail adapters
//! - **interfaces**: REST API with Swagger documentation
//! - **server**: process lifecycle (startup, graceful shutdown, tracing)

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig, ConfigError};

// Re-export database types for easy access
pub use infrastructure::{init_database, run_migrations, DatabaseConfig};

// Re-export API router
pub use interfaces::http::{create_api_router, AppServices};
