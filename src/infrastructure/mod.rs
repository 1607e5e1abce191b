//! Infrastructure layer - external concerns

pub mod crypto;
pub mod database;
pub mod mail;
pub mod oidc;

pub use database::{init_database, run_migrations, DatabaseConfig};
pub use mail::{LogEmailSender, MemoryEmailSender};
pub use oidc::{OidcError, OidcVerifier};
