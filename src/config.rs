//! Application configuration
//!
//! Loaded from a TOML file (`~/.config/alumni-auth/config.toml` by default).
//! Every section has defaults, so a missing file or a partial file is fine.
//! A handful of secrets can be overridden from the environment:
//! `DATABASE_URL`, `JWT_SECRET` and `OIDC_CLIENT_ID`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration loading / validation failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Default location of the config file
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("alumni-auth")
        .join("config.toml")
}

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSettings,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub oidc: OidcSettings,
    pub password_reset: PasswordResetSettings,
    pub mail: MailSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// REST API bind address
    pub api_host: String,
    /// REST API port
    pub api_port: u16,
    /// Seconds to wait for in-flight requests on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 8080,
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Full SeaORM connection URL. Takes precedence over `sqlite_path`.
    pub url: Option<String>,
    /// SQLite file used when no URL is given
    pub sqlite_path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            sqlite_path: "./alumni.db".to_string(),
        }
    }
}

impl DatabaseSettings {
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!("sqlite://{}?mode=rwc", self.sqlite_path),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    /// `json` or `text`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// HMAC secret for locally issued session tokens
    pub jwt_secret: String,
    /// Session token lifetime
    pub jwt_expiration_hours: i64,
    /// `iss` claim of locally issued tokens
    pub jwt_issuer: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_expiration_hours: 1,
            jwt_issuer: "alumni-auth".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OidcSettings {
    /// Key set of the identity provider
    pub jwks_url: String,
    /// Accepted `iss` values must start with this
    pub issuer_prefix: String,
    /// Expected `aud` (application / client id registered with the provider)
    pub client_id: String,
    /// How long fetched keys are trusted before a refetch
    pub jwks_refresh_secs: u64,
    /// Minimum spacing of refetches caused by an unknown `kid`
    pub jwks_min_refetch_secs: u64,
    /// Leeway applied to `exp` / `nbf`
    pub clock_skew_secs: u64,
    /// Timeout for the JWKS HTTP request
    pub http_timeout_secs: u64,
}

impl Default for OidcSettings {
    fn default() -> Self {
        Self {
            jwks_url: "https://login.microsoftonline.com/common/discovery/v2.0/keys".to_string(),
            issuer_prefix: "https://login.microsoftonline.com/".to_string(),
            client_id: String::new(),
            jwks_refresh_secs: 3600,
            jwks_min_refetch_secs: 10,
            clock_skew_secs: 60,
            http_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordResetSettings {
    /// Validity window of a reset code
    pub code_ttl_minutes: i64,
    /// Front-end page the code is linked to
    pub reset_link_base: String,
    /// Return the code in the API response (local development only)
    pub echo_code_in_response: bool,
    pub min_password_length: usize,
}

impl Default for PasswordResetSettings {
    fn default() -> Self {
        Self {
            code_ttl_minutes: 5,
            reset_link_base: "https://alumni.bpitindia.com/reset-password".to_string(),
            echo_code_in_response: false,
            min_password_length: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailSettings {
    /// `From` address of outgoing mail
    pub from: String,
    /// Subject of the reset email
    pub reset_subject: String,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            from: "no-reply@alumni.bpitindia.com".to_string(),
            reset_subject: "Password Reset Request".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    /// Environment overrides are applied in both cases.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            Self::from_toml_str(&raw)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.security.jwt_secret = secret;
        }
        if let Ok(client_id) = std::env::var("OIDC_CLIENT_ID") {
            self.oidc.client_id = client_id;
        }
    }

    /// Reject configurations the server cannot safely run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.len() < 16 {
            return Err(ConfigError::Invalid(
                "security.jwt_secret must be at least 16 bytes".into(),
            ));
        }
        if self.security.jwt_expiration_hours <= 0 {
            return Err(ConfigError::Invalid(
                "security.jwt_expiration_hours must be positive".into(),
            ));
        }
        if self.oidc.client_id.trim().is_empty() {
            return Err(ConfigError::Invalid("oidc.client_id is required".into()));
        }
        if url::Url::parse(&self.password_reset.reset_link_base).is_err() {
            return Err(ConfigError::Invalid(
                "password_reset.reset_link_base must be an absolute URL".into(),
            ));
        }
        if self.password_reset.code_ttl_minutes <= 0 {
            return Err(ConfigError::Invalid(
                "password_reset.code_ttl_minutes must be positive".into(),
            ));
        }
        Ok(())
    }
}
