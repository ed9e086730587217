//! Configuration for the tenantdb client cache.
//!
//! This crate provides:
//! - [`Settings`]: the serde model for every value the cache reads
//! - [`loader`]: TOML file + `TENANTDB__*` environment loading with validation
//! - [`IdentityConfig`]: the reloadable identity-auth flags consulted on each
//!   client construction
//! - [`LocalSecretStore`]: a [`tenantdb_core::SecretStore`] backed by
//!   plaintext or AES-256-GCM encrypted entries
//! - [`logging`]: tracing subscriber setup with a runtime-adjustable level
//!
//! # Example
//!
//! ```ignore
//! use tenantdb_config::{IdentityConfig, loader::load_settings};
//!
//! let settings = load_settings(Some("tenantdb.toml"))?;
//! let identity = IdentityConfig::new(settings.identity.clone());
//! if identity.is_identity_auth_enabled() {
//!     // clients bind the platform credential instead of a shared key
//! }
//! ```

pub mod identity;
pub mod loader;
pub mod logging;
pub mod secrets;
pub mod settings;

// Re-export main types
pub use identity::IdentityConfig;
pub use secrets::{LocalSecretStore, SecretValue, Secrets};
pub use settings::{
    ConnectionSettings, IdentitySettings, LoggingSettings, PartitionServiceSettings,
    RetrySettings, SecretEntry, Settings, SystemSettings,
};

use tenantdb_core::ClientError;

/// Error types for configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Load error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Encryption error: {0}")]
    Encryption(String),
}

impl ConfigError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn encryption(msg: impl Into<String>) -> Self {
        Self::Encryption(msg.into())
    }
}

impl From<ConfigError> for ClientError {
    fn from(err: ConfigError) -> Self {
        ClientError::secret_store(err.to_string())
    }
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
