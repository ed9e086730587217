use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tenantdb_core::{DirectConnectionConfig, ThrottlingRetryOptions};

use crate::ConfigError;
use crate::secrets::SecretValue;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Identity-based authentication flags
    #[serde(default)]
    pub identity: IdentitySettings,
    /// Throttling retry policy applied to every client
    #[serde(default)]
    pub retry: RetrySettings,
    /// Connection mode tuning
    #[serde(default)]
    pub connection: ConnectionSettings,
    /// Secret names used by the system client
    #[serde(default)]
    pub system: SystemSettings,
    /// Partition metadata service
    #[serde(default)]
    pub partition_service: PartitionServiceSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Entries for the local secret store, keyed by secret name
    #[serde(default)]
    pub secrets: HashMap<String, SecretEntry>,
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.max_retry_wait_time_secs == 0 {
            return Err(ConfigError::validation(
                "retry.max_retry_wait_time_secs must be > 0",
            ));
        }
        if self.connection.max_connections_per_endpoint == Some(0) {
            return Err(ConfigError::validation(
                "connection.max_connections_per_endpoint must be > 0 when set",
            ));
        }
        if self.system.endpoint_secret_name.trim().is_empty() {
            return Err(ConfigError::validation(
                "system.endpoint_secret_name must not be empty",
            ));
        }
        if self.system.primary_key_secret_name.trim().is_empty() {
            return Err(ConfigError::validation(
                "system.primary_key_secret_name must not be empty",
            ));
        }
        if self.partition_service.url.trim().is_empty() {
            return Err(ConfigError::validation(
                "partition_service.url must not be empty",
            ));
        }
        if self.partition_service.timeout_ms == 0 {
            return Err(ConfigError::validation(
                "partition_service.timeout_ms must be > 0",
            ));
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(ConfigError::validation(format!(
                "logging.level must be one of {valid_levels:?}"
            )));
        }
        Ok(())
    }
}

/// The two independent switches for identity-based authentication.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct IdentitySettings {
    /// Managed (platform-assigned) identity
    #[serde(default)]
    pub managed_identity_enabled: bool,
    /// Workload identity (federated token exchange)
    #[serde(default)]
    pub workload_identity_enabled: bool,
}

impl IdentitySettings {
    /// Either flag alone selects identity-based authentication.
    pub fn is_identity_enabled(&self) -> bool {
        self.managed_identity_enabled || self.workload_identity_enabled
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts_on_throttled_requests: u32,
    #[serde(default = "default_max_retry_wait_time_secs")]
    pub max_retry_wait_time_secs: u64,
}

fn default_max_retry_attempts() -> u32 {
    9
}
fn default_max_retry_wait_time_secs() -> u64 {
    30
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retry_attempts_on_throttled_requests: default_max_retry_attempts(),
            max_retry_wait_time_secs: default_max_retry_wait_time_secs(),
        }
    }
}

impl RetrySettings {
    pub fn throttling_retry_options(&self) -> ThrottlingRetryOptions {
        ThrottlingRetryOptions::default()
            .with_max_retry_attempts(self.max_retry_attempts_on_throttled_requests)
            .with_max_retry_wait_time(Duration::from_secs(self.max_retry_wait_time_secs))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConnectionSettings {
    /// When unset, clients keep the driver's default connection mode.
    #[serde(default)]
    pub max_connections_per_endpoint: Option<u32>,
}

impl ConnectionSettings {
    pub fn direct_connection_config(&self) -> Option<DirectConnectionConfig> {
        self.max_connections_per_endpoint
            .map(|max| DirectConnectionConfig::default().with_max_connections_per_endpoint(max))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSettings {
    /// Secret holding the system account endpoint
    #[serde(default = "default_endpoint_secret_name")]
    pub endpoint_secret_name: String,
    /// Secret holding the system account key (key-based auth only)
    #[serde(default = "default_primary_key_secret_name")]
    pub primary_key_secret_name: String,
}

fn default_endpoint_secret_name() -> String {
    "system-db-endpoint".into()
}
fn default_primary_key_secret_name() -> String {
    "system-db-primary-key".into()
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            endpoint_secret_name: default_endpoint_secret_name(),
            primary_key_secret_name: default_primary_key_secret_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionServiceSettings {
    /// Base URL, e.g. `http://partition/api/partition/v1`
    #[serde(default = "default_partition_url")]
    pub url: String,
    #[serde(default = "default_partition_timeout_ms")]
    pub timeout_ms: u64,
    /// Token scope requested from the credential; no bearer token when unset
    #[serde(default)]
    pub scope: Option<String>,
}

fn default_partition_url() -> String {
    "http://localhost:8080/api/partition/v1".into()
}
fn default_partition_timeout_ms() -> u64 {
    5000
}

impl Default for PartitionServiceSettings {
    fn default() -> Self {
        Self {
            url: default_partition_url(),
            timeout_ms: default_partition_timeout_ms(),
            scope: None,
        }
    }
}

impl PartitionServiceSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// A secret as written in the settings file: a bare string or an encrypted value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SecretEntry {
    Plain(String),
    Encrypted(SecretValue),
}

impl From<SecretEntry> for SecretValue {
    fn from(entry: SecretEntry) -> Self {
        match entry {
            SecretEntry::Plain(value) => SecretValue::plaintext(&value),
            SecretEntry::Encrypted(value) => value,
        }
    }
}
