//! Local secret store with AES-256-GCM encryption at rest
//!
//! Secret values (database endpoints, account keys) may be kept in the
//! settings file either in plaintext or encrypted. Encrypted values are
//! decrypted on every read with the key from `TENANTDB_SECRETS_KEY`; values
//! are never cached in plaintext.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tenantdb_core::{ClientError, SecretStore};
use tokio::sync::RwLock;
use tracing::trace;

use crate::ConfigError;
use crate::settings::Settings;

/// Environment variable holding the secrets key (hex or base64)
pub const SECRETS_KEY_ENV: &str = "TENANTDB_SECRETS_KEY";

/// Nonce size for AES-256-GCM (96 bits)
const NONCE_SIZE: usize = 12;

/// Key size for AES-256 (256 bits)
const KEY_SIZE: usize = 32;

/// A stored secret, optionally encrypted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretValue {
    /// Whether this value is encrypted
    pub encrypted: bool,
    /// Base64-encoded ciphertext (or the plaintext when not encrypted)
    pub ciphertext: String,
    /// Base64-encoded nonce
    #[serde(default)]
    pub nonce: String,
    /// Identifier of the key the value was encrypted with
    #[serde(default)]
    pub key_id: String,
}

impl SecretValue {
    /// Encrypt a plaintext value
    pub fn encrypt(
        plaintext: &str,
        key: &[u8; KEY_SIZE],
        key_id: &str,
    ) -> Result<Self, ConfigError> {
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| ConfigError::encryption(format!("Failed to create cipher: {e}")))?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| ConfigError::encryption(format!("Encryption failed: {e}")))?;

        Ok(Self {
            encrypted: true,
            ciphertext: BASE64.encode(&ciphertext),
            nonce: BASE64.encode(nonce_bytes),
            key_id: key_id.to_string(),
        })
    }

    /// Decrypt the value
    pub fn decrypt(&self, key: &[u8; KEY_SIZE]) -> Result<String, ConfigError> {
        if !self.encrypted {
            return Err(ConfigError::encryption("Value is not encrypted"));
        }

        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| ConfigError::encryption(format!("Failed to create cipher: {e}")))?;

        let ciphertext = BASE64
            .decode(&self.ciphertext)
            .map_err(|e| ConfigError::encryption(format!("Invalid ciphertext base64: {e}")))?;

        let nonce_bytes = BASE64
            .decode(&self.nonce)
            .map_err(|e| ConfigError::encryption(format!("Invalid nonce base64: {e}")))?;

        if nonce_bytes.len() != NONCE_SIZE {
            return Err(ConfigError::encryption("Invalid nonce size"));
        }

        let nonce = Nonce::from_slice(&nonce_bytes);

        let plaintext = cipher
            .decrypt(nonce, ciphertext.as_ref())
            .map_err(|e| ConfigError::encryption(format!("Decryption failed: {e}")))?;

        String::from_utf8(plaintext)
            .map_err(|e| ConfigError::encryption(format!("Invalid UTF-8 in decrypted value: {e}")))
    }

    /// Create a plaintext (unencrypted) secret value
    pub fn plaintext(value: &str) -> Self {
        Self {
            encrypted: false,
            ciphertext: value.to_string(),
            nonce: String::new(),
            key_id: String::new(),
        }
    }

    /// Get the value (decrypted if needed, or plaintext)
    pub fn get(&self, key: Option<&[u8; KEY_SIZE]>) -> Result<String, ConfigError> {
        if self.encrypted {
            match key {
                Some(k) => self.decrypt(k),
                None => Err(ConfigError::encryption(
                    "Encryption key required to decrypt secret",
                )),
            }
        } else {
            Ok(self.ciphertext.clone())
        }
    }
}

/// The key that decrypts [`SecretValue`]s read from the settings file
#[derive(Clone)]
pub struct Secrets {
    key_id: String,
    key: [u8; KEY_SIZE],
}

impl Secrets {
    /// Load the key from `TENANTDB_SECRETS_KEY`, if set
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        match std::env::var(SECRETS_KEY_ENV) {
            Ok(key_str) => {
                let key = Self::parse_key(&key_str)?;
                Ok(Some(Self::new(key, "primary")))
            }
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(ConfigError::encryption(format!(
                "Failed to read {SECRETS_KEY_ENV}: {e}"
            ))),
        }
    }

    pub fn new(key: [u8; KEY_SIZE], key_id: &str) -> Self {
        Self {
            key_id: key_id.to_string(),
            key,
        }
    }

    /// Parse a key from a hex or base64 string
    pub fn parse_key(key_str: &str) -> Result<[u8; KEY_SIZE], ConfigError> {
        let key_str = key_str.trim();

        if key_str.len() == KEY_SIZE * 2
            && let Ok(bytes) = hex::decode(key_str)
            && bytes.len() == KEY_SIZE
        {
            let mut key = [0u8; KEY_SIZE];
            key.copy_from_slice(&bytes);
            return Ok(key);
        }

        let bytes = BASE64
            .decode(key_str)
            .map_err(|e| ConfigError::encryption(format!("Invalid base64 key: {e}")))?;

        if bytes.len() != KEY_SIZE {
            return Err(ConfigError::encryption(format!(
                "Key must be {} bytes, got {}",
                KEY_SIZE,
                bytes.len()
            )));
        }

        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(&bytes);
        Ok(key)
    }

    /// Decrypt a secret value; plaintext values pass through.
    ///
    /// A value that names a different key id is rejected without trying to
    /// decrypt it. An empty key id matches any key.
    pub fn decrypt(&self, secret: &SecretValue) -> Result<String, ConfigError> {
        if !secret.encrypted {
            return Ok(secret.ciphertext.clone());
        }
        if !secret.key_id.is_empty() && secret.key_id != self.key_id {
            return Err(ConfigError::encryption(format!(
                "Secret was encrypted with key '{}', but the configured key is '{}'",
                secret.key_id, self.key_id
            )));
        }
        secret.decrypt(&self.key)
    }
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("key_id", &self.key_id)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// In-process [`SecretStore`] holding named [`SecretValue`]s
#[derive(Debug, Clone, Default)]
pub struct LocalSecretStore {
    entries: Arc<RwLock<HashMap<String, SecretValue>>>,
    secrets: Option<Secrets>,
}

impl LocalSecretStore {
    /// Create an empty store; encrypted entries need `secrets` to be readable
    pub fn new(secrets: Option<Secrets>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            secrets,
        }
    }

    /// Create a store seeded with the `[secrets]` section of the settings
    pub fn from_settings(settings: &Settings, secrets: Option<Secrets>) -> Self {
        let entries = settings
            .secrets
            .iter()
            .map(|(name, entry)| (name.clone(), SecretValue::from(entry.clone())))
            .collect();

        Self {
            entries: Arc::new(RwLock::new(entries)),
            secrets,
        }
    }

    /// Store a value as-is
    pub async fn insert(&self, name: impl Into<String>, value: SecretValue) {
        self.entries.write().await.insert(name.into(), value);
    }

    /// Store a plaintext value
    pub async fn insert_plaintext(&self, name: impl Into<String>, value: &str) {
        self.insert(name, SecretValue::plaintext(value)).await;
    }
}

#[async_trait]
impl SecretStore for LocalSecretStore {
    async fn get_secret(&self, name: &str) -> Result<String, ClientError> {
        let value = self
            .entries
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| ClientError::secret_not_found(name))?;

        trace!(secret = %name, encrypted = value.encrypted, "Resolving local secret");

        let plaintext = match &self.secrets {
            Some(secrets) => secrets.decrypt(&value)?,
            None => value.get(None)?,
        };
        Ok(plaintext)
    }
}
