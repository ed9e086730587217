//! Partition property model returned by the partition service.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Property holding the partition's database endpoint.
pub const ENDPOINT_PROPERTY: &str = "database-endpoint";

/// Property holding the partition's database account key.
pub const PRIMARY_KEY_PROPERTY: &str = "database-primary-key";

/// One partition property.
///
/// For sensitive properties `value` is the name of a secret in the secret
/// store, not the secret itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionProperty {
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default)]
    pub value: Value,
}

impl PartitionProperty {
    /// A non-sensitive string property.
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            sensitive: false,
            value: Value::String(value.into()),
        }
    }

    /// A sensitive property referring to a secret by name.
    pub fn secret_ref(secret_name: impl Into<String>) -> Self {
        Self {
            sensitive: true,
            value: Value::String(secret_name.into()),
        }
    }

    /// The value as text; `None` for null or missing values.
    pub fn as_text(&self) -> Option<String> {
        match &self.value {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Property bag of a single partition, keyed by property name.
pub type PartitionProperties = HashMap<String, PartitionProperty>;
