//! Partition identifiers and resolved partition metadata.

use std::fmt;

use crate::error::ClientError;

/// Argument name reported by partition id validation errors.
pub const DATA_PARTITION_ID: &str = "dataPartitionId";

/// A validated, non-empty data partition (tenant) identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionId(String);

impl PartitionId {
    /// Validates and wraps a partition id.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::EmptyArgument`] when `value` is empty.
    pub fn new(value: impl Into<String>) -> Result<Self, ClientError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ClientError::empty_argument(DATA_PARTITION_ID));
        }
        Ok(Self(value))
    }

    /// Validates an optional partition id, distinguishing absent from empty.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingArgument`] for `None` and
    /// [`ClientError::EmptyArgument`] for an empty string.
    pub fn from_optional(value: Option<impl Into<String>>) -> Result<Self, ClientError> {
        match value {
            Some(v) => Self::new(v),
            None => Err(ClientError::missing_argument(DATA_PARTITION_ID)),
        }
    }

    /// Returns the partition id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PartitionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Conversion into a validated [`PartitionId`].
///
/// Lets the cache accept `&str`, `String`, `Option<&str>`, `Option<String>`
/// or an already validated id while keeping validation ahead of any lookup.
pub trait IntoPartitionId {
    /// Performs the conversion.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument [`ClientError`] for missing or empty values.
    fn into_partition_id(self) -> Result<PartitionId, ClientError>;
}

impl IntoPartitionId for PartitionId {
    fn into_partition_id(self) -> Result<PartitionId, ClientError> {
        Ok(self)
    }
}

impl IntoPartitionId for &PartitionId {
    fn into_partition_id(self) -> Result<PartitionId, ClientError> {
        Ok(self.clone())
    }
}

impl IntoPartitionId for &str {
    fn into_partition_id(self) -> Result<PartitionId, ClientError> {
        PartitionId::new(self)
    }
}

impl IntoPartitionId for String {
    fn into_partition_id(self) -> Result<PartitionId, ClientError> {
        PartitionId::new(self)
    }
}

impl IntoPartitionId for &String {
    fn into_partition_id(self) -> Result<PartitionId, ClientError> {
        PartitionId::new(self.as_str())
    }
}

impl IntoPartitionId for Option<&str> {
    fn into_partition_id(self) -> Result<PartitionId, ClientError> {
        PartitionId::from_optional(self)
    }
}

impl IntoPartitionId for Option<String> {
    fn into_partition_id(self) -> Result<PartitionId, ClientError> {
        PartitionId::from_optional(self)
    }
}

/// A shared account key. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct PrimaryKey(String);

impl PrimaryKey {
    /// Wraps a key value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw key for handing to the driver.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrimaryKey(<redacted>)")
    }
}

/// Connection metadata for one partition, as returned by the metadata service.
#[derive(Debug, Clone)]
pub struct PartitionInfo {
    /// Database account endpoint for the partition.
    pub endpoint: String,
    /// Shared key for key-based authentication, if the partition has one.
    pub primary_key: Option<PrimaryKey>,
}

impl PartitionInfo {
    /// Creates partition info with an endpoint and no key.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            primary_key: None,
        }
    }

    /// Sets the primary key.
    #[must_use]
    pub fn with_primary_key(mut self, key: impl Into<String>) -> Self {
        self.primary_key = Some(PrimaryKey::new(key));
        self
    }
}
