//! Collaborator traits for the client cache.
//!
//! The cache depends on four external services, each reached through one of
//! these traits: partition metadata, secret storage, a token credential and
//! the database driver's client handles. Implementations must be thread-safe
//! (`Send + Sync`).

use std::fmt;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::error::ClientError;
use crate::partition::{PartitionId, PartitionInfo};

/// Resolves a partition id to its database endpoint and key.
///
/// # Example
///
/// ```ignore
/// use tenantdb_core::{PartitionId, PartitionResolver};
///
/// async fn endpoint_of(resolver: &dyn PartitionResolver, id: &PartitionId) -> String {
///     resolver.resolve(id).await.map(|info| info.endpoint).unwrap_or_default()
/// }
/// ```
#[async_trait]
pub trait PartitionResolver: Send + Sync {
    /// Looks up connection metadata for a partition.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::UnknownPartition` if the partition does not exist.
    /// Returns `ClientError::PartitionService` if the service is unreachable
    /// or its answer is unusable.
    async fn resolve(&self, partition_id: &PartitionId) -> Result<PartitionInfo, ClientError>;

    /// Looks up only the endpoint of a partition; `primary_key` is `None`.
    ///
    /// Used when clients authenticate with a credential and the key is never
    /// needed. Implementations that fetch the key separately should override
    /// this so the key is not read at all.
    ///
    /// # Errors
    ///
    /// Same as [`Self::resolve`].
    async fn resolve_endpoint(
        &self,
        partition_id: &PartitionId,
    ) -> Result<PartitionInfo, ClientError> {
        self.resolve(partition_id)
            .await
            .map(|info| PartitionInfo::new(info.endpoint))
    }
}

/// Resolves named secrets to their values.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetches the current value of a secret.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::SecretNotFound` if no secret has that name, never
    /// an empty value in its place.
    async fn get_secret(&self, name: &str) -> Result<String, ClientError>;
}

/// A bearer token issued by a credential provider.
#[derive(Clone)]
pub struct AccessToken {
    /// Raw token value.
    pub token: String,
    /// When the token stops being valid.
    pub expires_on: OffsetDateTime,
}

impl AccessToken {
    /// Creates a token.
    #[must_use]
    pub fn new(token: impl Into<String>, expires_on: OffsetDateTime) -> Self {
        Self {
            token: token.into(),
            expires_on,
        }
    }

    /// Returns `true` once the expiry time has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() >= self.expires_on
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// Platform-issued credential used for identity-based authentication.
///
/// The cache treats it as opaque and hands it to the driver unchanged.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Requests a token valid for the given scopes.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Credential` if no token can be issued.
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken, ClientError>;
}

/// A blocking database client handle owned by the cache.
pub trait DatabaseClient: Send + Sync {
    /// Releases every connection held by the client.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Close` if the driver reports a failure.
    fn close(&self) -> Result<(), ClientError>;
}

impl fmt::Debug for dyn DatabaseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DatabaseClient")
    }
}

/// A non-blocking database client handle owned by the cache.
#[async_trait]
pub trait AsyncDatabaseClient: Send + Sync {
    /// Releases every connection held by the client.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Close` if the driver reports a failure.
    async fn close(&self) -> Result<(), ClientError>;
}

impl fmt::Debug for dyn AsyncDatabaseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AsyncDatabaseClient")
    }
}
