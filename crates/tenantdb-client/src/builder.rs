//! Client builder adapter.
//!
//! [`ClientBuilder`] collects everything a driver needs to create a client and
//! hands the result to a [`ClientFactory`]. Authentication is one
//! [`AuthMode`], so a builder can never carry both a credential and a key.

use std::fmt;
use std::sync::Arc;

use tenantdb_core::{
    ClientError, ClientResult, DirectConnectionConfig, DynAsyncClient, DynClient, PrimaryKey,
    ThrottlingRetryOptions, TokenCredential,
};

use crate::factory::ClientFactory;

/// How a client authenticates against its database account.
#[derive(Clone)]
pub enum AuthMode {
    /// Platform-issued credential (managed or workload identity).
    Identity(Arc<dyn TokenCredential>),
    /// Shared account key.
    Key(PrimaryKey),
}

impl AuthMode {
    pub fn is_identity(&self) -> bool {
        matches!(self, Self::Identity(_))
    }

    /// The account key, if key-based.
    pub fn primary_key(&self) -> Option<&PrimaryKey> {
        match self {
            Self::Key(key) => Some(key),
            Self::Identity(_) => None,
        }
    }
}

impl fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity(_) => f.write_str("Identity"),
            Self::Key(key) => f.debug_tuple("Key").field(key).finish(),
        }
    }
}

/// Validated input for a [`ClientFactory`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub endpoint: String,
    pub auth: AuthMode,
    pub throttling_retry_options: ThrottlingRetryOptions,
    /// `None` keeps the driver's default connection mode.
    pub direct_mode: Option<DirectConnectionConfig>,
}

impl ClientOptions {
    pub fn is_direct_mode(&self) -> bool {
        self.direct_mode.is_some()
    }
}

/// Consuming builder for [`ClientOptions`].
///
/// # Example
///
/// ```
/// use tenantdb_client::ClientBuilder;
/// use tenantdb_core::{DirectConnectionConfig, PrimaryKey};
///
/// let options = ClientBuilder::new()
///     .endpoint("https://tenant1.db.local")
///     .key(PrimaryKey::new("k3y=="))
///     .direct_mode(DirectConnectionConfig::default().with_max_connections_per_endpoint(10))
///     .build_options()
///     .unwrap();
///
/// assert!(!options.auth.is_identity());
/// assert_eq!(options.direct_mode.unwrap().max_connections_per_endpoint, 10);
/// ```
#[derive(Debug, Default)]
pub struct ClientBuilder {
    endpoint: Option<String>,
    auth: Option<AuthMode>,
    throttling_retry_options: ThrottlingRetryOptions,
    direct_mode: Option<DirectConnectionConfig>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Authenticate with a credential. Replaces any key set earlier.
    pub fn credential(self, credential: Arc<dyn TokenCredential>) -> Self {
        self.auth(AuthMode::Identity(credential))
    }

    /// Authenticate with an account key. Replaces any credential set earlier.
    pub fn key(self, key: PrimaryKey) -> Self {
        self.auth(AuthMode::Key(key))
    }

    pub fn auth(mut self, auth: AuthMode) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn throttling_retry_options(mut self, options: ThrottlingRetryOptions) -> Self {
        self.throttling_retry_options = options;
        self
    }

    /// Switch to direct connection mode with the given tuning.
    pub fn direct_mode(mut self, config: DirectConnectionConfig) -> Self {
        self.direct_mode = Some(config);
        self
    }

    /// Validates the collected values.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidOptions` if the endpoint is missing or
    /// blank, or no authentication was chosen.
    pub fn build_options(self) -> ClientResult<ClientOptions> {
        let endpoint = self
            .endpoint
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| ClientError::invalid_options("endpoint is required"))?;
        let auth = self.auth.ok_or_else(|| {
            ClientError::invalid_options("either a credential or a key is required")
        })?;
        if let Some(direct) = &self.direct_mode
            && direct.max_connections_per_endpoint == 0
        {
            return Err(ClientError::invalid_options(
                "max_connections_per_endpoint must be > 0",
            ));
        }

        Ok(ClientOptions {
            endpoint,
            auth,
            throttling_retry_options: self.throttling_retry_options,
            direct_mode: self.direct_mode,
        })
    }

    /// Builds a blocking client through `factory`.
    ///
    /// # Errors
    ///
    /// Returns validation errors from [`Self::build_options`] and anything
    /// the factory reports.
    pub async fn build_client(self, factory: &dyn ClientFactory) -> ClientResult<DynClient> {
        factory.build_client(self.build_options()?).await
    }

    /// Builds a non-blocking client through `factory`.
    ///
    /// # Errors
    ///
    /// Returns validation errors from [`Self::build_options`] and anything
    /// the factory reports.
    pub async fn build_async_client(
        self,
        factory: &dyn ClientFactory,
    ) -> ClientResult<DynAsyncClient> {
        factory.build_async_client(self.build_options()?).await
    }
}
