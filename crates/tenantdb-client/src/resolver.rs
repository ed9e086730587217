//! Gathers endpoint and authentication material for a new client.
//!
//! Tenant clients get their endpoint, and their key when one is needed, from
//! the partition resolver. The system client reads both from named secrets.
//! In both cases the identity flags are read at construction time, so
//! flipping them only affects clients built afterwards.

use std::sync::Arc;

use tenantdb_config::{IdentityConfig, SystemSettings};
use tenantdb_core::{
    ClientError, ClientResult, DirectConnectionConfig, PartitionId, PartitionResolver, PrimaryKey,
    SecretStore, ThrottlingRetryOptions, TokenCredential,
};
use tracing::{debug, instrument};

use crate::builder::{AuthMode, ClientBuilder, ClientOptions};

pub(crate) struct ConnectionResolver {
    pub(crate) partition_resolver: Arc<dyn PartitionResolver>,
    pub(crate) secret_store: Arc<dyn SecretStore>,
    pub(crate) credential: Option<Arc<dyn TokenCredential>>,
    pub(crate) identity: IdentityConfig,
    pub(crate) retry_options: ThrottlingRetryOptions,
    pub(crate) direct_mode: Option<DirectConnectionConfig>,
    pub(crate) system: SystemSettings,
}

impl ConnectionResolver {
    /// Options for a partition-scoped client. Calls the partition resolver
    /// once, and asks it for the primary key only for key-based auth.
    #[instrument(skip(self), fields(partition_id = %partition_id))]
    pub(crate) async fn tenant_options(
        &self,
        partition_id: &PartitionId,
    ) -> ClientResult<ClientOptions> {
        let (endpoint, auth) = if self.identity.is_identity_auth_enabled() {
            let info = self.partition_resolver.resolve_endpoint(partition_id).await?;
            (info.endpoint, self.identity_auth()?)
        } else {
            let info = self.partition_resolver.resolve(partition_id).await?;
            let key = info.primary_key.ok_or_else(|| {
                ClientError::invalid_options(format!(
                    "partition '{partition_id}' has no primary key and identity auth is disabled"
                ))
            })?;
            if key.expose().trim().is_empty() {
                return Err(ClientError::empty_secret(format!(
                    "primary key of partition '{partition_id}'"
                )));
            }
            (info.endpoint, AuthMode::Key(key))
        };

        debug!(endpoint = %endpoint, identity = auth.is_identity(), "Resolved tenant connection");
        self.builder(endpoint, auth).build_options()
    }

    /// Options for the system client. The key secret is only read for
    /// key-based auth.
    #[instrument(skip(self))]
    pub(crate) async fn system_options(&self) -> ClientResult<ClientOptions> {
        let endpoint = self.secret(&self.system.endpoint_secret_name).await?;

        let auth = if self.identity.is_identity_auth_enabled() {
            self.identity_auth()?
        } else {
            let key = self.secret(&self.system.primary_key_secret_name).await?;
            AuthMode::Key(PrimaryKey::new(key))
        };

        debug!(endpoint = %endpoint, identity = auth.is_identity(), "Resolved system connection");
        self.builder(endpoint, auth).build_options()
    }

    fn identity_auth(&self) -> ClientResult<AuthMode> {
        self.credential
            .clone()
            .map(AuthMode::Identity)
            .ok_or_else(|| {
                ClientError::invalid_options("identity auth is enabled but no credential is set")
            })
    }

    /// Reads a secret, rejecting blank values.
    async fn secret(&self, name: &str) -> ClientResult<String> {
        let value = self.secret_store.get_secret(name).await?;
        if value.trim().is_empty() {
            return Err(ClientError::empty_secret(name));
        }
        Ok(value)
    }

    fn builder(&self, endpoint: String, auth: AuthMode) -> ClientBuilder {
        let builder = ClientBuilder::new()
            .endpoint(endpoint)
            .auth(auth)
            .throttling_retry_options(self.retry_options.clone());
        match &self.direct_mode {
            Some(direct) => builder.direct_mode(direct.clone()),
            None => builder,
        }
    }
}

impl std::fmt::Debug for ConnectionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionResolver")
            .field("identity", &self.identity.settings())
            .field("has_credential", &self.credential.is_some())
            .field("retry_options", &self.retry_options)
            .field("direct_mode", &self.direct_mode)
            .field("system", &self.system)
            .finish()
    }
}
