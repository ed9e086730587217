//! The per-tenant client cache and its lifecycle.

use std::future::Future;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tenantdb_config::{IdentityConfig, Settings, SystemSettings};
use tenantdb_core::{
    CacheKey, ClientError, ClientKind, ClientResult, DirectConnectionConfig, DynAsyncClient,
    DynClient, IntoPartitionId, PartitionResolver, SecretStore, ThrottlingRetryOptions,
    TokenCredential,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::factory::ClientFactory;
use crate::once_map::OnceMap;
use crate::resolver::ConnectionResolver;

/// Both client maps. Swapped in by `initialize` and out by `shutdown`.
#[derive(Debug, Default)]
struct ClientMaps {
    /// Blocking clients, including the system client.
    clients: OnceMap<CacheKey, DynClient>,
    async_clients: OnceMap<CacheKey, DynAsyncClient>,
}

/// Outcome of [`ClientCache::shutdown`].
#[derive(Debug, Default)]
pub struct ShutdownReport {
    /// Clients closed successfully.
    pub closed: usize,
    /// Slots whose construction was still in flight.
    pub skipped: usize,
    /// Clients whose `close` failed, with the key they were cached under.
    pub failed: Vec<(CacheKey, ClientError)>,
}

impl ShutdownReport {
    /// `true` when every client closed without error.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Hands out one database client per partition and client kind.
///
/// A client is built on first request and reused for the life of the cache.
/// Concurrent first requests for the same key share a single construction;
/// requests for different keys never wait on each other.
///
/// # Example
///
/// ```ignore
/// let cache = ClientCache::builder()
///     .settings(&settings)
///     .partition_resolver(resolver)
///     .secret_store(secrets)
///     .factory(driver)
///     .build()?;
/// cache.initialize();
///
/// let client = cache.get_client("opendes").await?;
/// // ...
/// let report = cache.shutdown().await;
/// ```
pub struct ClientCache {
    maps: ArcSwapOption<ClientMaps>,
    resolver: ConnectionResolver,
    factory: Arc<dyn ClientFactory>,
}

impl ClientCache {
    pub fn builder() -> ClientCacheBuilder {
        ClientCacheBuilder::default()
    }

    /// Installs empty maps. Calling it again while running is a no-op.
    pub fn initialize(&self) {
        let previous = self
            .maps
            .rcu(|current| current.clone().or_else(|| Some(Arc::new(ClientMaps::default()))));
        if previous.is_none() {
            info!("Client cache initialized");
        } else {
            debug!("Client cache already initialized");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.maps.load().is_some()
    }

    fn maps(&self) -> ClientResult<Arc<ClientMaps>> {
        self.maps.load_full().ok_or(ClientError::NotInitialized)
    }

    /// Returns the blocking client for a partition, building it on first use.
    ///
    /// # Errors
    ///
    /// - `MissingArgument` / `EmptyArgument` for an absent or empty id,
    ///   before anything else is touched
    /// - `NotInitialized` before [`Self::initialize`] or after
    ///   [`Self::shutdown`]
    /// - any resolution or construction error, unchanged; the key stays
    ///   free so a later call can retry
    pub async fn get_client(&self, partition_id: impl IntoPartitionId) -> ClientResult<DynClient> {
        let partition_id = partition_id.into_partition_id()?;
        let maps = self.maps()?;
        let key = CacheKey::partition(partition_id.clone(), ClientKind::Sync);

        get_or_construct(&maps.clients, key, async move {
            let options = self.resolver.tenant_options(&partition_id).await?;
            self.factory.build_client(options).await
        })
        .await
    }

    /// Returns the non-blocking client for a partition, building it on first use.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get_client`].
    pub async fn get_async_client(
        &self,
        partition_id: impl IntoPartitionId,
    ) -> ClientResult<DynAsyncClient> {
        let partition_id = partition_id.into_partition_id()?;
        let maps = self.maps()?;
        let key = CacheKey::partition(partition_id.clone(), ClientKind::Async);

        get_or_construct(&maps.async_clients, key, async move {
            let options = self.resolver.tenant_options(&partition_id).await?;
            self.factory.build_async_client(options).await
        })
        .await
    }

    /// Returns the client for shared, cross-tenant resources.
    ///
    /// # Errors
    ///
    /// `NotInitialized`, secret resolution errors (including `EmptySecret`
    /// for a blank value) and construction errors.
    pub async fn get_system_client(&self) -> ClientResult<DynClient> {
        let maps = self.maps()?;

        get_or_construct(&maps.clients, CacheKey::System, async move {
            let options = self.resolver.system_options().await?;
            self.factory.build_client(options).await
        })
        .await
    }

    /// Constructed blocking clients, including the system client.
    pub fn client_count(&self) -> usize {
        self.maps
            .load()
            .as_ref()
            .map_or(0, |maps| maps.clients.len())
    }

    /// Constructed non-blocking clients.
    pub fn async_client_count(&self) -> usize {
        self.maps
            .load()
            .as_ref()
            .map_or(0, |maps| maps.async_clients.len())
    }

    /// Shared view of the identity flags this cache reads.
    pub fn identity(&self) -> &IdentityConfig {
        &self.resolver.identity
    }

    /// Closes every cached client and discards both maps.
    ///
    /// Never fails: slots still under construction are skipped and close
    /// errors are logged and collected in the report. Calling it on a cache
    /// that was never initialized, or twice, returns an empty report.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> ShutdownReport {
        let mut report = ShutdownReport::default();
        let Some(maps) = self.maps.swap(None) else {
            debug!("Client cache not initialized; nothing to close");
            return report;
        };

        for (key, client) in maps.clients.drain() {
            match client {
                Some(client) => match client.close() {
                    Ok(()) => {
                        debug!(%key, "Closed client");
                        report.closed += 1;
                    }
                    Err(error) => {
                        warn!(%key, %error, "Failed to close client");
                        report.failed.push((key, error));
                    }
                },
                None => {
                    debug!(%key, "Skipping client still under construction");
                    report.skipped += 1;
                }
            }
        }

        for (key, client) in maps.async_clients.drain() {
            match client {
                Some(client) => match client.close().await {
                    Ok(()) => {
                        debug!(%key, "Closed async client");
                        report.closed += 1;
                    }
                    Err(error) => {
                        warn!(%key, %error, "Failed to close async client");
                        report.failed.push((key, error));
                    }
                },
                None => {
                    debug!(%key, "Skipping async client still under construction");
                    report.skipped += 1;
                }
            }
        }

        info!(
            closed = report.closed,
            skipped = report.skipped,
            failed = report.failed.len(),
            "Client cache shut down"
        );
        report
    }
}

impl std::fmt::Debug for ClientCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCache")
            .field("initialized", &self.is_initialized())
            .field("clients", &self.client_count())
            .field("async_clients", &self.async_client_count())
            .field("resolver", &self.resolver)
            .finish()
    }
}

/// Cache lookup with construct-once on miss. `construct` is only polled when
/// this caller wins the slot.
async fn get_or_construct<V, Fut>(
    map: &OnceMap<CacheKey, V>,
    key: CacheKey,
    construct: Fut,
) -> ClientResult<V>
where
    V: Clone,
    Fut: Future<Output = ClientResult<V>>,
{
    if let Some(client) = map.get(&key) {
        trace!(%key, "Client cache hit");
        return Ok(client);
    }

    map.get_or_try_init(key.clone(), || async {
        debug!(%key, "Constructing client");
        match construct.await {
            Ok(client) => {
                info!(%key, "Client constructed");
                Ok(client)
            }
            Err(error) => {
                warn!(%key, %error, "Client construction failed");
                Err(error)
            }
        }
    })
    .await
}

/// Wires collaborators and configuration into a [`ClientCache`].
#[derive(Default)]
pub struct ClientCacheBuilder {
    partition_resolver: Option<Arc<dyn PartitionResolver>>,
    secret_store: Option<Arc<dyn SecretStore>>,
    credential: Option<Arc<dyn TokenCredential>>,
    factory: Option<Arc<dyn ClientFactory>>,
    identity: IdentityConfig,
    retry_options: ThrottlingRetryOptions,
    direct_mode: Option<DirectConnectionConfig>,
    system: SystemSettings,
}

impl ClientCacheBuilder {
    /// Takes identity flags, retry policy, connection mode and system secret
    /// names from loaded settings.
    ///
    /// The identity flags are copied into a fresh [`IdentityConfig`]; call
    /// [`Self::identity`] afterwards to share an existing one instead.
    pub fn settings(mut self, settings: &Settings) -> Self {
        self.identity = IdentityConfig::new(settings.identity);
        self.retry_options = settings.retry.throttling_retry_options();
        self.direct_mode = settings.connection.direct_connection_config();
        self.system = settings.system.clone();
        self
    }

    pub fn partition_resolver(mut self, resolver: Arc<dyn PartitionResolver>) -> Self {
        self.partition_resolver = Some(resolver);
        self
    }

    pub fn secret_store(mut self, store: Arc<dyn SecretStore>) -> Self {
        self.secret_store = Some(store);
        self
    }

    /// Credential bound to clients while identity auth is enabled.
    pub fn credential(mut self, credential: Arc<dyn TokenCredential>) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn factory(mut self, factory: Arc<dyn ClientFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn identity(mut self, identity: IdentityConfig) -> Self {
        self.identity = identity;
        self
    }

    pub fn throttling_retry_options(mut self, options: ThrottlingRetryOptions) -> Self {
        self.retry_options = options;
        self
    }

    /// `Some(n)` enables direct mode with `n` connections per endpoint;
    /// `None` keeps the driver default.
    pub fn max_connections_per_endpoint(mut self, max: Option<u32>) -> Self {
        self.direct_mode =
            max.map(|n| DirectConnectionConfig::default().with_max_connections_per_endpoint(n));
        self
    }

    pub fn direct_mode(mut self, config: DirectConnectionConfig) -> Self {
        self.direct_mode = Some(config);
        self
    }

    /// Names of the secrets holding the system endpoint and key.
    pub fn system_secret_names(
        mut self,
        endpoint_secret_name: impl Into<String>,
        primary_key_secret_name: impl Into<String>,
    ) -> Self {
        self.system = SystemSettings {
            endpoint_secret_name: endpoint_secret_name.into(),
            primary_key_secret_name: primary_key_secret_name.into(),
        };
        self
    }

    /// Builds the cache. It still needs [`ClientCache::initialize`].
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidOptions` if the partition resolver,
    /// secret store or factory is missing.
    pub fn build(self) -> ClientResult<ClientCache> {
        let partition_resolver = self
            .partition_resolver
            .ok_or_else(|| ClientError::invalid_options("a partition resolver is required"))?;
        let secret_store = self
            .secret_store
            .ok_or_else(|| ClientError::invalid_options("a secret store is required"))?;
        let factory = self
            .factory
            .ok_or_else(|| ClientError::invalid_options("a client factory is required"))?;

        Ok(ClientCache {
            maps: ArcSwapOption::empty(),
            resolver: ConnectionResolver {
                partition_resolver,
                secret_store,
                credential: self.credential,
                identity: self.identity,
                retry_options: self.retry_options,
                direct_mode: self.direct_mode,
                system: self.system,
            },
            factory,
        })
    }
}
