#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tenantdb_client::{ClientCache, ClientCacheBuilder, ClientFactory, ClientOptions};
use tenantdb_config::IdentityConfig;
use tenantdb_core::{
    AccessToken, AsyncDatabaseClient, ClientError, ClientResult, DatabaseClient, DynAsyncClient,
    DynClient, PartitionId, PartitionInfo, PartitionResolver, SecretStore, TokenCredential,
};
use time::OffsetDateTime;
use tokio::sync::Notify;

pub const SYSTEM_ENDPOINT: &str = "https://system.db";

pub fn tenant_endpoint(partition: &str) -> String {
    format!("https://{partition}.db")
}

pub fn tenant_key(partition: &str) -> String {
    format!("{partition}-key")
}

/// Resolves any partition not listed as unknown; counts every call.
///
/// `calls` counts both lookup flavours; `key_lookups` only the ones that
/// asked for the primary key.
#[derive(Default)]
pub struct CountingResolver {
    calls: AtomicUsize,
    key_lookups: AtomicUsize,
    keys: Mutex<HashMap<String, String>>,
    per_partition: Mutex<HashMap<String, usize>>,
    unknown: Mutex<HashSet<String>>,
    without_key: Mutex<HashSet<String>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl CountingResolver {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, partition: &str) -> usize {
        self.per_partition
            .lock()
            .unwrap()
            .get(partition)
            .copied()
            .unwrap_or(0)
    }

    pub fn key_lookups(&self) -> usize {
        self.key_lookups.load(Ordering::SeqCst)
    }

    /// Overrides the primary key returned for `partition`.
    pub fn set_key(&self, partition: &str, key: &str) {
        self.keys
            .lock()
            .unwrap()
            .insert(partition.to_string(), key.to_string());
    }

    pub fn mark_unknown(&self, partition: &str) {
        self.unknown.lock().unwrap().insert(partition.to_string());
    }

    pub fn mark_without_key(&self, partition: &str) {
        self.without_key.lock().unwrap().insert(partition.to_string());
    }

    /// Makes resolution of `partition` wait until the returned gate is notified.
    pub fn gate(&self, partition: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(partition.to_string(), Arc::clone(&gate));
        gate
    }
}

impl CountingResolver {
    async fn lookup(&self, id: &str) -> Result<PartitionInfo, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .per_partition
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_default() += 1;

        let gate = self.gates.lock().unwrap().get(id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.unknown.lock().unwrap().contains(id) {
            return Err(ClientError::unknown_partition(id));
        }
        Ok(PartitionInfo::new(tenant_endpoint(id)))
    }
}

#[async_trait]
impl PartitionResolver for CountingResolver {
    async fn resolve(&self, partition_id: &PartitionId) -> Result<PartitionInfo, ClientError> {
        let id = partition_id.as_str();
        let info = self.lookup(id).await?;
        self.key_lookups.fetch_add(1, Ordering::SeqCst);

        if self.without_key.lock().unwrap().contains(id) {
            return Ok(info);
        }
        let key = self
            .keys
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_else(|| tenant_key(id));
        Ok(info.with_primary_key(key))
    }

    async fn resolve_endpoint(
        &self,
        partition_id: &PartitionId,
    ) -> Result<PartitionInfo, ClientError> {
        self.lookup(partition_id.as_str()).await
    }
}

/// In-memory secrets that remember which names were requested.
pub struct RecordingSecretStore {
    values: Mutex<HashMap<String, String>>,
    requested: Mutex<Vec<String>>,
}

impl RecordingSecretStore {
    pub fn with_system_secrets() -> Self {
        let store = Self {
            values: Mutex::new(HashMap::new()),
            requested: Mutex::new(Vec::new()),
        };
        store.set("system-db-endpoint", SYSTEM_ENDPOINT);
        store.set("system-db-primary-key", "system-key");
        store
    }

    pub fn set(&self, name: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(name.to_string(), value.to_string());
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl SecretStore for RecordingSecretStore {
    async fn get_secret(&self, name: &str) -> Result<String, ClientError> {
        self.requested.lock().unwrap().push(name.to_string());
        self.values
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| ClientError::secret_not_found(name))
    }
}

/// Credential that counts token requests.
#[derive(Default)]
pub struct TestCredential {
    pub token_requests: AtomicUsize,
}

#[async_trait]
impl TokenCredential for TestCredential {
    async fn get_token(&self, _scopes: &[&str]) -> Result<AccessToken, ClientError> {
        self.token_requests.fetch_add(1, Ordering::SeqCst);
        Ok(AccessToken::new(
            "token",
            OffsetDateTime::now_utc() + time::Duration::hours(1),
        ))
    }
}

pub struct MockClient {
    pub endpoint: String,
    pub closes: AtomicUsize,
    fail_close: bool,
}

impl DatabaseClient for MockClient {
    fn close(&self) -> Result<(), ClientError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(ClientError::close(format!("{} refused to close", self.endpoint)));
        }
        Ok(())
    }
}

pub struct MockAsyncClient {
    pub endpoint: String,
    pub closes: AtomicUsize,
    fail_close: bool,
}

#[async_trait]
impl AsyncDatabaseClient for MockAsyncClient {
    async fn close(&self) -> Result<(), ClientError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(ClientError::close(format!("{} refused to close", self.endpoint)));
        }
        Ok(())
    }
}

/// Factory that records every `ClientOptions` it receives.
#[derive(Default)]
pub struct RecordingFactory {
    options: Mutex<Vec<ClientOptions>>,
    clients: Mutex<Vec<Arc<MockClient>>>,
    async_clients: Mutex<Vec<Arc<MockAsyncClient>>>,
    fail_next: AtomicUsize,
    fail_endpoints: Mutex<HashSet<String>>,
    fail_close_endpoints: Mutex<HashSet<String>>,
    delay: Mutex<Option<Duration>>,
}

impl RecordingFactory {
    pub fn builds(&self) -> usize {
        self.options.lock().unwrap().len()
    }

    pub fn options(&self) -> Vec<ClientOptions> {
        self.options.lock().unwrap().clone()
    }

    pub fn last_options(&self) -> ClientOptions {
        self.options
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no client was built")
    }

    pub fn fail_next_builds(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    pub fn fail_endpoint(&self, endpoint: &str) {
        self.fail_endpoints
            .lock()
            .unwrap()
            .insert(endpoint.to_string());
    }

    pub fn fail_close_for(&self, endpoint: &str) {
        self.fail_close_endpoints
            .lock()
            .unwrap()
            .insert(endpoint.to_string());
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Close calls seen by every client built for `endpoint`.
    pub fn closes_for(&self, endpoint: &str) -> usize {
        let sync: usize = self
            .clients
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.endpoint == endpoint)
            .map(|c| c.closes.load(Ordering::SeqCst))
            .sum();
        let non_blocking: usize = self
            .async_clients
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.endpoint == endpoint)
            .map(|c| c.closes.load(Ordering::SeqCst))
            .sum();
        sync + non_blocking
    }

    async fn record(&self, options: &ClientOptions) -> ClientResult<bool> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.options.lock().unwrap().push(options.clone());

        let injected = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected || self.fail_endpoints.lock().unwrap().contains(&options.endpoint) {
            return Err(ClientError::construction(format!(
                "driver rejected {}",
                options.endpoint
            )));
        }
        Ok(self
            .fail_close_endpoints
            .lock()
            .unwrap()
            .contains(&options.endpoint))
    }
}

#[async_trait]
impl ClientFactory for RecordingFactory {
    async fn build_client(&self, options: ClientOptions) -> ClientResult<DynClient> {
        let fail_close = self.record(&options).await?;
        let client = Arc::new(MockClient {
            endpoint: options.endpoint,
            closes: AtomicUsize::new(0),
            fail_close,
        });
        self.clients.lock().unwrap().push(Arc::clone(&client));
        Ok(client)
    }

    async fn build_async_client(&self, options: ClientOptions) -> ClientResult<DynAsyncClient> {
        let fail_close = self.record(&options).await?;
        let client = Arc::new(MockAsyncClient {
            endpoint: options.endpoint,
            closes: AtomicUsize::new(0),
            fail_close,
        });
        self.async_clients.lock().unwrap().push(Arc::clone(&client));
        Ok(client)
    }
}

/// All collaborators of one cache, kept around for assertions.
pub struct Harness {
    pub resolver: Arc<CountingResolver>,
    pub secrets: Arc<RecordingSecretStore>,
    pub credential: Arc<TestCredential>,
    pub factory: Arc<RecordingFactory>,
    pub identity: IdentityConfig,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            resolver: Arc::new(CountingResolver::default()),
            secrets: Arc::new(RecordingSecretStore::with_system_secrets()),
            credential: Arc::new(TestCredential::default()),
            factory: Arc::new(RecordingFactory::default()),
            identity: IdentityConfig::disabled(),
        }
    }

    /// Builder with every collaborator wired in.
    pub fn builder(&self) -> ClientCacheBuilder {
        ClientCache::builder()
            .partition_resolver(self.resolver.clone())
            .secret_store(self.secrets.clone())
            .credential(self.credential.clone())
            .factory(self.factory.clone())
            .identity(self.identity.clone())
    }

    /// An initialized cache with default configuration.
    pub fn cache(&self) -> ClientCache {
        let cache = self.builder().build().expect("cache builds");
        cache.initialize();
        cache
    }
}
