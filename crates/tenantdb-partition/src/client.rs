//! HTTP client for the partition-metadata service.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use tenantdb_config::PartitionServiceSettings;
use tenantdb_core::{
    ClientError, PartitionId, PartitionInfo, PartitionResolver, PrimaryKey, SecretStore,
    TokenCredential,
};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::properties::{ENDPOINT_PROPERTY, PRIMARY_KEY_PROPERTY, PartitionProperties};

/// Header carrying the partition the request is made on behalf of.
pub const DATA_PARTITION_HEADER: &str = "data-partition-id";

/// Resolves partitions by calling `GET {url}/partitions/{id}`.
///
/// Sensitive properties are secret names and are resolved through the
/// configured [`SecretStore`]. Nothing is cached here; callers that need
/// caching sit above this client.
pub struct PartitionServiceClient {
    /// HTTP client for fetching partition properties.
    http_client: reqwest::Client,
    /// Base URL of the partition API.
    base_url: Url,
    /// Store used for sensitive property values.
    secret_store: Arc<dyn SecretStore>,
    /// Credential for bearer tokens; requests are anonymous without it.
    credential: Option<Arc<dyn TokenCredential>>,
    /// Token scope requested from the credential.
    scope: Option<String>,
}

impl PartitionServiceClient {
    /// Creates a client from settings.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::PartitionService` if the URL is invalid or the
    /// HTTP client cannot be created.
    pub fn new(
        settings: &PartitionServiceSettings,
        secret_store: Arc<dyn SecretStore>,
    ) -> Result<Self, ClientError> {
        let base_url = Url::parse(&settings.url).map_err(|e| {
            ClientError::partition_service(format!(
                "Invalid partition service URL '{}': {e}",
                settings.url
            ))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::partition_service(format!(
                "Partition service URL '{}' cannot be a base URL",
                settings.url
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| {
                ClientError::partition_service(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            http_client,
            base_url,
            secret_store,
            credential: None,
            scope: settings.scope.clone(),
        })
    }

    /// Attaches a credential used to authenticate against the service.
    #[must_use]
    pub fn with_credential(mut self, credential: Arc<dyn TokenCredential>) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Builds `{base}/partitions/{id}`, percent-encoding the id.
    fn partition_url(&self, partition_id: &PartitionId) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("partitions")
                .push(partition_id.as_str());
        }
        url
    }

    /// Fetches the raw property bag for a partition.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::UnknownPartition` on 404 and
    /// `ClientError::PartitionService` for any other failure.
    #[instrument(skip(self), fields(partition_id = %partition_id))]
    pub async fn get_properties(
        &self,
        partition_id: &PartitionId,
    ) -> Result<PartitionProperties, ClientError> {
        let url = self.partition_url(partition_id);
        debug!(%url, "Fetching partition properties");

        let mut request = self
            .http_client
            .get(url.as_str())
            .header("Accept", "application/json")
            .header(DATA_PARTITION_HEADER, partition_id.as_str());

        if let (Some(credential), Some(scope)) = (&self.credential, &self.scope) {
            let token = credential.get_token(&[scope.as_str()]).await?;
            request = request.bearer_auth(token.token);
        }

        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Partition service request failed");
            ClientError::partition_service(e.to_string())
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::unknown_partition(partition_id.as_str()));
        }
        if !status.is_success() {
            return Err(ClientError::partition_service(format!(
                "Partition service returned HTTP {} for '{}'",
                status.as_u16(),
                partition_id
            )));
        }

        response.json::<PartitionProperties>().await.map_err(|e| {
            warn!(error = %e, "Malformed partition service response");
            ClientError::partition_service(format!("Invalid partition properties: {e}"))
        })
    }

    /// Returns the usable value of a property, resolving secret references.
    async fn property_value(
        &self,
        properties: &PartitionProperties,
        name: &str,
    ) -> Result<Option<String>, ClientError> {
        let Some(property) = properties.get(name) else {
            return Ok(None);
        };
        let Some(value) = property.as_text() else {
            return Ok(None);
        };
        if property.sensitive {
            return self.secret_store.get_secret(&value).await.map(Some);
        }
        Ok(Some(value))
    }

    /// The non-empty endpoint property of a partition.
    async fn endpoint(
        &self,
        partition_id: &PartitionId,
        properties: &PartitionProperties,
    ) -> Result<String, ClientError> {
        self.property_value(properties, ENDPOINT_PROPERTY)
            .await?
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                ClientError::partition_service(format!(
                    "Partition '{partition_id}' has no '{ENDPOINT_PROPERTY}' property"
                ))
            })
    }
}

#[async_trait]
impl PartitionResolver for PartitionServiceClient {
    async fn resolve(&self, partition_id: &PartitionId) -> Result<PartitionInfo, ClientError> {
        let properties = self.get_properties(partition_id).await?;
        let endpoint = self.endpoint(partition_id, &properties).await?;

        let primary_key = match self
            .property_value(&properties, PRIMARY_KEY_PROPERTY)
            .await?
        {
            Some(key) if key.trim().is_empty() => {
                return Err(ClientError::empty_secret(format!(
                    "{PRIMARY_KEY_PROPERTY} of partition '{partition_id}'"
                )));
            }
            key => key.map(PrimaryKey::new),
        };

        debug!(
            partition_id = %partition_id,
            endpoint = %endpoint,
            has_primary_key = primary_key.is_some(),
            "Resolved partition"
        );

        Ok(PartitionInfo {
            endpoint,
            primary_key,
        })
    }

    /// Skips the key property, so its secret is never requested.
    async fn resolve_endpoint(
        &self,
        partition_id: &PartitionId,
    ) -> Result<PartitionInfo, ClientError> {
        let properties = self.get_properties(partition_id).await?;
        let endpoint = self.endpoint(partition_id, &properties).await?;

        debug!(partition_id = %partition_id, endpoint = %endpoint, "Resolved partition endpoint");
        Ok(PartitionInfo::new(endpoint))
    }
}

impl std::fmt::Debug for PartitionServiceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartitionServiceClient")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.credential.is_some())
            .finish()
    }
}
