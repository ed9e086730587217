use std::sync::Arc;

use async_trait::async_trait;
use tenantdb_config::{LocalSecretStore, PartitionServiceSettings};
use tenantdb_core::{
    AccessToken, ClientError, PartitionId, PartitionResolver, SecretStore, TokenCredential,
};
use tenantdb_partition::PartitionServiceClient;
use time::{Duration, OffsetDateTime};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct StaticCredential;

#[async_trait]
impl TokenCredential for StaticCredential {
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken, ClientError> {
        assert_eq!(scopes, ["api://partition/.default"]);
        Ok(AccessToken::new(
            "test-token",
            OffsetDateTime::now_utc() + Duration::hours(1),
        ))
    }
}

fn settings(server: &MockServer) -> PartitionServiceSettings {
    PartitionServiceSettings {
        url: format!("{}/api/partition/v1", server.uri()),
        timeout_ms: 2000,
        scope: None,
    }
}

fn pid(value: &str) -> PartitionId {
    PartitionId::new(value).unwrap()
}

async fn secret_store() -> Arc<dyn SecretStore> {
    let store = LocalSecretStore::new(None);
    store.insert_plaintext("t1-db-key", "k3y==").await;
    Arc::new(store)
}

#[tokio::test]
async fn resolves_endpoint_and_sensitive_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/partition/v1/partitions/t1"))
        .and(header("data-partition-id", "t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "database-endpoint": { "sensitive": false, "value": "https://t1.db" },
            "database-primary-key": { "sensitive": true, "value": "t1-db-key" },
            "name": { "sensitive": false, "value": "t1" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = PartitionServiceClient::new(&settings(&server), secret_store().await).unwrap();
    let info = client.resolve(&pid("t1")).await.unwrap();

    assert_eq!(info.endpoint, "https://t1.db");
    assert_eq!(info.primary_key.as_ref().map(|k| k.expose()), Some("k3y=="));
}

#[tokio::test]
async fn primary_key_is_optional() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/partition/v1/partitions/t2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "database-endpoint": { "value": "https://t2.db" }
        })))
        .mount(&server)
        .await;

    let client = PartitionServiceClient::new(&settings(&server), secret_store().await).unwrap();
    let info = client.resolve(&pid("t2")).await.unwrap();

    assert_eq!(info.endpoint, "https://t2.db");
    assert!(info.primary_key.is_none());
}

#[tokio::test]
async fn not_found_is_unknown_partition() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/partition/v1/partitions/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = PartitionServiceClient::new(&settings(&server), secret_store().await).unwrap();
    let err = client.resolve(&pid("ghost")).await.unwrap_err();

    assert!(err.is_unknown_partition());
    assert!(err.to_string().contains("ghost"));
}

#[tokio::test]
async fn server_error_is_partition_service_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = PartitionServiceClient::new(&settings(&server), secret_store().await).unwrap();
    let err = client.resolve(&pid("t1")).await.unwrap_err();

    assert!(matches!(err, ClientError::PartitionService { .. }));
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn missing_endpoint_property_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "database-primary-key": { "sensitive": false, "value": "k" }
        })))
        .mount(&server)
        .await;

    let client = PartitionServiceClient::new(&settings(&server), secret_store().await).unwrap();
    let err = client.resolve(&pid("t1")).await.unwrap_err();

    assert!(matches!(err, ClientError::PartitionService { .. }));
    assert!(err.to_string().contains("database-endpoint"));
}

#[tokio::test]
async fn unresolvable_secret_reference_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "database-endpoint": { "sensitive": false, "value": "https://t3.db" },
            "database-primary-key": { "sensitive": true, "value": "no-such-secret" }
        })))
        .mount(&server)
        .await;

    let client = PartitionServiceClient::new(&settings(&server), secret_store().await).unwrap();
    let err = client.resolve(&pid("t3")).await.unwrap_err();

    assert!(matches!(err, ClientError::SecretNotFound { .. }));
}

#[tokio::test]
async fn sends_bearer_token_when_scope_configured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/partition/v1/partitions/t1"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "database-endpoint": { "value": "https://t1.db" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = settings(&server);
    settings.scope = Some("api://partition/.default".into());
    let client = PartitionServiceClient::new(&settings, secret_store().await)
        .unwrap()
        .with_credential(Arc::new(StaticCredential));

    let info = client.resolve(&pid("t1")).await.unwrap();
    assert_eq!(info.endpoint, "https://t1.db");
}

#[tokio::test]
async fn endpoint_lookup_never_reads_the_key_secret() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/partition/v1/partitions/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "database-endpoint": { "sensitive": false, "value": "https://t1.db" },
            "database-primary-key": { "sensitive": true, "value": "t1-db-key" }
        })))
        .mount(&server)
        .await;

    // The key secret was never provisioned.
    let store: Arc<dyn SecretStore> = Arc::new(LocalSecretStore::new(None));
    let client = PartitionServiceClient::new(&settings(&server), store).unwrap();

    let info = client.resolve_endpoint(&pid("t1")).await.unwrap();
    assert_eq!(info.endpoint, "https://t1.db");
    assert!(info.primary_key.is_none());

    let err = client.resolve(&pid("t1")).await.unwrap_err();
    assert!(matches!(err, ClientError::SecretNotFound { ref name } if name == "t1-db-key"));
}

#[tokio::test]
async fn blank_primary_key_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/partition/v1/partitions/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "database-endpoint": { "sensitive": false, "value": "https://t1.db" },
            "database-primary-key": { "sensitive": true, "value": "t1-db-key" }
        })))
        .mount(&server)
        .await;

    let store = LocalSecretStore::new(None);
    store.insert_plaintext("t1-db-key", "").await;
    let client = PartitionServiceClient::new(&settings(&server), Arc::new(store)).unwrap();

    let err = client.resolve(&pid("t1")).await.unwrap_err();
    assert!(matches!(err, ClientError::EmptySecret { ref name } if name.contains("database-primary-key")));
}

#[tokio::test]
async fn blank_endpoint_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "database-endpoint": { "sensitive": false, "value": "   " }
        })))
        .mount(&server)
        .await;

    let client = PartitionServiceClient::new(&settings(&server), secret_store().await).unwrap();
    let err = client.resolve_endpoint(&pid("t1")).await.unwrap_err();

    assert!(matches!(err, ClientError::PartitionService { .. }));
}
