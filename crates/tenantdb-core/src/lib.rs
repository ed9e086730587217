//! # tenantdb-core
//!
//! Shared types for the tenantdb multi-tenant client cache.
//!
//! This crate defines the data model and the collaborator traits the cache
//! talks to. Implementations live in the other workspace crates.
//!
//! ## Overview
//!
//! - [`PartitionId`]: validated tenant identifier
//! - [`CacheKey`]: `(partition, kind)` or the reserved system key
//! - [`PartitionResolver`], [`SecretStore`], [`TokenCredential`]: lookups
//!   performed while constructing a client
//! - [`DatabaseClient`], [`AsyncDatabaseClient`]: the handles being cached
//!
//! ## Example
//!
//! ```
//! use tenantdb_core::{CacheKey, ClientKind, IntoPartitionId};
//!
//! let partition = "opendes".into_partition_id().unwrap();
//! let key = CacheKey::partition(partition, ClientKind::Async);
//! assert_eq!(key.to_string(), "opendes-asyncClient");
//! ```

mod error;
mod key;
mod options;
mod partition;
mod traits;

pub use error::{ClientError, ErrorCategory};
pub use key::{CacheKey, ClientKind};
pub use options::{DirectConnectionConfig, ThrottlingRetryOptions};
pub use partition::{DATA_PARTITION_ID, IntoPartitionId, PartitionId, PartitionInfo, PrimaryKey};
pub use traits::{
    AccessToken, AsyncDatabaseClient, DatabaseClient, PartitionResolver, SecretStore,
    TokenCredential,
};

/// Type alias for a client operation result.
pub type ClientResult<T> = Result<T, ClientError>;

/// Type alias for a cached blocking client handle.
pub type DynClient = std::sync::Arc<dyn DatabaseClient>;

/// Type alias for a cached non-blocking client handle.
pub type DynAsyncClient = std::sync::Arc<dyn AsyncDatabaseClient>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use tenantdb_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ClientError, ErrorCategory};
    pub use crate::key::{CacheKey, ClientKind};
    pub use crate::options::{DirectConnectionConfig, ThrottlingRetryOptions};
    pub use crate::partition::{IntoPartitionId, PartitionId, PartitionInfo, PrimaryKey};
    pub use crate::traits::{
        AccessToken, AsyncDatabaseClient, DatabaseClient, PartitionResolver, SecretStore,
        TokenCredential,
    };
    pub use crate::{ClientResult, DynAsyncClient, DynClient};
}
