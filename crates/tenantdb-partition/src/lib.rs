//! Partition-metadata client for the tenantdb client cache.
//!
//! [`PartitionServiceClient`] implements [`tenantdb_core::PartitionResolver`]
//! against the partition HTTP API. Each partition is described by a property
//! bag; the cache needs two of those properties:
//!
//! - [`ENDPOINT_PROPERTY`]: the tenant's database endpoint
//! - [`PRIMARY_KEY_PROPERTY`]: the tenant's account key (optional)
//!
//! Properties marked `sensitive` carry a secret name that is looked up in the
//! configured [`tenantdb_core::SecretStore`].

pub mod client;
pub mod properties;

pub use client::{DATA_PARTITION_HEADER, PartitionServiceClient};
pub use properties::{
    ENDPOINT_PROPERTY, PRIMARY_KEY_PROPERTY, PartitionProperties, PartitionProperty,
};
