//! # tenantdb-client
//!
//! A cache of database clients keyed by data partition.
//!
//! - [`ClientCache`]: builds at most one client per `(partition, kind)` and
//!   one system client, then closes them all on [`ClientCache::shutdown`]
//! - [`ClientBuilder`] / [`ClientOptions`] / [`AuthMode`]: what a client is
//!   built from
//! - [`ClientFactory`]: the seam to the database driver
//! - [`OnceMap`]: the construct-once concurrent map underneath the cache
//!
//! Authentication is chosen per construction from [`tenantdb_config::IdentityConfig`]:
//! identity-based clients get the configured credential, key-based clients
//! get the partition's (or system account's) primary key.

mod builder;
mod cache;
mod factory;
mod once_map;
mod resolver;

pub use builder::{AuthMode, ClientBuilder, ClientOptions};
pub use cache::{ClientCache, ClientCacheBuilder, ShutdownReport};
pub use factory::ClientFactory;
pub use once_map::OnceMap;
