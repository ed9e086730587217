//! Cache keys for constructed clients.

use std::fmt;

use crate::partition::PartitionId;

/// The flavour of client handle stored under a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientKind {
    /// Blocking client; operations run on the calling thread.
    Sync,
    /// Non-blocking client; operations return futures.
    Async,
}

impl ClientKind {
    /// Suffix used when rendering a tenant key.
    #[must_use]
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Sync => "client",
            Self::Async => "asyncClient",
        }
    }
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync => write!(f, "sync"),
            Self::Async => write!(f, "async"),
        }
    }
}

/// Key under which a constructed client is cached.
///
/// Tenant keys are derived from `(PartitionId, ClientKind)`. The system client
/// lives under [`CacheKey::System`], which no tenant key can equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// A client scoped to one partition.
    Partition {
        /// Owning partition.
        partition_id: PartitionId,
        /// Client flavour.
        kind: ClientKind,
    },
    /// The client for shared, cross-tenant resources.
    System,
}

impl CacheKey {
    /// Derives the key for a partition-scoped client.
    #[must_use]
    pub fn partition(partition_id: PartitionId, kind: ClientKind) -> Self {
        Self::Partition { partition_id, kind }
    }

    /// Returns the owning partition, or `None` for the system key.
    #[must_use]
    pub fn partition_id(&self) -> Option<&PartitionId> {
        match self {
            Self::Partition { partition_id, .. } => Some(partition_id),
            Self::System => None,
        }
    }

    /// Returns `true` for the reserved system key.
    #[must_use]
    pub fn is_system(&self) -> bool {
        matches!(self, Self::System)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Partition { partition_id, kind } => {
                write!(f, "{}-{}", partition_id, kind.suffix())
            }
            Self::System => write!(f, "<system>"),
        }
    }
}
