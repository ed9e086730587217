//! Error types for client cache operations.
//!
//! Every failure a caller of the cache can observe is a [`ClientError`].
//! Collaborator failures (partition metadata, secret store, driver) are
//! surfaced unchanged through the matching variant.

use std::fmt;

/// Errors that can occur while resolving, constructing or closing clients.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A required argument was not supplied.
    #[error("{name} cannot be null")]
    MissingArgument {
        /// Name of the missing argument.
        name: &'static str,
    },

    /// A required argument was supplied but empty.
    #[error("{name} cannot be empty")]
    EmptyArgument {
        /// Name of the empty argument.
        name: &'static str,
    },

    /// The partition-metadata service does not know the partition.
    #[error("Unknown partition: {partition_id}")]
    UnknownPartition {
        /// The partition that could not be resolved.
        partition_id: String,
    },

    /// The partition-metadata service failed or returned unusable data.
    #[error("Partition service error: {message}")]
    PartitionService {
        /// Description of the failure.
        message: String,
    },

    /// A named secret does not exist in the secret store.
    #[error("Secret not found: {name}")]
    SecretNotFound {
        /// Name of the secret.
        name: String,
    },

    /// A named secret exists but holds an empty value.
    #[error("Secret is empty: {name}")]
    EmptySecret {
        /// Name of the secret.
        name: String,
    },

    /// The secret store itself failed.
    #[error("Secret store error: {message}")]
    SecretStore {
        /// Description of the failure.
        message: String,
    },

    /// The credential provider could not produce a token.
    #[error("Credential error: {message}")]
    Credential {
        /// Description of the failure.
        message: String,
    },

    /// Client options are incomplete (no endpoint or no authentication).
    #[error("Invalid client options: {message}")]
    InvalidOptions {
        /// Description of what is missing.
        message: String,
    },

    /// The driver rejected the configuration while building a client.
    #[error("Client construction failed: {message}")]
    Construction {
        /// Description of the failure.
        message: String,
    },

    /// Closing a client failed.
    #[error("Failed to close client: {message}")]
    Close {
        /// Description of the failure.
        message: String,
    },

    /// The cache is not between `initialize()` and `shutdown()`.
    #[error("Client cache is not initialized")]
    NotInitialized,
}

impl ClientError {
    /// Creates a new `MissingArgument` error.
    #[must_use]
    pub fn missing_argument(name: &'static str) -> Self {
        Self::MissingArgument { name }
    }

    /// Creates a new `EmptyArgument` error.
    #[must_use]
    pub fn empty_argument(name: &'static str) -> Self {
        Self::EmptyArgument { name }
    }

    /// Creates a new `UnknownPartition` error.
    #[must_use]
    pub fn unknown_partition(partition_id: impl Into<String>) -> Self {
        Self::UnknownPartition {
            partition_id: partition_id.into(),
        }
    }

    /// Creates a new `PartitionService` error.
    #[must_use]
    pub fn partition_service(message: impl Into<String>) -> Self {
        Self::PartitionService {
            message: message.into(),
        }
    }

    /// Creates a new `SecretNotFound` error.
    #[must_use]
    pub fn secret_not_found(name: impl Into<String>) -> Self {
        Self::SecretNotFound { name: name.into() }
    }

    /// Creates a new `EmptySecret` error.
    #[must_use]
    pub fn empty_secret(name: impl Into<String>) -> Self {
        Self::EmptySecret { name: name.into() }
    }

    /// Creates a new `SecretStore` error.
    #[must_use]
    pub fn secret_store(message: impl Into<String>) -> Self {
        Self::SecretStore {
            message: message.into(),
        }
    }

    /// Creates a new `Credential` error.
    #[must_use]
    pub fn credential(message: impl Into<String>) -> Self {
        Self::Credential {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidOptions` error.
    #[must_use]
    pub fn invalid_options(message: impl Into<String>) -> Self {
        Self::InvalidOptions {
            message: message.into(),
        }
    }

    /// Creates a new `Construction` error.
    #[must_use]
    pub fn construction(message: impl Into<String>) -> Self {
        Self::Construction {
            message: message.into(),
        }
    }

    /// Creates a new `Close` error.
    #[must_use]
    pub fn close(message: impl Into<String>) -> Self {
        Self::Close {
            message: message.into(),
        }
    }

    /// Returns `true` if the error was raised by argument validation.
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::MissingArgument { .. } | Self::EmptyArgument { .. }
        )
    }

    /// Returns `true` if the partition is unknown to the metadata service.
    #[must_use]
    pub fn is_unknown_partition(&self) -> bool {
        matches!(self, Self::UnknownPartition { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingArgument { .. } | Self::EmptyArgument { .. } => {
                ErrorCategory::InvalidArgument
            }
            Self::UnknownPartition { .. } | Self::PartitionService { .. } => {
                ErrorCategory::Partition
            }
            Self::SecretNotFound { .. } | Self::EmptySecret { .. } | Self::SecretStore { .. } => {
                ErrorCategory::Secret
            }
            Self::Credential { .. } | Self::InvalidOptions { .. } | Self::Construction { .. } => {
                ErrorCategory::Construction
            }
            Self::Close { .. } => ErrorCategory::Close,
            Self::NotInitialized => ErrorCategory::Lifecycle,
        }
    }
}

/// Categories of client errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Missing or empty argument.
    InvalidArgument,
    /// Partition metadata resolution.
    Partition,
    /// Secret resolution.
    Secret,
    /// Client construction (options, credential, driver).
    Construction,
    /// Client close during shutdown.
    Close,
    /// Cache used outside its lifecycle.
    Lifecycle,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "invalid_argument"),
            Self::Partition => write!(f, "partition"),
            Self::Secret => write!(f, "secret"),
            Self::Construction => write!(f, "construction"),
            Self::Close => write!(f, "close"),
            Self::Lifecycle => write!(f, "lifecycle"),
        }
    }
}
