//! The driver seam.

use async_trait::async_trait;
use tenantdb_core::{ClientResult, DynAsyncClient, DynClient};

use crate::builder::ClientOptions;

/// Turns finished [`ClientOptions`] into live driver clients.
///
/// The cache never talks to the database driver directly; the application
/// supplies an implementation of this trait and tests substitute a recorder.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    /// Builds a blocking client.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Construction` (or any other error the driver
    /// reports) if the client cannot be created.
    async fn build_client(&self, options: ClientOptions) -> ClientResult<DynClient>;

    /// Builds a non-blocking client.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Construction` (or any other error the driver
    /// reports) if the client cannot be created.
    async fn build_async_client(&self, options: ClientOptions) -> ClientResult<DynAsyncClient>;
}
