//! Read-only port onto the server registry.

use crate::monitor::domain::{MonitoredServer, ServerId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for server registry reads.
pub type ServerRegistryResult<T> = Result<T, ServerRegistryError>;

/// Lookup contract for registered MCP servers.
#[async_trait]
pub trait ServerRegistry: Send + Sync {
    /// Returns every registered server.
    async fn list_servers(&self) -> ServerRegistryResult<Vec<MonitoredServer>>;

    /// Finds a server by identifier.
    async fn get_server(&self, server_id: ServerId)
    -> ServerRegistryResult<Option<MonitoredServer>>;
}

/// Errors returned by server registry implementations.
#[derive(Debug, Clone, Error)]
pub enum ServerRegistryError {
    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted server data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ServerRegistryError {
    /// Wraps persisted-data decoding or validation failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
