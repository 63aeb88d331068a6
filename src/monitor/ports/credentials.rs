//! Read-only port onto stored server credentials.

use crate::monitor::domain::{Credential, ServerId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for credential reads.
pub type CredentialStoreResult<T> = Result<T, CredentialStoreError>;

/// Lookup contract for per-server credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns the credential stored for a server, if any.
    async fn get_credential(&self, server_id: ServerId)
    -> CredentialStoreResult<Option<Credential>>;
}

/// Errors returned by credential store implementations.
#[derive(Debug, Clone, Error)]
pub enum CredentialStoreError {
    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted credential data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl CredentialStoreError {
    /// Wraps persisted-data decoding or validation failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
