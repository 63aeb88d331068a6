//! In-memory credential store.

use crate::monitor::{
    domain::{Credential, ServerId},
    ports::{CredentialStore, CredentialStoreError, CredentialStoreResult},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory credential store holding one credential per server.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialStore {
    credentials: Arc<RwLock<HashMap<ServerId, Credential>>>,
}

impl InMemoryCredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores or replaces the credential for its server.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialStoreError::Persistence`] when the lock is poisoned.
    pub fn put(&self, credential: Credential) -> CredentialStoreResult<()> {
        let mut credentials = self.credentials.write().map_err(|err| {
            CredentialStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        credentials.insert(credential.server_id(), credential);
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get_credential(&self, server_id: ServerId) -> CredentialStoreResult<Option<Credential>> {
        let credentials = self.credentials.read().map_err(|err| {
            CredentialStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(credentials.get(&server_id).cloned())
    }
}
