//! In-memory server registry.

use crate::monitor::{
    domain::{
        BaseUrl, DEFAULT_MONITOR_INTERVAL, MonitoredServer, OwnerId, PersistedServerData, ServerId,
    },
    ports::{ServerRegistry, ServerRegistryError, ServerRegistryResult},
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory server registry.
///
/// Identifiers are assigned sequentially from 1, mirroring a database
/// sequence, and listing returns servers in identifier order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryServerRegistry {
    state: Arc<RwLock<RegistryState>>,
}

#[derive(Debug, Default)]
struct RegistryState {
    next_id: i64,
    servers: BTreeMap<ServerId, MonitoredServer>,
}

impl InMemoryServerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a server with the default monitor interval.
    ///
    /// # Errors
    ///
    /// Returns [`ServerRegistryError::InvalidPersistedData`] for a blank name
    /// and [`ServerRegistryError::Persistence`] when the lock is poisoned.
    pub fn register(
        &self,
        name: &str,
        base_url: BaseUrl,
        owner: OwnerId,
    ) -> ServerRegistryResult<MonitoredServer> {
        let mut state = self.state.write().map_err(|err| {
            ServerRegistryError::persistence(std::io::Error::other(err.to_string()))
        })?;

        let id = ServerId::new(state.next_id.saturating_add(1));
        let now = Utc::now();
        let server = MonitoredServer::from_persisted(PersistedServerData {
            id,
            name: name.to_owned(),
            base_url,
            owner,
            monitor_interval: DEFAULT_MONITOR_INTERVAL,
            created_at: now,
            updated_at: now,
        })
        .map_err(ServerRegistryError::invalid_persisted_data)?;

        state.next_id = id.value();
        state.servers.insert(id, server.clone());
        Ok(server)
    }

    /// Removes a server, returning whether it was registered.
    ///
    /// # Errors
    ///
    /// Returns [`ServerRegistryError::Persistence`] when the lock is poisoned.
    pub fn deregister(&self, server_id: ServerId) -> ServerRegistryResult<bool> {
        let mut state = self.state.write().map_err(|err| {
            ServerRegistryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state.servers.remove(&server_id).is_some())
    }
}

#[async_trait]
impl ServerRegistry for InMemoryServerRegistry {
    async fn list_servers(&self) -> ServerRegistryResult<Vec<MonitoredServer>> {
        let state = self.state.read().map_err(|err| {
            ServerRegistryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state.servers.values().cloned().collect())
    }

    async fn get_server(&self, server_id: ServerId) -> ServerRegistryResult<Option<MonitoredServer>> {
        let state = self.state.read().map_err(|err| {
            ServerRegistryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state.servers.get(&server_id).cloned())
    }
}
