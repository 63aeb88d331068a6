//! In-memory append-only history store.

use crate::monitor::{
    domain::{ServerId, ServerSnapshot, SnapshotTally, ToolId, ToolSnapshot, next_checked_at},
    ports::{HistoryError, HistoryRepository, HistoryResult},
};
use async_trait::async_trait;
use mockable::Clock;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory history store.
///
/// Timestamps come from the injected clock and are bumped when needed so
/// each subject's history stays strictly increasing.
#[derive(Debug)]
pub struct InMemoryHistoryStore<C>
where
    C: Clock + Send + Sync,
{
    clock: Arc<C>,
    state: RwLock<HistoryState>,
}

#[derive(Debug, Default)]
struct HistoryState {
    servers: HashMap<ServerId, Vec<ServerSnapshot>>,
    tools: HashMap<ToolId, Vec<ToolSnapshot>>,
}

impl<C> InMemoryHistoryStore<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an empty store stamped by `clock`.
    #[must_use]
    pub fn new(clock: Arc<C>) -> Self {
        Self {
            clock,
            state: RwLock::new(HistoryState::default()),
        }
    }

    /// Returns every snapshot of a server, oldest first.
    #[must_use]
    pub fn server_snapshots(&self, server_id: ServerId) -> Vec<ServerSnapshot> {
        self.state.read().map_or_else(
            |_| Vec::new(),
            |state| state.servers.get(&server_id).cloned().unwrap_or_default(),
        )
    }

    /// Returns every snapshot of a tool, oldest first.
    #[must_use]
    pub fn tool_snapshots(&self, tool_id: ToolId) -> Vec<ToolSnapshot> {
        self.state.read().map_or_else(
            |_| Vec::new(),
            |state| state.tools.get(&tool_id).cloned().unwrap_or_default(),
        )
    }

    /// Returns the number of server snapshots across all servers.
    #[must_use]
    pub fn total_server_snapshots(&self) -> usize {
        self.state
            .read()
            .map_or(0, |state| state.servers.values().map(Vec::len).sum())
    }
}

#[async_trait]
impl<C> HistoryRepository for InMemoryHistoryStore<C>
where
    C: Clock + Send + Sync,
{
    async fn append_server_snapshot(
        &self,
        server_id: ServerId,
        observed_up: bool,
        tool_count: u32,
    ) -> HistoryResult<ServerSnapshot> {
        let mut state = self
            .state
            .write()
            .map_err(|err| HistoryError::persistence(std::io::Error::other(err.to_string())))?;
        let history = state.servers.entry(server_id).or_default();
        let checked_at = next_checked_at(
            self.clock.utc(),
            history.last().map(|snapshot| snapshot.checked_at),
        );
        let snapshot = ServerSnapshot {
            server_id,
            observed_up,
            tool_count,
            checked_at,
        };
        history.push(snapshot);
        Ok(snapshot)
    }

    async fn append_tool_snapshot(
        &self,
        tool_id: ToolId,
        is_available: bool,
    ) -> HistoryResult<ToolSnapshot> {
        let mut state = self
            .state
            .write()
            .map_err(|err| HistoryError::persistence(std::io::Error::other(err.to_string())))?;
        let history = state.tools.entry(tool_id).or_default();
        let checked_at = next_checked_at(
            self.clock.utc(),
            history.last().map(|snapshot| snapshot.checked_at),
        );
        let snapshot = ToolSnapshot {
            tool_id,
            is_available,
            checked_at,
        };
        history.push(snapshot);
        Ok(snapshot)
    }

    async fn server_tally(&self, server_id: ServerId) -> HistoryResult<SnapshotTally> {
        let state = self
            .state
            .read()
            .map_err(|err| HistoryError::persistence(std::io::Error::other(err.to_string())))?;
        let mut tally = SnapshotTally::default();
        for snapshot in state.servers.get(&server_id).into_iter().flatten() {
            tally.record(snapshot.observed_up);
        }
        Ok(tally)
    }

    async fn tool_tally(&self, tool_id: ToolId) -> HistoryResult<SnapshotTally> {
        let state = self
            .state
            .read()
            .map_err(|err| HistoryError::persistence(std::io::Error::other(err.to_string())))?;
        let mut tally = SnapshotTally::default();
        for snapshot in state.tools.get(&tool_id).into_iter().flatten() {
            tally.record(snapshot.is_available);
        }
        Ok(tally)
    }

    async fn recent_server_snapshots(
        &self,
        server_id: ServerId,
        limit: usize,
    ) -> HistoryResult<Vec<ServerSnapshot>> {
        let state = self
            .state
            .read()
            .map_err(|err| HistoryError::persistence(std::io::Error::other(err.to_string())))?;
        Ok(state
            .servers
            .get(&server_id)
            .into_iter()
            .flat_map(|history| history.iter().rev())
            .take(limit)
            .copied()
            .collect())
    }
}
