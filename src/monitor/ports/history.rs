//! Append-only persistence port for availability history.

use crate::monitor::domain::{ServerId, ServerSnapshot, SnapshotTally, ToolId, ToolSnapshot};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for history operations.
pub type HistoryResult<T> = Result<T, HistoryError>;

/// Persistence contract for server and tool snapshots.
///
/// Implementations assign `checked_at` themselves and keep it strictly
/// increasing per subject in insertion order.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Appends a server snapshot.
    async fn append_server_snapshot(
        &self,
        server_id: ServerId,
        observed_up: bool,
        tool_count: u32,
    ) -> HistoryResult<ServerSnapshot>;

    /// Appends a tool snapshot.
    async fn append_tool_snapshot(
        &self,
        tool_id: ToolId,
        is_available: bool,
    ) -> HistoryResult<ToolSnapshot>;

    /// Counts up snapshots out of all snapshots for a server.
    async fn server_tally(&self, server_id: ServerId) -> HistoryResult<SnapshotTally>;

    /// Counts available snapshots out of all snapshots for a tool.
    async fn tool_tally(&self, tool_id: ToolId) -> HistoryResult<SnapshotTally>;

    /// Returns up to `limit` of the newest server snapshots, newest first.
    async fn recent_server_snapshots(
        &self,
        server_id: ServerId,
        limit: usize,
    ) -> HistoryResult<Vec<ServerSnapshot>>;
}

/// Errors returned by history implementations.
#[derive(Debug, Clone, Error)]
pub enum HistoryError {
    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted history data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl HistoryError {
    /// Wraps persisted-data decoding or validation failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
