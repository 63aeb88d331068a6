//! Append-only availability history and the percentages derived from it.

use crate::monitor::{
    domain::{ServerId, ServerSnapshot, ToolId, ToolSnapshot},
    ports::{HistoryRepository, HistoryResult},
};
use std::sync::Arc;

/// Records snapshots and derives uptime and availability percentages.
///
/// Percentages are recomputed from the full history on every call.
#[derive(Clone)]
pub struct HistoryLedger<H>
where
    H: HistoryRepository,
{
    history: Arc<H>,
}

impl<H> HistoryLedger<H>
where
    H: HistoryRepository,
{
    /// Creates a ledger over a history repository.
    #[must_use]
    pub const fn new(history: Arc<H>) -> Self {
        Self { history }
    }

    /// Appends a server liveness snapshot.
    ///
    /// # Errors
    ///
    /// Returns history persistence errors.
    pub async fn append_server_snapshot(
        &self,
        server_id: ServerId,
        observed_up: bool,
        tool_count: u32,
    ) -> HistoryResult<ServerSnapshot> {
        self.history
            .append_server_snapshot(server_id, observed_up, tool_count)
            .await
    }

    /// Appends a tool availability snapshot.
    ///
    /// # Errors
    ///
    /// Returns history persistence errors.
    pub async fn append_tool_snapshot(
        &self,
        tool_id: ToolId,
        is_available: bool,
    ) -> HistoryResult<ToolSnapshot> {
        self.history.append_tool_snapshot(tool_id, is_available).await
    }

    /// Returns the share of up snapshots for a server, in percent.
    ///
    /// A server with no history reports `0.0`.
    ///
    /// # Errors
    ///
    /// Returns history persistence errors.
    pub async fn uptime_percent(&self, server_id: ServerId) -> HistoryResult<f64> {
        Ok(self.history.server_tally(server_id).await?.percent())
    }

    /// Returns the share of available snapshots for a tool, in percent.
    ///
    /// A tool with no history reports `0.0`.
    ///
    /// # Errors
    ///
    /// Returns history persistence errors.
    pub async fn availability_percent(&self, tool_id: ToolId) -> HistoryResult<f64> {
        Ok(self.history.tool_tally(tool_id).await?.percent())
    }

    /// Returns up to `limit` of the newest server snapshots, newest first.
    ///
    /// # Errors
    ///
    /// Returns history persistence errors.
    pub async fn recent_server_snapshots(
        &self,
        server_id: ServerId,
        limit: usize,
    ) -> HistoryResult<Vec<ServerSnapshot>> {
        self.history.recent_server_snapshots(server_id, limit).await
    }
}
