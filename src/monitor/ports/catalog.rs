//! Persistence port for per-server tool catalogs.

use crate::monitor::domain::{ServerId, ToolDescriptor, ToolRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

/// Result type for tool catalog operations.
pub type ToolCatalogResult<T> = Result<T, ToolCatalogError>;

/// Whether an upsert created a new row or refreshed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpsertKind {
    /// No tool with that name existed for the server.
    Inserted,
    /// An existing tool was refreshed and marked available.
    Updated,
}

/// Record produced by [`ToolCatalogRepository::upsert_tool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolUpsert {
    /// The stored record after the upsert.
    pub record: ToolRecord,
    /// Whether the record was inserted or updated.
    pub kind: UpsertKind,
}

/// Persistence contract for tool records keyed by `(server, name)`.
#[async_trait]
pub trait ToolCatalogRepository: Send + Sync {
    /// Inserts the tool if absent, otherwise replaces its descriptive fields,
    /// marks it available, and sets its modification timestamp to `at`.
    ///
    /// Request counters on existing rows are left untouched.
    async fn upsert_tool(
        &self,
        server_id: ServerId,
        descriptor: &ToolDescriptor,
        at: DateTime<Utc>,
    ) -> ToolCatalogResult<ToolUpsert>;

    /// Disables every currently available tool of the server whose name is
    /// not in `keep_names`, returning the number of rows changed.
    async fn disable_tools_not_in(
        &self,
        server_id: ServerId,
        keep_names: &BTreeSet<String>,
        at: DateTime<Utc>,
    ) -> ToolCatalogResult<u64>;

    /// Returns every tool record for the server ordered by name.
    async fn list_tools(&self, server_id: ServerId) -> ToolCatalogResult<Vec<ToolRecord>>;
}

/// Errors returned by tool catalog implementations.
#[derive(Debug, Clone, Error)]
pub enum ToolCatalogError {
    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted tool data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ToolCatalogError {
    /// Wraps persisted-data decoding or validation failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
