//! In-memory tool catalog.

use crate::monitor::{
    domain::{ServerId, ToolDescriptor, ToolId, ToolRecord, ToolRequestStats},
    ports::{ToolCatalogError, ToolCatalogRepository, ToolCatalogResult, ToolUpsert, UpsertKind},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory tool catalog keyed by `(server_id, name)`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryToolCatalog {
    state: Arc<RwLock<CatalogState>>,
}

#[derive(Debug, Default)]
struct CatalogState {
    next_id: i64,
    tools: BTreeMap<ToolId, ToolRecord>,
    name_index: HashMap<(ServerId, String), ToolId>,
}

impl InMemoryToolCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored rows across all servers.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.state.read().map_or(0, |state| state.tools.len())
    }

    /// Overwrites a tool's request counters.
    ///
    /// The request proxy owns these counters and the monitor never writes
    /// them. This is the seam through which in-memory callers and tests stand
    /// in for the proxy. Returns whether the tool exists.
    ///
    /// # Errors
    ///
    /// Returns [`ToolCatalogError::Persistence`] when the lock is poisoned.
    pub fn record_request_stats(
        &self,
        tool_id: ToolId,
        stats: ToolRequestStats,
    ) -> ToolCatalogResult<bool> {
        let mut state = self.state.write().map_err(|err| {
            ToolCatalogError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state
            .tools
            .get_mut(&tool_id)
            .map(|tool| tool.record_request_stats(stats))
            .is_some())
    }
}

#[async_trait]
impl ToolCatalogRepository for InMemoryToolCatalog {
    async fn upsert_tool(
        &self,
        server_id: ServerId,
        descriptor: &ToolDescriptor,
        at: DateTime<Utc>,
    ) -> ToolCatalogResult<ToolUpsert> {
        let mut state = self.state.write().map_err(|err| {
            ToolCatalogError::persistence(std::io::Error::other(err.to_string()))
        })?;

        let key = (server_id, descriptor.name().to_owned());
        if let Some(existing_id) = state.name_index.get(&key).copied()
            && let Some(existing) = state.tools.get_mut(&existing_id)
        {
            existing.rediscover(descriptor.clone(), at);
            return Ok(ToolUpsert {
                record: existing.clone(),
                kind: UpsertKind::Updated,
            });
        }

        let id = ToolId::new(state.next_id.saturating_add(1));
        state.next_id = id.value();
        let record = ToolRecord::discovered(id, server_id, descriptor.clone(), at);
        state.name_index.insert(key, id);
        state.tools.insert(id, record.clone());
        Ok(ToolUpsert {
            record,
            kind: UpsertKind::Inserted,
        })
    }

    async fn disable_tools_not_in(
        &self,
        server_id: ServerId,
        keep_names: &BTreeSet<String>,
        at: DateTime<Utc>,
    ) -> ToolCatalogResult<u64> {
        let mut state = self.state.write().map_err(|err| {
            ToolCatalogError::persistence(std::io::Error::other(err.to_string()))
        })?;

        let mut disabled: u64 = 0;
        for tool in state.tools.values_mut().filter(|tool| {
            tool.server_id() == server_id && tool.is_available() && !keep_names.contains(tool.name())
        }) {
            tool.disable(at);
            disabled = disabled.saturating_add(1);
        }
        Ok(disabled)
    }

    async fn list_tools(&self, server_id: ServerId) -> ToolCatalogResult<Vec<ToolRecord>> {
        let state = self.state.read().map_err(|err| {
            ToolCatalogError::persistence(std::io::Error::other(err.to_string()))
        })?;
        let mut tools: Vec<ToolRecord> = state
            .tools
            .values()
            .filter(|tool| tool.server_id() == server_id)
            .cloned()
            .collect();
        tools.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(tools)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(name: &str) -> ToolDescriptor {
        ToolDescriptor::new(name, format!("{name} tool")).expect("valid tool")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn upsert_preserves_request_stats() {
        let catalog = InMemoryToolCatalog::new();
        let server_id = ServerId::new(1);
        let inserted = catalog
            .upsert_tool(server_id, &tool("search"), Utc::now())
            .await
            .expect("insert should succeed");
        let stats = ToolRequestStats {
            total_requests: 10,
            successful_requests: 9,
            failed_requests: 1,
            last_status_code: Some(200),
            last_latency_ms: Some(42),
        };
        assert!(
            catalog
                .record_request_stats(inserted.record.id(), stats)
                .expect("stats update should succeed")
        );

        let updated = catalog
            .upsert_tool(
                server_id,
                &tool("search").with_tool_type("query"),
                Utc::now(),
            )
            .await
            .expect("update should succeed");

        assert_eq!(updated.kind, UpsertKind::Updated);
        assert_eq!(updated.record.id(), inserted.record.id());
        assert_eq!(updated.record.stats(), stats);
        assert_eq!(updated.record.descriptor().tool_type(), Some("query"));
    }

    #[test]
    fn request_stats_for_unknown_tool_report_absence() {
        let catalog = InMemoryToolCatalog::new();

        let found = catalog
            .record_request_stats(ToolId::new(99), ToolRequestStats::default())
            .expect("stats update should not fail");

        assert!(!found);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn disable_skips_tools_already_unavailable() {
        let catalog = InMemoryToolCatalog::new();
        let server_id = ServerId::new(1);
        catalog
            .upsert_tool(server_id, &tool("a"), Utc::now())
            .await
            .expect("insert should succeed");

        let first = catalog
            .disable_tools_not_in(server_id, &BTreeSet::new(), Utc::now())
            .await
            .expect("disable should succeed");
        let second = catalog
            .disable_tools_not_in(server_id, &BTreeSet::new(), Utc::now())
            .await
            .expect("disable should succeed");

        assert_eq!((first, second), (1, 0));
    }
}
