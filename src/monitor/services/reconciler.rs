//! Reconciles a freshly discovered tool catalog against persisted state.

use crate::monitor::{
    domain::{ReconciliationCounts, ServerId, ToolDescriptor, ToolRecord},
    ports::{ToolCatalogError, ToolCatalogRepository, UpsertKind},
};
use mockable::Clock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Storage failure while applying a discovered catalog.
///
/// The rows touched before the failure stay as written; the next sweep's
/// idempotent upserts converge them.
#[derive(Debug, Clone, Error)]
pub enum ReconciliationError {
    /// Upserting a discovered tool failed.
    #[error("failed to upsert tool '{tool_name}' for server {server_id}: {source}")]
    Upsert {
        /// Server being reconciled.
        server_id: ServerId,
        /// Tool being upserted.
        tool_name: String,
        /// Storage error.
        source: ToolCatalogError,
    },

    /// Disabling tools absent from the discovery failed.
    #[error("failed to disable missing tools for server {server_id}: {source}")]
    Disable {
        /// Server being reconciled.
        server_id: ServerId,
        /// Storage error.
        source: ToolCatalogError,
    },

    /// Reloading the reconciled catalog failed.
    #[error("failed to list tools for server {server_id}: {source}")]
    List {
        /// Server being reconciled.
        server_id: ServerId,
        /// Storage error.
        source: ToolCatalogError,
    },
}

/// Outcome of reconciling one server's catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Every persisted tool of the server after reconciliation.
    pub tools: Vec<ToolRecord>,
    /// Row-level change counts.
    pub counts: ReconciliationCounts,
}

/// Applies discovered catalogs to the tool repository.
#[derive(Clone)]
pub struct CatalogReconciler<T, C>
where
    T: ToolCatalogRepository,
    C: Clock + Send + Sync,
{
    catalog: Arc<T>,
    clock: Arc<C>,
}

impl<T, C> CatalogReconciler<T, C>
where
    T: ToolCatalogRepository,
    C: Clock + Send + Sync,
{
    /// Creates a reconciler.
    #[must_use]
    pub const fn new(catalog: Arc<T>, clock: Arc<C>) -> Self {
        Self { catalog, clock }
    }

    /// Upserts every discovered tool, then disables every available tool of
    /// the server that was not discovered.
    ///
    /// An empty `discovered` list disables the whole catalog. Duplicate names
    /// collapse to the last descriptor with that name.
    ///
    /// # Errors
    ///
    /// Returns [`ReconciliationError`] when the repository fails.
    pub async fn reconcile(
        &self,
        server_id: ServerId,
        discovered: &[ToolDescriptor],
    ) -> Result<Reconciliation, ReconciliationError> {
        let at = self.clock.utc();
        let unique: BTreeMap<&str, &ToolDescriptor> = discovered
            .iter()
            .map(|descriptor| (descriptor.name(), descriptor))
            .collect();

        let mut counts = ReconciliationCounts {
            discovered: saturating_u32(unique.len()),
            ..ReconciliationCounts::default()
        };

        for descriptor in unique.values() {
            let upsert = self
                .catalog
                .upsert_tool(server_id, descriptor, at)
                .await
                .map_err(|source| ReconciliationError::Upsert {
                    server_id,
                    tool_name: descriptor.name().to_owned(),
                    source,
                })?;
            match upsert.kind {
                UpsertKind::Inserted => counts.added += 1,
                UpsertKind::Updated => counts.updated += 1,
            }
        }

        let keep_names: BTreeSet<String> = unique.keys().map(|name| (*name).to_owned()).collect();
        let disabled = self
            .catalog
            .disable_tools_not_in(server_id, &keep_names, at)
            .await
            .map_err(|source| ReconciliationError::Disable { server_id, source })?;
        counts.disabled = u32::try_from(disabled).unwrap_or(u32::MAX);

        let tools = self
            .catalog
            .list_tools(server_id)
            .await
            .map_err(|source| ReconciliationError::List { server_id, source })?;

        info!(
            server_id = %server_id,
            discovered = counts.discovered,
            added = counts.added,
            updated = counts.updated,
            disabled = counts.disabled,
            "reconciled tool catalog"
        );

        Ok(Reconciliation { tools, counts })
    }
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
