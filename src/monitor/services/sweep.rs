//! One monitoring pass over every registered server.
//!
//! Each server runs through a fixed pipeline: probe reachability, resolve
//! credentials, fetch the tool catalog, reconcile it, and append history.
//! Failures are contained per server: whatever happens, exactly one server
//! snapshot is appended for every server the sweep visits, and it is always
//! the last write of that server's pipeline. A panic inside one pipeline is
//! recorded as an errored check for that server only.

use super::{CatalogReconciler, CredentialGate, HistoryLedger, ReconciliationError};
use crate::monitor::{
    domain::{
        MonitoredServer, ServerCheckOutcome, ServerId, ServerReport, SweepId, SweepReport,
    },
    ports::{
        CredentialStore, CredentialStoreError, HistoryError, HistoryRepository,
        ReachabilityProbe, ServerRegistry, ServerRegistryResult, ToolCatalogRepository,
        ToolDiscovery,
    },
};
use chrono::Duration as ChronoDuration;
use futures::FutureExt;
use futures::stream::{self, StreamExt};
use mockable::Clock;
use std::any::Any;
use std::num::NonZeroUsize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{Instrument, error, info, info_span, warn};

/// Longest response body excerpt written to logs.
const LOGGED_BODY_LIMIT: usize = 512;

/// Tunables for a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSettings {
    /// Upper bound on one server's probe, discovery, and reconciliation.
    pub server_timeout: Duration,
    /// Number of servers checked concurrently.
    pub max_concurrency: NonZeroUsize,
    /// Window before expiry in which credentials count as expired.
    pub credential_expiry_buffer: ChronoDuration,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            server_timeout: Duration::from_secs(30),
            max_concurrency: NonZeroUsize::MIN,
            credential_expiry_buffer: ChronoDuration::minutes(
                super::credential_gate::DEFAULT_EXPIRY_BUFFER_MINUTES,
            ),
        }
    }
}

/// Unexpected failure inside one server's pipeline.
#[derive(Debug, Clone, Error)]
pub enum ServerCheckError {
    /// Reading the stored credential failed.
    #[error("credential lookup failed: {0}")]
    Credential(#[from] CredentialStoreError),

    /// Applying the discovered catalog failed.
    #[error(transparent)]
    Reconciliation(#[from] ReconciliationError),

    /// Appending a tool snapshot failed.
    #[error("tool snapshot append failed: {0}")]
    ToolSnapshot(#[from] HistoryError),

    /// The pipeline exceeded the per-server timeout.
    #[error("server check exceeded {0:?}")]
    TimedOut(Duration),

    /// The pipeline panicked.
    #[error("server check panicked: {0}")]
    Panicked(String),
}

/// Collaborators wired into a [`MonitorSweep`].
pub struct MonitorPorts<R, N, S, T, H, C> {
    /// Server registry.
    pub registry: Arc<R>,
    /// Outbound reachability probe and tool discovery.
    pub network: Arc<N>,
    /// Credential store.
    pub credentials: Arc<S>,
    /// Tool catalog repository.
    pub catalog: Arc<T>,
    /// History repository.
    pub history: Arc<H>,
    /// Clock used for expiry checks and catalog timestamps.
    pub clock: Arc<C>,
}

/// Runs monitoring sweeps over the registered fleet.
pub struct MonitorSweep<R, N, S, T, H, C>
where
    R: ServerRegistry,
    N: ReachabilityProbe + ToolDiscovery,
    S: CredentialStore,
    T: ToolCatalogRepository,
    H: HistoryRepository,
    C: Clock + Send + Sync,
{
    registry: Arc<R>,
    network: Arc<N>,
    gate: CredentialGate<S, C>,
    reconciler: CatalogReconciler<T, C>,
    ledger: HistoryLedger<H>,
    clock: Arc<C>,
    settings: SweepSettings,
}

impl<R, N, S, T, H, C> MonitorSweep<R, N, S, T, H, C>
where
    R: ServerRegistry,
    N: ReachabilityProbe + ToolDiscovery,
    S: CredentialStore,
    T: ToolCatalogRepository,
    H: HistoryRepository,
    C: Clock + Send + Sync,
{
    /// Wires a sweep from its collaborators.
    #[must_use]
    pub fn new(ports: MonitorPorts<R, N, S, T, H, C>, settings: SweepSettings) -> Self {
        let MonitorPorts {
            registry,
            network,
            credentials,
            catalog,
            history,
            clock,
        } = ports;

        Self {
            registry,
            network,
            gate: CredentialGate::with_expiry_buffer(
                credentials,
                clock.clone(),
                settings.credential_expiry_buffer,
            ),
            reconciler: CatalogReconciler::new(catalog, clock.clone()),
            ledger: HistoryLedger::new(history),
            clock,
            settings,
        }
    }

    /// Returns the history ledger the sweep writes to.
    #[must_use]
    pub const fn ledger(&self) -> &HistoryLedger<H> {
        &self.ledger
    }

    /// Returns the credential gate used for discovery calls.
    #[must_use]
    pub const fn credential_gate(&self) -> &CredentialGate<S, C> {
        &self.gate
    }

    /// Returns the sweep settings.
    #[must_use]
    pub const fn settings(&self) -> SweepSettings {
        self.settings
    }

    /// Checks every registered server once.
    ///
    /// Never fails: a registry failure yields an empty report and per-server
    /// failures are recorded in the report and in history.
    pub async fn run_sweep_once(&self) -> SweepReport {
        let sweep_id = SweepId::new();
        let span = info_span!("monitor_sweep", sweep_id = %sweep_id);
        self.sweep(sweep_id).instrument(span).await
    }

    /// Checks a single server now, outside the scheduled cadence.
    ///
    /// Returns `None` when the server is not registered.
    ///
    /// # Errors
    ///
    /// Returns registry errors from the server lookup.
    pub async fn check_server(
        &self,
        server_id: ServerId,
    ) -> ServerRegistryResult<Option<ServerReport>> {
        let Some(server) = self.registry.get_server(server_id).await? else {
            return Ok(None);
        };
        Ok(Some(self.check(&server).await))
    }

    async fn sweep(&self, sweep_id: SweepId) -> SweepReport {
        let started_at = self.clock.utc();
        let timer = Instant::now();

        let servers = match self.registry.list_servers().await {
            Ok(servers) => servers,
            Err(err) => {
                error!(reason = %err, "failed to list registered servers");
                Vec::new()
            }
        };
        info!(
            servers = servers.len(),
            concurrency = self.settings.max_concurrency.get(),
            "monitor sweep started"
        );

        let reports: Vec<ServerReport> = stream::iter(servers)
            .map(|server| async move { self.check(&server).await })
            .buffer_unordered(self.settings.max_concurrency.get())
            .collect()
            .await;

        let report = SweepReport {
            sweep_id,
            started_at,
            duration: timer.elapsed(),
            servers: reports,
        };
        info!(
            servers = report.servers.len(),
            up = report.up_count(),
            duration_ms = u64::try_from(report.duration.as_millis()).unwrap_or(u64::MAX),
            "monitor sweep finished"
        );
        report
    }

    async fn check(&self, server: &MonitoredServer) -> ServerReport {
        let span = info_span!(
            "server_check",
            server_id = %server.id(),
            server = server.name(),
        );
        self.check_inner(server).instrument(span).await
    }

    async fn check_inner(&self, server: &MonitoredServer) -> ServerReport {
        let evaluation = AssertUnwindSafe(self.evaluate(server)).catch_unwind();
        let outcome = match tokio::time::timeout(self.settings.server_timeout, evaluation).await {
            Ok(Ok(Ok(outcome))) => outcome,
            Ok(Ok(Err(err))) => errored(&err),
            Ok(Err(payload)) => errored(&ServerCheckError::Panicked(panic_message(&*payload))),
            Err(_) => errored(&ServerCheckError::TimedOut(self.settings.server_timeout)),
        };

        let snapshot_recorded = match self
            .ledger
            .append_server_snapshot(server.id(), outcome.observed_up(), outcome.tool_count())
            .await
        {
            Ok(_) => true,
            Err(err) => {
                error!(reason = %err, "failed to record server snapshot");
                false
            }
        };

        info!(
            outcome = %outcome,
            up = outcome.observed_up(),
            tool_count = outcome.tool_count(),
            "server check finished"
        );

        ServerReport {
            server_id: server.id(),
            server_name: server.name().to_owned(),
            outcome,
            snapshot_recorded,
        }
    }

    async fn evaluate(
        &self,
        server: &MonitoredServer,
    ) -> Result<ServerCheckOutcome, ServerCheckError> {
        if !self.network.is_reachable(server.base_url()).await {
            info!(base_url = %server.base_url(), "server unreachable");
            return Ok(ServerCheckOutcome::Down);
        }

        let headers = self.gate.resolve_auth_headers(server.id()).await?;
        let discovered = match self
            .network
            .fetch_tools(server.id(), server.base_url(), &headers)
            .await
        {
            Ok(discovered) => discovered,
            Err(err) => {
                warn!(
                    reason = %err,
                    status = ?err.status(),
                    body = %excerpt(err.body().unwrap_or_default()),
                    "tool discovery failed"
                );
                return Ok(ServerCheckOutcome::DiscoveryFailed {
                    reason: err.to_string(),
                });
            }
        };

        let reconciliation = self.reconciler.reconcile(server.id(), &discovered).await?;
        for tool in &reconciliation.tools {
            self.ledger
                .append_tool_snapshot(tool.id(), tool.is_available())
                .await?;
        }

        Ok(ServerCheckOutcome::Up {
            counts: reconciliation.counts,
        })
    }
}

fn errored(err: &ServerCheckError) -> ServerCheckOutcome {
    error!(reason = %err, "server check aborted");
    ServerCheckOutcome::Errored {
        reason: err.to_string(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| String::from("non-string panic payload"))
}

fn excerpt(body: &str) -> String {
    body.chars().take(LOGGED_BODY_LIMIT).collect()
}
