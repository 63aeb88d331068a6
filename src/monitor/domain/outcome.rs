//! Per-server check outcomes and sweep reports.

use super::{ServerId, SweepId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Row-level changes applied while reconciling one discovered catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationCounts {
    /// Distinct tool names in the discovery result.
    pub discovered: u32,
    /// Tools inserted for the first time.
    pub added: u32,
    /// Existing tools refreshed from the discovery result.
    pub updated: u32,
    /// Previously available tools absent from the discovery result.
    pub disabled: u32,
}

/// Result of checking one server during a sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum ServerCheckOutcome {
    /// The reachability probe failed.
    Down,
    /// The server answered but its catalog could not be read.
    DiscoveryFailed {
        /// Diagnostic from the discovery call.
        reason: String,
    },
    /// The catalog was read and reconciled.
    Up {
        /// Reconciliation row counts.
        counts: ReconciliationCounts,
    },
    /// An unexpected failure aborted the check.
    Errored {
        /// Diagnostic for the failure.
        reason: String,
    },
}

impl ServerCheckOutcome {
    /// Returns whether the server is recorded as up.
    #[must_use]
    pub const fn observed_up(&self) -> bool {
        matches!(self, Self::DiscoveryFailed { .. } | Self::Up { .. })
    }

    /// Returns the tool count recorded in the server snapshot.
    #[must_use]
    pub const fn tool_count(&self) -> u32 {
        match self {
            Self::Up { counts } => counts.discovered,
            Self::Down | Self::DiscoveryFailed { .. } | Self::Errored { .. } => 0,
        }
    }

    /// Returns a short label for logging.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Down => "down",
            Self::DiscoveryFailed { .. } => "discovery_failed",
            Self::Up { .. } => "up",
            Self::Errored { .. } => "errored",
        }
    }
}

impl fmt::Display for ServerCheckOutcome {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

/// Report for one server within a sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerReport {
    /// Checked server.
    pub server_id: ServerId,
    /// Server display name.
    pub server_name: String,
    /// Check outcome.
    pub outcome: ServerCheckOutcome,
    /// Whether the server snapshot was persisted.
    pub snapshot_recorded: bool,
}

/// Summary of one sweep over all registered servers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Correlation identifier.
    pub sweep_id: SweepId,
    /// Sweep start time.
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration.
    pub duration: Duration,
    /// Per-server results in completion order.
    pub servers: Vec<ServerReport>,
}

impl SweepReport {
    /// Returns the report for a server, if it was checked.
    #[must_use]
    pub fn server(&self, server_id: ServerId) -> Option<&ServerReport> {
        self.servers
            .iter()
            .find(|report| report.server_id == server_id)
    }

    /// Counts servers whose snapshot records them as up.
    #[must_use]
    pub fn up_count(&self) -> usize {
        self.servers
            .iter()
            .filter(|report| report.outcome.observed_up())
            .count()
    }
}
