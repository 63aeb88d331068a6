//! Append-only availability history records.

use super::{ServerId, ToolId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One observation of a server's liveness and catalog size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSnapshot {
    /// Observed server.
    pub server_id: ServerId,
    /// Whether the server answered the reachability probe.
    pub observed_up: bool,
    /// Number of tools discovered during the check.
    pub tool_count: u32,
    /// Store-assigned observation timestamp.
    pub checked_at: DateTime<Utc>,
}

/// One observation of a tool's availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSnapshot {
    /// Observed tool.
    pub tool_id: ToolId,
    /// Availability at the time of the check.
    pub is_available: bool,
    /// Store-assigned observation timestamp.
    pub checked_at: DateTime<Utc>,
}

/// Count of positive observations out of all observations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotTally {
    /// Snapshots recording the subject as up or available.
    pub positive: u64,
    /// All snapshots recorded for the subject.
    pub total: u64,
}

impl SnapshotTally {
    /// Creates a tally.
    #[must_use]
    pub const fn new(positive: u64, total: u64) -> Self {
        Self { positive, total }
    }

    /// Adds one observation.
    pub const fn record(&mut self, positive: bool) {
        self.total += 1;
        if positive {
            self.positive += 1;
        }
    }

    /// Returns `100 * positive / total`, or `0.0` when nothing was recorded.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        reason = "percentages are reported as floating point; counts stay far below 2^52"
    )]
    pub fn percent(self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        100.0 * self.positive as f64 / self.total as f64
    }
}

/// Returns the timestamp to assign to a new snapshot so that a subject's
/// history stays strictly increasing in insertion order.
#[must_use]
pub fn next_checked_at(candidate: DateTime<Utc>, latest: Option<DateTime<Utc>>) -> DateTime<Utc> {
    match latest {
        Some(previous) if candidate <= previous => previous + Duration::microseconds(1),
        _ => candidate,
    }
}
