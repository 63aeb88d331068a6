//! Application services that drive monitoring sweeps.

mod credential_gate;
mod ledger;
mod reconciler;
mod scheduler;
mod sweep;

pub use credential_gate::{CredentialGate, DEFAULT_EXPIRY_BUFFER_MINUTES};
pub use ledger::HistoryLedger;
pub use reconciler::{CatalogReconciler, Reconciliation, ReconciliationError};
pub use scheduler::{ScheduleSettings, SchedulerExit, SweepScheduler, SweepTrigger};
pub use sweep::{MonitorPorts, MonitorSweep, ServerCheckError, SweepSettings};
