//! Port contracts for the monitor's external collaborators.

mod catalog;
mod credentials;
mod history;
mod network;
mod registry;

pub use catalog::{ToolCatalogError, ToolCatalogRepository, ToolCatalogResult, ToolUpsert, UpsertKind};
pub use credentials::{CredentialStore, CredentialStoreError, CredentialStoreResult};
pub use history::{HistoryError, HistoryRepository, HistoryResult};
pub use network::{DiscoveryError, DiscoveryResult, ReachabilityProbe, ToolDiscovery};
pub use registry::{ServerRegistry, ServerRegistryError, ServerRegistryResult};
