//! Domain model for MCP server monitoring.
//!
//! The monitor domain models the servers being watched, the tools they
//! report, the credentials used to reach them, and the append-only history
//! derived from each sweep. Infrastructure concerns remain outside this
//! boundary.

mod credential;
mod error;
mod history;
mod ids;
mod outcome;
mod server;
mod tool;

pub use credential::{
    AUTHORIZATION_HEADER, AuthHeaders, Credential, CredentialStatus, DEFAULT_HEADER_SCHEME,
    OAuthClientMetadata, scheme_names_custom_header,
};
pub use error::MonitorDomainError;
pub use history::{ServerSnapshot, SnapshotTally, ToolSnapshot, next_checked_at};
pub use ids::{OwnerId, ServerId, SweepId, ToolId};
pub use outcome::{ReconciliationCounts, ServerCheckOutcome, ServerReport, SweepReport};
pub use server::{BaseUrl, DEFAULT_MONITOR_INTERVAL, MonitoredServer, PersistedServerData};
pub use tool::{PersistedToolData, ToolDescriptor, ToolRecord, ToolRequestStats};
