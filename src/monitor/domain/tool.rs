//! Discovered tool descriptors and persisted tool records.

use super::{MonitorDomainError, ServerId, ToolId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool reported by a server during one discovery cycle.
///
/// Descriptors carry no identity beyond their name and the server that
/// reported them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    name: String,
    description: String,
    tool_type: Option<String>,
    input_schema: Option<Value>,
    output_schema: Option<Value>,
}

impl ToolDescriptor {
    /// Creates a descriptor with a non-empty name.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorDomainError::EmptyToolName`] when `name` is blank.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, MonitorDomainError> {
        let normalized_name = name.into().trim().to_owned();
        if normalized_name.is_empty() {
            return Err(MonitorDomainError::EmptyToolName);
        }

        Ok(Self {
            name: normalized_name,
            description: description.into().trim().to_owned(),
            tool_type: None,
            input_schema: None,
            output_schema: None,
        })
    }

    /// Sets the optional tool type.
    #[must_use]
    pub fn with_tool_type(mut self, tool_type: impl Into<String>) -> Self {
        let normalized = tool_type.into().trim().to_owned();
        self.tool_type = (!normalized.is_empty()).then_some(normalized);
        self
    }

    /// Sets the input schema.
    #[must_use]
    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }

    /// Sets the output schema.
    #[must_use]
    pub fn with_output_schema(mut self, schema: Value) -> Self {
        self.output_schema = Some(schema);
        self
    }

    /// Returns the tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the tool description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the optional tool type.
    #[must_use]
    pub fn tool_type(&self) -> Option<&str> {
        self.tool_type.as_deref()
    }

    /// Returns the optional input schema.
    #[must_use]
    pub const fn input_schema(&self) -> Option<&Value> {
        self.input_schema.as_ref()
    }

    /// Returns the optional output schema.
    #[must_use]
    pub const fn output_schema(&self) -> Option<&Value> {
        self.output_schema.as_ref()
    }
}

/// Cumulative request counters kept alongside a tool record.
///
/// The monitor never changes these; they are owned by the request proxy and
/// preserved across catalog upserts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRequestStats {
    /// Total proxied requests.
    pub total_requests: u64,
    /// Requests that completed successfully.
    pub successful_requests: u64,
    /// Requests that failed.
    pub failed_requests: u64,
    /// Status code of the most recent request.
    pub last_status_code: Option<u16>,
    /// Latency of the most recent request in milliseconds.
    pub last_latency_ms: Option<u64>,
}

/// Persisted catalog entry for a tool exposed by a server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRecord {
    id: ToolId,
    server_id: ServerId,
    descriptor: ToolDescriptor,
    is_available: bool,
    stats: ToolRequestStats,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a tool record from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedToolData {
    /// Persisted identifier.
    pub id: ToolId,
    /// Owning server.
    pub server_id: ServerId,
    /// Persisted descriptor fields.
    pub descriptor: ToolDescriptor,
    /// Persisted availability flag.
    pub is_available: bool,
    /// Persisted request counters.
    pub stats: ToolRequestStats,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted modification timestamp.
    pub modified_at: DateTime<Utc>,
}

impl ToolRecord {
    /// Creates a freshly discovered, available tool record.
    #[must_use]
    pub const fn discovered(
        id: ToolId,
        server_id: ServerId,
        descriptor: ToolDescriptor,
        discovered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            server_id,
            descriptor,
            is_available: true,
            stats: ToolRequestStats {
                total_requests: 0,
                successful_requests: 0,
                failed_requests: 0,
                last_status_code: None,
                last_latency_ms: None,
            },
            created_at: discovered_at,
            modified_at: discovered_at,
        }
    }

    /// Reconstructs a record from persistence.
    #[must_use]
    pub fn from_persisted(data: PersistedToolData) -> Self {
        Self {
            id: data.id,
            server_id: data.server_id,
            descriptor: data.descriptor,
            is_available: data.is_available,
            stats: data.stats,
            created_at: data.created_at,
            modified_at: data.modified_at,
        }
    }

    /// Applies a rediscovered descriptor: replaces the descriptive fields,
    /// marks the tool available, and bumps the modification timestamp.
    pub fn rediscover(&mut self, descriptor: ToolDescriptor, at: DateTime<Utc>) {
        self.descriptor = descriptor;
        self.is_available = true;
        self.modified_at = at;
    }

    /// Marks the tool unavailable and bumps the modification timestamp.
    pub const fn disable(&mut self, at: DateTime<Utc>) {
        self.is_available = false;
        self.modified_at = at;
    }

    /// Overwrites the request counters with values reported by the proxy.
    ///
    /// Reconciliation never calls this; upserts carry existing counters over.
    pub const fn record_request_stats(&mut self, stats: ToolRequestStats) {
        self.stats = stats;
    }

    /// Returns the tool identifier.
    #[must_use]
    pub const fn id(&self) -> ToolId {
        self.id
    }

    /// Returns the owning server identifier.
    #[must_use]
    pub const fn server_id(&self) -> ServerId {
        self.server_id
    }

    /// Returns the tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Returns the stored descriptor.
    #[must_use]
    pub const fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    /// Returns whether the tool was present in the latest discovery.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.is_available
    }

    /// Returns the cumulative request counters.
    #[must_use]
    pub const fn stats(&self) -> ToolRequestStats {
        self.stats
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the modification timestamp.
    #[must_use]
    pub const fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }
}
