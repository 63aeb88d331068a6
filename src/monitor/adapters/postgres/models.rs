//! Diesel row models for monitor persistence.

use super::schema::{
    mcp_tools, monitored_servers, server_credentials, server_history, tool_history,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for registered servers.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = monitored_servers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ServerRow {
    /// Server identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Base URL.
    pub base_url: String,
    /// Owning identity.
    pub owner: String,
    /// Monitor interval in seconds.
    pub monitor_interval_secs: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for stored credentials.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = server_credentials)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CredentialRow {
    /// Owning server.
    pub server_id: i64,
    /// Header scheme.
    pub header_scheme: String,
    /// Access token.
    pub access_token: String,
    /// Optional refresh token.
    pub refresh_token: Option<String>,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Optional OAuth client metadata.
    pub oauth_client: Option<Value>,
}

/// Query result row for catalog tools.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = mcp_tools)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ToolRow {
    /// Tool identifier.
    pub id: i64,
    /// Owning server.
    pub server_id: i64,
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// Optional tool category.
    pub tool_type: Option<String>,
    /// Optional input schema.
    pub input_schema: Option<Value>,
    /// Optional output schema.
    pub output_schema: Option<Value>,
    /// Availability flag.
    pub is_available: bool,
    /// Proxied request count.
    pub total_requests: i64,
    /// Successful proxied requests.
    pub successful_requests: i64,
    /// Failed proxied requests.
    pub failed_requests: i64,
    /// Status of the latest proxied request.
    pub last_status_code: Option<i32>,
    /// Latency of the latest proxied request.
    pub last_latency_ms: Option<i64>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub modified_at: DateTime<Utc>,
}

/// Insert model for newly discovered tools. Request counters use column
/// defaults of zero.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = mcp_tools)]
pub struct NewToolRow {
    /// Owning server.
    pub server_id: i64,
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// Optional tool category.
    pub tool_type: Option<String>,
    /// Optional input schema.
    pub input_schema: Option<Value>,
    /// Optional output schema.
    pub output_schema: Option<Value>,
    /// Availability flag.
    pub is_available: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub modified_at: DateTime<Utc>,
}

/// Query result row for server history.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = server_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ServerHistoryRow {
    /// Row identifier.
    pub id: i64,
    /// Observed server.
    pub server_id: i64,
    /// Whether the probe succeeded.
    pub observed_up: bool,
    /// Tools discovered during the check.
    pub tool_count: i32,
    /// Observation timestamp.
    pub checked_at: DateTime<Utc>,
}

/// Insert model for server history.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = server_history)]
pub struct NewServerHistoryRow {
    /// Observed server.
    pub server_id: i64,
    /// Whether the probe succeeded.
    pub observed_up: bool,
    /// Tools discovered during the check.
    pub tool_count: i32,
    /// Observation timestamp.
    pub checked_at: DateTime<Utc>,
}

/// Query result row for tool history.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tool_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ToolHistoryRow {
    /// Row identifier.
    pub id: i64,
    /// Observed tool.
    pub tool_id: i64,
    /// Availability at the time of the check.
    pub is_available: bool,
    /// Observation timestamp.
    pub checked_at: DateTime<Utc>,
}

/// Insert model for tool history.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tool_history)]
pub struct NewToolHistoryRow {
    /// Observed tool.
    pub tool_id: i64,
    /// Availability at the time of the check.
    pub is_available: bool,
    /// Observation timestamp.
    pub checked_at: DateTime<Utc>,
}
