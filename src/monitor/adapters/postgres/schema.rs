//! Diesel schema for monitor persistence.

diesel::table! {
    /// Registered MCP servers. Written by the registration flow.
    monitored_servers (id) {
        /// Server identifier.
        id -> Int8,
        /// Display name.
        #[max_length = 255]
        name -> Varchar,
        /// Base URL used for probing and discovery.
        base_url -> Text,
        /// Owning identity.
        #[max_length = 255]
        owner -> Varchar,
        /// Monitor interval in seconds.
        monitor_interval_secs -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// One stored credential per server.
    server_credentials (server_id) {
        /// Owning server.
        server_id -> Int8,
        /// Header scheme, `Bearer` or a custom header name.
        #[max_length = 100]
        header_scheme -> Varchar,
        /// Access token.
        access_token -> Text,
        /// Optional refresh token.
        refresh_token -> Nullable<Text>,
        /// Optional expiry.
        expires_at -> Nullable<Timestamptz>,
        /// Optional OAuth client metadata as JSONB.
        oauth_client -> Nullable<Jsonb>,
    }
}

diesel::table! {
    /// Tool catalog, unique on `(server_id, name)`.
    mcp_tools (id) {
        /// Tool identifier.
        id -> Int8,
        /// Owning server.
        server_id -> Int8,
        /// Tool name.
        #[max_length = 255]
        name -> Varchar,
        /// Tool description.
        description -> Text,
        /// Optional tool category.
        #[max_length = 100]
        tool_type -> Nullable<Varchar>,
        /// Optional input schema.
        input_schema -> Nullable<Jsonb>,
        /// Optional output schema.
        output_schema -> Nullable<Jsonb>,
        /// Whether the latest discovery reported the tool.
        is_available -> Bool,
        /// Proxied request count.
        total_requests -> Int8,
        /// Successful proxied requests.
        successful_requests -> Int8,
        /// Failed proxied requests.
        failed_requests -> Int8,
        /// Status of the latest proxied request.
        last_status_code -> Nullable<Int4>,
        /// Latency of the latest proxied request.
        last_latency_ms -> Nullable<Int8>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        modified_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only server liveness history.
    server_history (id) {
        /// Row identifier.
        id -> Int8,
        /// Observed server.
        server_id -> Int8,
        /// Whether the probe succeeded.
        observed_up -> Bool,
        /// Tools discovered during the check.
        tool_count -> Int4,
        /// Observation timestamp.
        checked_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only tool availability history.
    tool_history (id) {
        /// Row identifier.
        id -> Int8,
        /// Observed tool.
        tool_id -> Int8,
        /// Availability at the time of the check.
        is_available -> Bool,
        /// Observation timestamp.
        checked_at -> Timestamptz,
    }
}
