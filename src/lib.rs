//! Vigil: availability monitoring for MCP servers.
//!
//! Vigil periodically probes every registered MCP server, discovers its tool
//! catalog through the JSON-RPC `tools/list` method, reconciles the catalog
//! against stored tool records, and appends availability history from which
//! uptime and per-tool availability percentages are derived.
//!
//! # Architecture
//!
//! Vigil follows hexagonal architecture principles:
//!
//! - **Domain**: Pure monitoring types with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for storage and network access
//! - **Adapters**: In-memory, `PostgreSQL`, and HTTP implementations
//!
//! # Modules
//!
//! - [`monitor`]: Sweep pipeline, scheduler, and their collaborators
//! - [`config`]: Environment-driven settings for the binary
//! - [`telemetry`]: Tracing subscriber installation

pub mod config;
pub mod monitor;
pub mod telemetry;
