//! MCP server monitoring and tool catalog reconciliation.
//!
//! A sweep probes every registered server, fetches its tool catalog with
//! `tools/list`, reconciles the catalog against stored tools, and appends
//! availability history. The module follows hexagonal architecture:
//!
//! - [`domain`]: servers, tools, credentials, history, and sweep reports
//! - [`ports`]: storage and network contracts
//! - [`adapters`]: in-memory, `PostgreSQL`, and HTTP implementations
//! - [`services`]: credential gate, reconciler, ledger, sweep, and scheduler

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
