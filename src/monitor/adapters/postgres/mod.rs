//! `PostgreSQL` adapters for monitor persistence.

mod models;
mod repository;
mod schema;

pub use repository::{MonitorPgPool, PostgresMonitorStore, connect_pool};
