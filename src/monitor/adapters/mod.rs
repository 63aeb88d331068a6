//! Adapter implementations for the monitor's ports.

pub mod http;
pub mod memory;
pub mod postgres;

mod runtime;

pub use runtime::InMemoryServerHost;
