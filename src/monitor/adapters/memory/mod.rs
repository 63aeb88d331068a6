//! In-memory implementations of the monitor's storage ports.

mod catalog;
mod clock;
mod credentials;
mod history;
mod registry;

pub use catalog::InMemoryToolCatalog;
pub use clock::SteppingClock;
pub use credentials::InMemoryCredentialStore;
pub use history::InMemoryHistoryStore;
pub use registry::InMemoryServerRegistry;
