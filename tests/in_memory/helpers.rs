//! Shared fixtures for in-memory monitor integration tests.

use chrono::{TimeZone, Utc};
use rstest::fixture;
use std::sync::Arc;
use vigil::monitor::{
    adapters::{
        InMemoryServerHost,
        memory::{
            InMemoryCredentialStore, InMemoryHistoryStore, InMemoryServerRegistry,
            InMemoryToolCatalog, SteppingClock,
        },
    },
    domain::{BaseUrl, MonitoredServer, OwnerId, ServerId, ToolDescriptor, ToolRecord},
    ports::ToolCatalogRepository,
    services::{MonitorPorts, MonitorSweep, SweepSettings},
};

/// Sweep wired entirely to in-memory adapters.
pub type TestSweep = MonitorSweep<
    InMemoryServerRegistry,
    InMemoryServerHost,
    InMemoryCredentialStore,
    InMemoryToolCatalog,
    InMemoryHistoryStore<SteppingClock>,
    SteppingClock,
>;

/// In-memory fleet plus the sweep observing it.
pub struct MonitorHarness {
    pub registry: Arc<InMemoryServerRegistry>,
    pub host: Arc<InMemoryServerHost>,
    pub credentials: Arc<InMemoryCredentialStore>,
    pub catalog: Arc<InMemoryToolCatalog>,
    pub history: Arc<InMemoryHistoryStore<SteppingClock>>,
    pub clock: Arc<SteppingClock>,
    pub sweep: TestSweep,
}

impl MonitorHarness {
    /// Wires a harness with the given sweep settings.
    pub fn with_settings(settings: SweepSettings) -> Self {
        let start = Utc
            .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
            .single()
            .expect("valid start time");
        let clock = Arc::new(SteppingClock::starting_at(start));
        let registry = Arc::new(InMemoryServerRegistry::new());
        let host = Arc::new(InMemoryServerHost::new());
        let credentials = Arc::new(InMemoryCredentialStore::new());
        let catalog = Arc::new(InMemoryToolCatalog::new());
        let history = Arc::new(InMemoryHistoryStore::new(Arc::clone(&clock)));
        let sweep = MonitorSweep::new(
            MonitorPorts {
                registry: Arc::clone(&registry),
                network: Arc::clone(&host),
                credentials: Arc::clone(&credentials),
                catalog: Arc::clone(&catalog),
                history: Arc::clone(&history),
                clock: Arc::clone(&clock),
            },
            settings,
        );
        Self {
            registry,
            host,
            credentials,
            catalog,
            history,
            clock,
            sweep,
        }
    }

    /// Registers a server at `https://{name}.example.com`.
    pub fn register(&self, name: &str) -> MonitoredServer {
        let base_url =
            BaseUrl::parse(format!("https://{name}.example.com")).expect("valid test URL");
        self.registry
            .register(name, base_url, OwnerId::new("ops").expect("valid owner"))
            .expect("registration should succeed")
    }

    /// Registers a server and serves `names` from it.
    pub fn register_serving(&self, name: &str, names: &[&str]) -> MonitoredServer {
        let server = self.register(name);
        self.host.serve(server.base_url(), tools(names));
        server
    }

    /// Returns the stored tool with `name` on `server_id`.
    pub async fn tool(&self, server_id: ServerId, name: &str) -> ToolRecord {
        self.catalog
            .list_tools(server_id)
            .await
            .expect("catalog listing should succeed")
            .into_iter()
            .find(|tool| tool.name() == name)
            .unwrap_or_else(|| panic!("tool {name} should be stored"))
    }

    /// Returns the names of the tools currently marked available.
    pub async fn available_tool_names(&self, server_id: ServerId) -> Vec<String> {
        self.catalog
            .list_tools(server_id)
            .await
            .expect("catalog listing should succeed")
            .into_iter()
            .filter(ToolRecord::is_available)
            .map(|tool| tool.name().to_owned())
            .collect()
    }
}

/// Provides a harness with default sweep settings.
#[fixture]
pub fn harness() -> MonitorHarness {
    MonitorHarness::with_settings(SweepSettings::default())
}

/// Builds descriptors with a generic description for each name.
pub fn tools(names: &[&str]) -> Vec<ToolDescriptor> {
    names
        .iter()
        .map(|name| ToolDescriptor::new(*name, format!("{name} tool")).expect("valid tool name"))
        .collect()
}
