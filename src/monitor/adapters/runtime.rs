//! Scriptable in-memory stand-in for the fleet of MCP servers.

use crate::monitor::{
    domain::{AuthHeaders, BaseUrl, ServerId, ToolDescriptor},
    ports::{DiscoveryError, DiscoveryResult, ReachabilityProbe, ToolDiscovery},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// In-memory server host implementing both network ports.
///
/// Servers are addressed by base URL. Unknown URLs are unreachable. No
/// sockets are opened, which keeps sweep tests deterministic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryServerHost {
    state: Arc<RwLock<HostState>>,
}

#[derive(Debug, Default)]
struct HostState {
    servers: HashMap<String, HostedServer>,
}

#[derive(Debug, Default)]
struct HostedServer {
    reachable: bool,
    latency: Duration,
    tools: Vec<ToolDescriptor>,
    failure: Option<HostedFailure>,
    required_header: Option<(String, String)>,
    probe_calls: usize,
    discovery_calls: usize,
    last_headers: Option<AuthHeaders>,
}

#[derive(Debug, Clone)]
enum HostedFailure {
    Status { status: u16, body: String },
    Transport(String),
}

impl InMemoryServerHost {
    /// Creates a host with no servers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes a server reachable and serving `tools`, clearing any failure.
    pub fn serve(&self, base_url: &BaseUrl, tools: Vec<ToolDescriptor>) {
        self.with_server(base_url, |server| {
            server.reachable = true;
            server.tools = tools;
            server.failure = None;
        });
    }

    /// Changes whether the server answers the reachability probe.
    pub fn set_reachable(&self, base_url: &BaseUrl, reachable: bool) {
        self.with_server(base_url, |server| server.reachable = reachable);
    }

    /// Delays every probe of the server by `latency`.
    pub fn set_latency(&self, base_url: &BaseUrl, latency: Duration) {
        self.with_server(base_url, |server| server.latency = latency);
    }

    /// Makes discovery answer with `status` and `body`.
    pub fn fail_discovery(&self, base_url: &BaseUrl, status: u16, body: impl Into<String>) {
        let failure = HostedFailure::Status {
            status,
            body: body.into(),
        };
        self.with_server(base_url, |server| server.failure = Some(failure));
    }

    /// Makes discovery fail before any response arrives.
    pub fn drop_discovery(&self, base_url: &BaseUrl, reason: impl Into<String>) {
        let failure = HostedFailure::Transport(reason.into());
        self.with_server(base_url, |server| server.failure = Some(failure));
    }

    /// Rejects discovery with `401` unless the header is present with `value`.
    pub fn require_header(&self, base_url: &BaseUrl, name: impl Into<String>, value: impl Into<String>) {
        let required = (name.into(), value.into());
        self.with_server(base_url, |server| server.required_header = Some(required));
    }

    /// Returns how many times the server was probed.
    #[must_use]
    pub fn probe_calls(&self, base_url: &BaseUrl) -> usize {
        self.read_server(base_url, |server| server.probe_calls)
            .unwrap_or_default()
    }

    /// Returns how many discovery calls reached the server.
    #[must_use]
    pub fn discovery_calls(&self, base_url: &BaseUrl) -> usize {
        self.read_server(base_url, |server| server.discovery_calls)
            .unwrap_or_default()
    }

    /// Returns the headers sent with the most recent discovery call.
    #[must_use]
    pub fn last_headers(&self, base_url: &BaseUrl) -> Option<AuthHeaders> {
        self.read_server(base_url, |server| server.last_headers.clone())
            .flatten()
    }

    fn with_server<T>(&self, base_url: &BaseUrl, apply: impl FnOnce(&mut HostedServer) -> T) -> T {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        apply(state.servers.entry(base_url.as_str().to_owned()).or_default())
    }

    fn read_server<T>(&self, base_url: &BaseUrl, read: impl FnOnce(&HostedServer) -> T) -> Option<T> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.servers.get(base_url.as_str()).map(read)
    }
}

#[async_trait]
impl ReachabilityProbe for InMemoryServerHost {
    async fn is_reachable(&self, base_url: &BaseUrl) -> bool {
        let Some((reachable, latency)) = self.with_existing(base_url, |server| {
            server.probe_calls = server.probe_calls.saturating_add(1);
            (server.reachable, server.latency)
        }) else {
            return false;
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        reachable
    }
}

#[async_trait]
impl ToolDiscovery for InMemoryServerHost {
    async fn fetch_tools(
        &self,
        server_id: ServerId,
        base_url: &BaseUrl,
        headers: &AuthHeaders,
    ) -> DiscoveryResult<Vec<ToolDescriptor>> {
        let outcome = self.with_existing(base_url, |server| {
            server.discovery_calls = server.discovery_calls.saturating_add(1);
            server.last_headers = Some(headers.clone());
            if let Some((name, value)) = &server.required_header
                && headers.get(name) != Some(value.as_str())
            {
                return Err(HostedFailure::Status {
                    status: 401,
                    body: String::from(r#"{"error":"unauthorized"}"#),
                });
            }
            server.failure.clone().map_or_else(|| Ok(server.tools.clone()), Err)
        });

        match outcome {
            Some(Ok(tools)) => Ok(tools),
            Some(Err(HostedFailure::Status { status, body })) => Err(DiscoveryError::Status {
                server_id,
                status,
                body,
            }),
            Some(Err(HostedFailure::Transport(reason))) => Err(DiscoveryError::transport(
                server_id,
                std::io::Error::other(reason),
            )),
            None => Err(DiscoveryError::transport(
                server_id,
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "no server at URL"),
            )),
        }
    }
}

impl InMemoryServerHost {
    fn with_existing<T>(
        &self,
        base_url: &BaseUrl,
        apply: impl FnOnce(&mut HostedServer) -> T,
    ) -> Option<T> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.servers.get_mut(base_url.as_str()).map(apply)
    }
}
