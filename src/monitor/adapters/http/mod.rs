//! reqwest-backed reachability probe and `tools/list` discovery.

mod discovery;
mod probe;
pub mod protocol;

pub use discovery::{MAX_DISCOVERY_BODY_BYTES, RETAINED_ERROR_BODY_CHARS};

use std::time::Duration;

/// Default bound on a reachability probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bound on a discovery call.
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-request timeouts for [`HttpMcpClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpClientSettings {
    /// Bound on the reachability GET.
    pub probe_timeout: Duration,
    /// Bound on the `tools/list` POST.
    pub discovery_timeout: Duration,
}

impl Default for HttpClientSettings {
    fn default() -> Self {
        Self {
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
        }
    }
}

/// HTTP client implementing both outbound network ports.
#[derive(Debug, Clone)]
pub struct HttpMcpClient {
    http: reqwest::Client,
    settings: HttpClientSettings,
}

impl HttpMcpClient {
    /// Builds a client with the given timeouts.
    ///
    /// # Errors
    ///
    /// Returns the reqwest builder error when the TLS backend cannot be
    /// initialised.
    pub fn new(settings: HttpClientSettings) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, settings })
    }

    /// Returns the configured timeouts.
    #[must_use]
    pub const fn settings(&self) -> HttpClientSettings {
        self.settings
    }
}
