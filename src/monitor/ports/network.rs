//! Outbound network ports: liveness probing and tool discovery.

use crate::monitor::domain::{AuthHeaders, BaseUrl, ServerId, ToolDescriptor};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for tool discovery.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Binary liveness check against a server's base URL.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    /// Returns whether the server answered within the probe timeout.
    ///
    /// Implementations never fail: transport errors collapse to `false`.
    async fn is_reachable(&self, base_url: &BaseUrl) -> bool;
}

/// Fetches the current tool catalog from a reachable server.
#[async_trait]
pub trait ToolDiscovery: Send + Sync {
    /// Calls `tools/list` on the server and decodes the result.
    async fn fetch_tools(
        &self,
        server_id: ServerId,
        base_url: &BaseUrl,
        headers: &AuthHeaders,
    ) -> DiscoveryResult<Vec<ToolDescriptor>>;
}

/// Errors returned when a server's catalog cannot be read.
#[derive(Debug, Clone, Error)]
pub enum DiscoveryError {
    /// The request could not be sent or timed out.
    #[error("discovery request to server {server_id} failed: {cause}")]
    Transport {
        /// Target server.
        server_id: ServerId,
        /// Underlying transport error.
        cause: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// The server answered with a non-success status.
    #[error("server {server_id} answered tools/list with status {status}")]
    Status {
        /// Target server.
        server_id: ServerId,
        /// HTTP status code.
        status: u16,
        /// Leading excerpt of the response body.
        body: String,
    },

    /// The response body was not a usable `tools/list` result.
    #[error("server {server_id} returned a malformed tools/list response: {reason}")]
    Malformed {
        /// Target server.
        server_id: ServerId,
        /// HTTP status code.
        status: u16,
        /// Leading excerpt of the response body.
        body: String,
        /// Decoder diagnostic.
        reason: String,
    },

    /// A resolved authorization header could not be encoded.
    #[error("server {server_id} credential produced an invalid header '{header}'")]
    InvalidHeader {
        /// Target server.
        server_id: ServerId,
        /// Offending header name.
        header: String,
    },
}

impl DiscoveryError {
    /// Wraps a transport failure.
    pub fn transport(
        server_id: ServerId,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            server_id,
            cause: Arc::new(err),
        }
    }

    /// Returns the HTTP status, when the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::Malformed { status, .. } => Some(*status),
            Self::Transport { .. } | Self::InvalidHeader { .. } => None,
        }
    }

    /// Returns the retained body excerpt, when the server answered.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } | Self::Malformed { body, .. } => Some(body),
            Self::Transport { .. } | Self::InvalidHeader { .. } => None,
        }
    }
}
