//! Error types for monitor domain validation.

use thiserror::Error;

/// Errors returned while constructing monitor domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MonitorDomainError {
    /// The server display name is empty after trimming.
    #[error("monitored server name must not be empty")]
    EmptyServerName,

    /// The base URL is empty after trimming.
    #[error("server base URL must not be empty")]
    EmptyBaseUrl,

    /// The base URL could not be parsed as an absolute URL.
    #[error("server base URL '{url}' is not a valid absolute URL: {reason}")]
    InvalidBaseUrl {
        /// Rejected input.
        url: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// The base URL uses a scheme other than `http` or `https`.
    #[error("server base URL '{0}' must use the http or https scheme")]
    UnsupportedUrlScheme(String),

    /// The owning identity is empty after trimming.
    #[error("server owner identity must not be empty")]
    EmptyOwner,

    /// The monitor interval is zero.
    #[error("monitor interval must be greater than zero")]
    ZeroMonitorInterval,

    /// A tool descriptor name is empty after trimming.
    #[error("tool name must not be empty")]
    EmptyToolName,

    /// A credential carries an empty access token.
    #[error("credential access token must not be empty")]
    EmptyAccessToken,
}
