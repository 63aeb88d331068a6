//! Monitored server aggregate as seen by the monitor.

use super::{MonitorDomainError, OwnerId, ServerId};
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default interval between two checks of the same server.
pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Validated absolute `http`/`https` base URL of an MCP server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BaseUrl(Url);

impl BaseUrl {
    /// Parses and validates a base URL.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorDomainError`] when the value is empty, cannot be
    /// parsed as an absolute URL, or does not use `http` or `https`.
    pub fn parse(value: impl AsRef<str>) -> Result<Self, MonitorDomainError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(MonitorDomainError::EmptyBaseUrl);
        }

        let url = Url::parse(trimmed).map_err(|err| MonitorDomainError::InvalidBaseUrl {
            url: trimmed.to_owned(),
            reason: err.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(MonitorDomainError::UnsupportedUrlScheme(trimmed.to_owned()));
        }

        if url.host_str().is_none() {
            return Err(MonitorDomainError::InvalidBaseUrl {
                url: trimmed.to_owned(),
                reason: String::from("missing host"),
            });
        }

        Ok(Self(url))
    }

    /// Returns the parsed URL.
    #[must_use]
    pub const fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the URL in serialized form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for BaseUrl {
    type Error = MonitorDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<BaseUrl> for String {
    fn from(value: BaseUrl) -> Self {
        value.0.into()
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A registered MCP server. Read-only to the monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredServer {
    id: ServerId,
    name: String,
    base_url: BaseUrl,
    owner: OwnerId,
    monitor_interval: Duration,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a server from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedServerData {
    /// Persisted identifier.
    pub id: ServerId,
    /// Persisted display name.
    pub name: String,
    /// Persisted base URL.
    pub base_url: BaseUrl,
    /// Persisted owning identity.
    pub owner: OwnerId,
    /// Persisted monitor interval.
    pub monitor_interval: Duration,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl MonitoredServer {
    /// Reconstructs a server from persisted data, validating the name and
    /// interval.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorDomainError::EmptyServerName`] for a blank name and
    /// [`MonitorDomainError::ZeroMonitorInterval`] for a zero interval.
    pub fn from_persisted(data: PersistedServerData) -> Result<Self, MonitorDomainError> {
        let name = data.name.trim().to_owned();
        if name.is_empty() {
            return Err(MonitorDomainError::EmptyServerName);
        }
        if data.monitor_interval.is_zero() {
            return Err(MonitorDomainError::ZeroMonitorInterval);
        }

        Ok(Self {
            id: data.id,
            name,
            base_url: data.base_url,
            owner: data.owner,
            monitor_interval: data.monitor_interval,
            created_at: data.created_at,
            updated_at: data.updated_at,
        })
    }

    /// Returns the server identifier.
    #[must_use]
    pub const fn id(&self) -> ServerId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the base URL.
    #[must_use]
    pub const fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Returns the owning identity.
    #[must_use]
    pub const fn owner(&self) -> &OwnerId {
        &self.owner
    }

    /// Returns the configured monitor interval.
    #[must_use]
    pub const fn monitor_interval(&self) -> Duration {
        self.monitor_interval
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
