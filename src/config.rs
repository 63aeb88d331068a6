//! Environment-driven configuration for the monitor binary.

use crate::monitor::{
    adapters::http::HttpClientSettings,
    services::{ScheduleSettings, SweepSettings},
};
use std::env;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DATABASE_URL: &str = "VIGIL_DATABASE_URL";
const SWEEP_INTERVAL_SECS: &str = "VIGIL_SWEEP_INTERVAL_SECS";
const PROBE_TIMEOUT_SECS: &str = "VIGIL_PROBE_TIMEOUT_SECS";
const DISCOVERY_TIMEOUT_SECS: &str = "VIGIL_DISCOVERY_TIMEOUT_SECS";
const SERVER_TIMEOUT_SECS: &str = "VIGIL_SERVER_TIMEOUT_SECS";
const CREDENTIAL_BUFFER_MINUTES: &str = "VIGIL_CREDENTIAL_BUFFER_MINUTES";
const MAX_CONCURRENCY: &str = "VIGIL_MAX_CONCURRENCY";
const DRAIN_TIMEOUT_SECS: &str = "VIGIL_DRAIN_TIMEOUT_SECS";
const DB_POOL_SIZE: &str = "VIGIL_DB_POOL_SIZE";
const LOG_JSON: &str = "VIGIL_LOG_JSON";

/// Largest accepted credential expiry buffer: one week.
const MAX_CREDENTIAL_BUFFER_MINUTES: i64 = 7 * 24 * 60;

/// Errors raised while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The database URL is unset or blank.
    #[error("VIGIL_DATABASE_URL is required")]
    MissingDatabaseUrl,
    /// The sweep interval is not a positive number of seconds.
    #[error("invalid VIGIL_SWEEP_INTERVAL_SECS: {0}")]
    InvalidSweepInterval(String),
    /// The probe timeout is not a positive number of seconds.
    #[error("invalid VIGIL_PROBE_TIMEOUT_SECS: {0}")]
    InvalidProbeTimeout(String),
    /// The discovery timeout is not a positive number of seconds.
    #[error("invalid VIGIL_DISCOVERY_TIMEOUT_SECS: {0}")]
    InvalidDiscoveryTimeout(String),
    /// The per-server timeout is not a positive number of seconds.
    #[error("invalid VIGIL_SERVER_TIMEOUT_SECS: {0}")]
    InvalidServerTimeout(String),
    /// The credential expiry buffer is not a whole number of minutes
    /// between zero and one week.
    #[error("invalid VIGIL_CREDENTIAL_BUFFER_MINUTES: {0}")]
    InvalidCredentialBuffer(String),
    /// The concurrency bound is not a positive integer.
    #[error("invalid VIGIL_MAX_CONCURRENCY: {0}")]
    InvalidMaxConcurrency(String),
    /// The drain timeout is not a positive number of seconds.
    #[error("invalid VIGIL_DRAIN_TIMEOUT_SECS: {0}")]
    InvalidDrainTimeout(String),
    /// The pool size is not a positive integer.
    #[error("invalid VIGIL_DB_POOL_SIZE: {0}")]
    InvalidDbPoolSize(String),
    /// The log format flag is not a boolean.
    #[error("invalid VIGIL_LOG_JSON: {0}")]
    InvalidLogJson(String),
}

/// Monitor configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// `PostgreSQL` connection string.
    pub database_url: Option<String>,
    /// Delay between scheduled sweeps.
    pub sweep_interval: Duration,
    /// Bound on one reachability probe.
    pub probe_timeout: Duration,
    /// Bound on one discovery call.
    pub discovery_timeout: Duration,
    /// Bound on one server's whole pipeline.
    pub server_timeout: Duration,
    /// Window before expiry in which credentials count as expired.
    pub credential_expiry_buffer: chrono::Duration,
    /// Servers checked concurrently within a sweep.
    pub max_concurrency: NonZeroUsize,
    /// Grace period for an in-flight sweep at shutdown.
    pub drain_timeout: Duration,
    /// Maximum pooled database connections.
    pub db_pool_size: u32,
    /// Emit JSON log lines instead of human-readable ones.
    pub log_json: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            sweep_interval: Duration::from_secs(1800),
            probe_timeout: Duration::from_secs(5),
            discovery_timeout: Duration::from_secs(10),
            server_timeout: Duration::from_secs(30),
            credential_expiry_buffer: chrono::Duration::minutes(5),
            max_concurrency: NonZeroUsize::MIN,
            drain_timeout: Duration::from_secs(60),
            db_pool_size: 4,
            log_json: false,
        }
    }
}

impl MonitorConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first invalid variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads configuration through `lookup`, falling back to defaults for
    /// unset or blank variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first invalid variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let credential_buffer_minutes: i64 = parse_or(
            read(CREDENTIAL_BUFFER_MINUTES),
            defaults.credential_expiry_buffer.num_minutes(),
            ConfigError::InvalidCredentialBuffer,
        )?;
        let credential_expiry_buffer = (0..=MAX_CREDENTIAL_BUFFER_MINUTES)
            .contains(&credential_buffer_minutes)
            .then(|| chrono::Duration::try_minutes(credential_buffer_minutes))
            .flatten()
            .ok_or_else(|| {
                ConfigError::InvalidCredentialBuffer(credential_buffer_minutes.to_string())
            })?;

        Ok(Self {
            database_url: read(DATABASE_URL),
            sweep_interval: positive_secs(
                read(SWEEP_INTERVAL_SECS),
                defaults.sweep_interval,
                ConfigError::InvalidSweepInterval,
            )?,
            probe_timeout: positive_secs(
                read(PROBE_TIMEOUT_SECS),
                defaults.probe_timeout,
                ConfigError::InvalidProbeTimeout,
            )?,
            discovery_timeout: positive_secs(
                read(DISCOVERY_TIMEOUT_SECS),
                defaults.discovery_timeout,
                ConfigError::InvalidDiscoveryTimeout,
            )?,
            server_timeout: positive_secs(
                read(SERVER_TIMEOUT_SECS),
                defaults.server_timeout,
                ConfigError::InvalidServerTimeout,
            )?,
            credential_expiry_buffer,
            max_concurrency: parse_or(
                read(MAX_CONCURRENCY),
                defaults.max_concurrency,
                ConfigError::InvalidMaxConcurrency,
            )?,
            drain_timeout: positive_secs(
                read(DRAIN_TIMEOUT_SECS),
                defaults.drain_timeout,
                ConfigError::InvalidDrainTimeout,
            )?,
            db_pool_size: positive_u32(read(DB_POOL_SIZE), defaults.db_pool_size)?,
            log_json: parse_flag(read(LOG_JSON), defaults.log_json)?,
        })
    }

    /// Returns the database URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingDatabaseUrl`] when it was not set.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::MissingDatabaseUrl)
    }

    /// Returns the sweep tunables.
    #[must_use]
    pub const fn sweep_settings(&self) -> SweepSettings {
        SweepSettings {
            server_timeout: self.server_timeout,
            max_concurrency: self.max_concurrency,
            credential_expiry_buffer: self.credential_expiry_buffer,
        }
    }

    /// Returns the scheduler cadence.
    #[must_use]
    pub const fn schedule_settings(&self) -> ScheduleSettings {
        ScheduleSettings {
            interval: self.sweep_interval,
            drain_timeout: self.drain_timeout,
        }
    }

    /// Returns the HTTP client timeouts.
    #[must_use]
    pub const fn http_settings(&self) -> HttpClientSettings {
        HttpClientSettings {
            probe_timeout: self.probe_timeout,
            discovery_timeout: self.discovery_timeout,
        }
    }
}

fn parse_or<T>(
    raw: Option<String>,
    default: T,
    invalid: fn(String) -> ConfigError,
) -> Result<T, ConfigError>
where
    T: FromStr,
{
    raw.map_or(Ok(default), |value| {
        value.parse::<T>().map_err(|_| invalid(value))
    })
}

fn positive_secs(
    raw: Option<String>,
    default: Duration,
    invalid: fn(String) -> ConfigError,
) -> Result<Duration, ConfigError> {
    let secs: u64 = parse_or(raw, default.as_secs(), invalid)?;
    if secs == 0 {
        return Err(invalid(String::from("0")));
    }
    Ok(Duration::from_secs(secs))
}

fn positive_u32(raw: Option<String>, default: u32) -> Result<u32, ConfigError> {
    let size: u32 = parse_or(raw, default, ConfigError::InvalidDbPoolSize)?;
    if size == 0 {
        return Err(ConfigError::InvalidDbPoolSize(String::from("0")));
    }
    Ok(size)
}

fn parse_flag(raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(value) = raw else {
        return Ok(default);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidLogJson(value)),
    }
}
