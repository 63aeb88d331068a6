//! Stored server credentials and outbound authorization headers.

use super::{MonitorDomainError, ServerId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Scheme used when a credential does not name one.
pub const DEFAULT_HEADER_SCHEME: &str = "Bearer";

/// Header carrying the `<scheme> <token>` pair.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// OAuth client metadata stored with a credential.
///
/// The monitor does not run refresh grants; the fields are carried so that
/// an out-of-band refresher can act on them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthClientMetadata {
    /// OAuth client identifier.
    pub client_id: Option<String>,
    /// Token endpoint used for refresh grants.
    pub token_endpoint: Option<String>,
    /// Granted scopes.
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// Credential stored for a monitored server.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    server_id: ServerId,
    header_scheme: String,
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    oauth_client: Option<OAuthClientMetadata>,
}

impl Credential {
    /// Creates a credential with the given header scheme and access token.
    ///
    /// A blank scheme falls back to [`DEFAULT_HEADER_SCHEME`].
    ///
    /// # Errors
    ///
    /// Returns [`MonitorDomainError::EmptyAccessToken`] when the token is
    /// blank.
    pub fn new(
        server_id: ServerId,
        header_scheme: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self, MonitorDomainError> {
        let token = access_token.into().trim().to_owned();
        if token.is_empty() {
            return Err(MonitorDomainError::EmptyAccessToken);
        }

        let scheme = header_scheme.into().trim().to_owned();
        Ok(Self {
            server_id,
            header_scheme: if scheme.is_empty() {
                DEFAULT_HEADER_SCHEME.to_owned()
            } else {
                scheme
            },
            access_token: token,
            refresh_token: None,
            expires_at: None,
            oauth_client: None,
        })
    }

    /// Sets the refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Sets the expiry timestamp.
    #[must_use]
    pub const fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Sets OAuth client metadata.
    #[must_use]
    pub fn with_oauth_client(mut self, oauth_client: OAuthClientMetadata) -> Self {
        self.oauth_client = Some(oauth_client);
        self
    }

    /// Returns the owning server identifier.
    #[must_use]
    pub const fn server_id(&self) -> ServerId {
        self.server_id
    }

    /// Returns the header scheme.
    #[must_use]
    pub fn header_scheme(&self) -> &str {
        &self.header_scheme
    }

    /// Returns the access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the refresh token, if any.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Returns the expiry timestamp, if any.
    #[must_use]
    pub const fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns the OAuth client metadata, if any.
    #[must_use]
    pub const fn oauth_client(&self) -> Option<&OAuthClientMetadata> {
        self.oauth_client.as_ref()
    }

    /// Returns whether the credential expires before `now + buffer`.
    ///
    /// Credentials without an expiry never expire. A buffer reaching past the
    /// representable time range covers every expiry.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>, buffer: Duration) -> bool {
        self.expires_at.is_some_and(|expires_at| {
            now.checked_add_signed(buffer)
                .is_none_or(|deadline| expires_at < deadline)
        })
    }

    /// Builds the outbound authorization headers for this credential.
    #[must_use]
    pub fn auth_headers(&self) -> AuthHeaders {
        let mut headers = AuthHeaders::empty();
        headers.insert(
            AUTHORIZATION_HEADER,
            format!("{} {}", self.header_scheme, self.access_token),
        );
        if scheme_names_custom_header(&self.header_scheme) {
            headers.insert(self.header_scheme.clone(), self.access_token.clone());
        }
        headers
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Credential")
            .field("server_id", &self.server_id)
            .field("header_scheme", &self.header_scheme)
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .field("oauth_client", &self.oauth_client)
            .finish()
    }
}

/// Returns whether a header scheme looks like a custom header name.
///
/// Providers such as `X-API-Key` expect the raw token in a header named
/// after the scheme.
#[must_use]
pub fn scheme_names_custom_header(scheme: &str) -> bool {
    let lowered = scheme.to_ascii_lowercase();
    lowered.contains('-')
        || lowered.starts_with("x-")
        || lowered.contains("api")
        || lowered.contains("token")
}

/// Expiry status of a server's stored credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialStatus {
    /// No credential is stored; calls are unauthenticated.
    Absent,
    /// A credential is stored and outside the expiry buffer.
    Valid,
    /// A credential is stored but expires within the buffer window.
    Expired,
}

impl CredentialStatus {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Valid => "valid",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for CredentialStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Header name/value pairs attached to outbound discovery calls.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthHeaders(BTreeMap<String, String>);

impl AuthHeaders {
    /// Creates an empty header set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Inserts or replaces a header.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Returns the value of a header, if set.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Returns whether no headers are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates header name/value pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl fmt::Debug for AuthHeaders {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_list()
            .entries(self.0.keys())
            .finish()
    }
}
