//! Expiry-aware construction of outbound authorization headers.

use crate::monitor::{
    domain::{AuthHeaders, Credential, CredentialStatus, ServerId},
    ports::{CredentialStore, CredentialStoreResult},
};
use chrono::Duration;
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, warn};

/// Default window before `expires_at` in which a credential counts as expired.
pub const DEFAULT_EXPIRY_BUFFER_MINUTES: i64 = 5;

/// Decides whether and how to attach credentials to discovery calls.
///
/// Expired credentials are reported but still used: refreshing tokens is the
/// job of an out-of-band collaborator, and the downstream call is allowed to
/// fail with an authorization error.
#[derive(Clone)]
pub struct CredentialGate<S, C>
where
    S: CredentialStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    expiry_buffer: Duration,
}

impl<S, C> CredentialGate<S, C>
where
    S: CredentialStore,
    C: Clock + Send + Sync,
{
    /// Creates a gate with the default five-minute expiry buffer.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self::with_expiry_buffer(store, clock, Duration::minutes(DEFAULT_EXPIRY_BUFFER_MINUTES))
    }

    /// Creates a gate with an explicit expiry buffer.
    #[must_use]
    pub const fn with_expiry_buffer(store: Arc<S>, clock: Arc<C>, expiry_buffer: Duration) -> Self {
        Self {
            store,
            clock,
            expiry_buffer,
        }
    }

    /// Returns the configured expiry buffer.
    #[must_use]
    pub const fn expiry_buffer(&self) -> Duration {
        self.expiry_buffer
    }

    /// Classifies the stored credential for a server.
    ///
    /// # Errors
    ///
    /// Returns credential store errors.
    pub async fn credential_status(
        &self,
        server_id: ServerId,
    ) -> CredentialStoreResult<CredentialStatus> {
        let credential = self.store.get_credential(server_id).await?;
        Ok(credential.map_or(CredentialStatus::Absent, |stored| self.classify(&stored)))
    }

    /// Resolves the headers to send with a server's discovery call.
    ///
    /// Servers without a credential get an empty header set and are called
    /// unauthenticated.
    ///
    /// # Errors
    ///
    /// Returns credential store errors.
    pub async fn resolve_auth_headers(
        &self,
        server_id: ServerId,
    ) -> CredentialStoreResult<AuthHeaders> {
        let Some(credential) = self.store.get_credential(server_id).await? else {
            debug!(server_id = %server_id, "no stored credential, calling unauthenticated");
            return Ok(AuthHeaders::empty());
        };

        if self.classify(&credential) == CredentialStatus::Expired {
            warn!(
                server_id = %server_id,
                expires_at = ?credential.expires_at(),
                has_refresh_token = credential.refresh_token().is_some(),
                "credential expired or inside expiry buffer, using stale token"
            );
        }

        Ok(credential.auth_headers())
    }

    fn classify(&self, credential: &Credential) -> CredentialStatus {
        if credential.is_expired_at(self.clock.utc(), self.expiry_buffer) {
            CredentialStatus::Expired
        } else {
            CredentialStatus::Valid
        }
    }
}
