//! Liveness probe over HTTP GET.

use super::HttpMcpClient;
use crate::monitor::{domain::BaseUrl, ports::ReachabilityProbe};
use async_trait::async_trait;
use tracing::debug;

/// Statuses that prove a server is listening, even if it rejects the GET.
const REACHABLE_STATUSES: std::ops::RangeInclusive<u16> = 200..=499;

#[async_trait]
impl ReachabilityProbe for HttpMcpClient {
    async fn is_reachable(&self, base_url: &BaseUrl) -> bool {
        let response = self
            .http
            .get(base_url.as_url().clone())
            .timeout(self.settings.probe_timeout)
            .send()
            .await;

        match response {
            Ok(answer) => {
                let status = answer.status().as_u16();
                let reachable = REACHABLE_STATUSES.contains(&status);
                debug!(base_url = %base_url, status, reachable, "probe answered");
                reachable
            }
            Err(err) => {
                debug!(
                    base_url = %base_url,
                    reason = %err,
                    timed_out = err.is_timeout(),
                    "probe failed"
                );
                false
            }
        }
    }
}
