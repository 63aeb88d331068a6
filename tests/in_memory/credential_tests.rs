//! Credential resolution as observed by the monitored servers.

use super::helpers::{MonitorHarness, harness};
use chrono::Duration;
use rstest::rstest;
use vigil::monitor::domain::{AUTHORIZATION_HEADER, Credential, CredentialStatus, ServerCheckOutcome};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn server_without_credential_is_called_unauthenticated(harness: MonitorHarness) {
    let server = harness.register_serving("public", &["a"]);

    harness.sweep.run_sweep_once().await;

    let headers = harness
        .host
        .last_headers(server.base_url())
        .expect("discovery should have been called");
    assert!(headers.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stored_bearer_token_authorizes_discovery(harness: MonitorHarness) {
    let server = harness.register_serving("private", &["a", "b"]);
    harness
        .host
        .require_header(server.base_url(), AUTHORIZATION_HEADER, "Bearer secret");
    harness
        .credentials
        .put(Credential::new(server.id(), "Bearer", "secret").expect("valid credential"))
        .expect("credential should be stored");

    let report = harness.sweep.run_sweep_once().await;

    assert_eq!(
        report.server(server.id()).expect("reported").outcome.tool_count(),
        2
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn expired_credential_is_still_sent(harness: MonitorHarness) {
    let server = harness.register_serving("stale", &["a"]);
    harness
        .host
        .require_header(server.base_url(), AUTHORIZATION_HEADER, "Bearer old-token");
    let expired = Credential::new(server.id(), "Bearer", "old-token")
        .expect("valid credential")
        .with_refresh_token("refresh-me")
        .with_expires_at(harness.clock.peek() - Duration::hours(1));
    harness
        .credentials
        .put(expired)
        .expect("credential should be stored");

    assert_eq!(
        harness
            .sweep
            .credential_gate()
            .credential_status(server.id())
            .await
            .expect("status lookup should succeed"),
        CredentialStatus::Expired
    );

    let report = harness.sweep.run_sweep_once().await;

    assert!(matches!(
        report.server(server.id()).expect("reported").outcome,
        ServerCheckOutcome::Up { .. }
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn credential_inside_expiry_buffer_counts_as_expired(harness: MonitorHarness) {
    let server = harness.register("soon");
    let expiring = Credential::new(server.id(), "Bearer", "token")
        .expect("valid credential")
        .with_expires_at(harness.clock.peek() + Duration::minutes(2));
    harness
        .credentials
        .put(expiring)
        .expect("credential should be stored");

    let status = harness
        .sweep
        .credential_gate()
        .credential_status(server.id())
        .await
        .expect("status lookup should succeed");

    assert_eq!(status, CredentialStatus::Expired);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_credential_is_discovery_failure(harness: MonitorHarness) {
    let server = harness.register_serving("locked", &["a"]);
    harness
        .host
        .require_header(server.base_url(), AUTHORIZATION_HEADER, "Bearer expected");
    harness
        .credentials
        .put(Credential::new(server.id(), "Bearer", "wrong").expect("valid credential"))
        .expect("credential should be stored");

    let report = harness.sweep.run_sweep_once().await;

    let outcome = &report.server(server.id()).expect("reported").outcome;
    assert!(matches!(outcome, ServerCheckOutcome::DiscoveryFailed { .. }));
    assert!(outcome.observed_up());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn api_key_scheme_sends_custom_header(harness: MonitorHarness) {
    let server = harness.register_serving("keyed", &["a"]);
    harness
        .host
        .require_header(server.base_url(), "X-API-Key", "k-123");
    harness
        .credentials
        .put(Credential::new(server.id(), "X-API-Key", "k-123").expect("valid credential"))
        .expect("credential should be stored");

    harness.sweep.run_sweep_once().await;

    let headers = harness
        .host
        .last_headers(server.base_url())
        .expect("discovery should have been called");
    assert_eq!(headers.get("X-API-Key"), Some("k-123"));
    assert_eq!(headers.get(AUTHORIZATION_HEADER), Some("X-API-Key k-123"));
}
