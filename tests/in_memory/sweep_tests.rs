//! End-to-end sweep outcomes over the in-memory fleet.

use super::helpers::{MonitorHarness, harness, tools};
use rstest::rstest;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use vigil::monitor::{
    domain::{ServerCheckOutcome, ServerId},
    services::SweepSettings,
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reachable_server_is_recorded_up_with_discovered_tools(harness: MonitorHarness) {
    let server = harness.register_serving("alpha", &["search", "fetch", "summarize"]);

    let report = harness.sweep.run_sweep_once().await;

    let server_report = report.server(server.id()).expect("server should be reported");
    let ServerCheckOutcome::Up { counts } = server_report.outcome else {
        panic!("expected up outcome, got {:?}", server_report.outcome);
    };
    assert_eq!(counts.discovered, 3);
    assert_eq!(counts.added, 3);
    assert!(server_report.snapshot_recorded);

    let snapshots = harness.history.server_snapshots(server.id());
    let [snapshot] = snapshots.as_slice() else {
        panic!("expected one snapshot, got {snapshots:?}");
    };
    assert!(snapshot.observed_up);
    assert_eq!(snapshot.tool_count, 3);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unreachable_server_is_recorded_down_without_discovery(harness: MonitorHarness) {
    let server = harness.register("offline");

    let report = harness.sweep.run_sweep_once().await;

    let server_report = report.server(server.id()).expect("server should be reported");
    assert_eq!(server_report.outcome, ServerCheckOutcome::Down);
    assert_eq!(harness.host.discovery_calls(server.base_url()), 0);

    let snapshots = harness.history.server_snapshots(server.id());
    let [snapshot] = snapshots.as_slice() else {
        panic!("expected one snapshot, got {snapshots:?}");
    };
    assert!(!snapshot.observed_up);
    assert_eq!(snapshot.tool_count, 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn discovery_failure_is_up_with_zero_tools_and_keeps_catalog(harness: MonitorHarness) {
    let server = harness.register_serving("flaky", &["a", "b"]);
    harness.sweep.run_sweep_once().await;
    harness
        .host
        .fail_discovery(server.base_url(), 500, "internal error");

    let report = harness.sweep.run_sweep_once().await;

    let server_report = report.server(server.id()).expect("server should be reported");
    assert!(matches!(
        server_report.outcome,
        ServerCheckOutcome::DiscoveryFailed { .. }
    ));
    let latest = harness
        .history
        .server_snapshots(server.id())
        .last()
        .copied()
        .expect("snapshot should exist");
    assert!(latest.observed_up);
    assert_eq!(latest.tool_count, 0);
    assert_eq!(harness.available_tool_names(server.id()).await, vec!["a", "b"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn dropped_connection_during_discovery_is_discovery_failure(harness: MonitorHarness) {
    let server = harness.register_serving("reset", &["a"]);
    harness
        .host
        .drop_discovery(server.base_url(), "connection reset by peer");

    let report = harness.sweep.run_sweep_once().await;

    let server_report = report.server(server.id()).expect("server should be reported");
    assert!(matches!(
        server_report.outcome,
        ServerCheckOutcome::DiscoveryFailed { .. }
    ));
    assert_eq!(harness.catalog.row_count(), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn every_registered_server_gets_exactly_one_snapshot(harness: MonitorHarness) {
    let up = harness.register_serving("up", &["a"]);
    let down = harness.register("down");
    let broken = harness.register_serving("broken", &["a"]);
    harness.host.fail_discovery(broken.base_url(), 503, "");

    let report = harness.sweep.run_sweep_once().await;

    assert_eq!(report.servers.len(), 3);
    assert_eq!(report.up_count(), 2);
    for server in [&up, &down, &broken] {
        assert_eq!(harness.history.server_snapshots(server.id()).len(), 1);
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_registry_produces_empty_report(harness: MonitorHarness) {
    let report = harness.sweep.run_sweep_once().await;

    assert!(report.servers.is_empty());
    assert_eq!(harness.history.total_server_snapshots(), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deregistered_server_is_not_swept(harness: MonitorHarness) {
    let kept = harness.register_serving("kept", &["a"]);
    let removed = harness.register_serving("removed", &["a"]);
    assert!(
        harness
            .registry
            .deregister(removed.id())
            .expect("deregistration should succeed")
    );

    let report = harness.sweep.run_sweep_once().await;

    assert!(report.server(kept.id()).is_some());
    assert!(report.server(removed.id()).is_none());
    assert_eq!(harness.host.probe_calls(removed.base_url()), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn check_server_runs_one_server_pipeline(harness: MonitorHarness) {
    let target = harness.register_serving("target", &["a", "b"]);
    let other = harness.register_serving("other", &["a"]);

    let report = harness
        .sweep
        .check_server(target.id())
        .await
        .expect("registry lookup should succeed")
        .expect("server should be registered");

    assert_eq!(report.outcome.tool_count(), 2);
    assert_eq!(harness.history.server_snapshots(target.id()).len(), 1);
    assert_eq!(harness.host.probe_calls(other.base_url()), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn check_server_ignores_unknown_ids(harness: MonitorHarness) {
    let report = harness
        .sweep
        .check_server(ServerId::new(404))
        .await
        .expect("registry lookup should succeed");

    assert!(report.is_none());
    assert_eq!(harness.history.total_server_snapshots(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_sweep_overlaps_slow_servers() {
    let harness = MonitorHarness::with_settings(SweepSettings {
        max_concurrency: NonZeroUsize::new(4).expect("non-zero"),
        ..SweepSettings::default()
    });
    let latency = Duration::from_millis(300);
    for name in ["one", "two", "three", "four"] {
        let server = harness.register(name);
        harness.host.serve(server.base_url(), tools(&["a"]));
        harness.host.set_latency(server.base_url(), latency);
    }

    let started = Instant::now();
    let report = harness.sweep.run_sweep_once().await;
    let elapsed = started.elapsed();

    assert_eq!(report.up_count(), 4);
    assert!(
        elapsed < latency * 3,
        "four servers at concurrency four took {elapsed:?}"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn server_timeout_records_errored_snapshot() {
    let harness = MonitorHarness::with_settings(SweepSettings {
        server_timeout: Duration::from_millis(50),
        ..SweepSettings::default()
    });
    let slow = harness.register_serving("slow", &["a"]);
    harness
        .host
        .set_latency(slow.base_url(), Duration::from_secs(5));

    let report = harness.sweep.run_sweep_once().await;

    let server_report = report.server(slow.id()).expect("server should be reported");
    assert!(matches!(
        server_report.outcome,
        ServerCheckOutcome::Errored { .. }
    ));
    let snapshots = harness.history.server_snapshots(slow.id());
    let [snapshot] = snapshots.as_slice() else {
        panic!("expected one snapshot, got {snapshots:?}");
    };
    assert!(!snapshot.observed_up);
    assert_eq!(harness.catalog.row_count(), 0);
}
