//! Uptime and availability percentages derived from sweep history.

use super::helpers::{MonitorHarness, harness, tools};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn uptime_reflects_share_of_up_snapshots(harness: MonitorHarness) {
    let server = harness.register_serving("wobbly", &["a"]);
    for reachable in [true, false, true, true] {
        harness.host.set_reachable(server.base_url(), reachable);
        harness.sweep.run_sweep_once().await;
    }

    let uptime = harness
        .sweep
        .ledger()
        .uptime_percent(server.id())
        .await
        .expect("uptime should be computed");

    assert!((uptime - 75.0).abs() < f64::EPSILON, "uptime was {uptime}");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn discovery_failures_still_count_towards_uptime(harness: MonitorHarness) {
    let server = harness.register_serving("degraded", &["a"]);
    harness.sweep.run_sweep_once().await;
    harness.host.fail_discovery(server.base_url(), 502, "bad gateway");
    harness.sweep.run_sweep_once().await;

    let uptime = harness
        .sweep
        .ledger()
        .uptime_percent(server.id())
        .await
        .expect("uptime should be computed");

    assert!((uptime - 100.0).abs() < f64::EPSILON, "uptime was {uptime}");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tool_availability_tracks_disable_and_return(harness: MonitorHarness) {
    let server = harness.register_serving("rotating", &["a", "b"]);
    harness.sweep.run_sweep_once().await;
    harness.host.serve(server.base_url(), tools(&["a"]));
    harness.sweep.run_sweep_once().await;
    harness.host.serve(server.base_url(), tools(&["a", "b"]));
    harness.sweep.run_sweep_once().await;
    harness.host.serve(server.base_url(), tools(&["a"]));
    harness.sweep.run_sweep_once().await;

    let rotating = harness.tool(server.id(), "b").await;
    let availability = harness
        .sweep
        .ledger()
        .availability_percent(rotating.id())
        .await
        .expect("availability should be computed");

    assert!((availability - 50.0).abs() < f64::EPSILON, "availability was {availability}");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn recent_snapshots_are_newest_first_and_limited(harness: MonitorHarness) {
    let server = harness.register_serving("recent", &["a", "b"]);
    harness.sweep.run_sweep_once().await;
    harness.host.set_reachable(server.base_url(), false);
    harness.sweep.run_sweep_once().await;
    harness.host.set_reachable(server.base_url(), true);
    harness.host.serve(server.base_url(), tools(&["a"]));
    harness.sweep.run_sweep_once().await;

    let recent = harness
        .sweep
        .ledger()
        .recent_server_snapshots(server.id(), 2)
        .await
        .expect("history should be readable");

    let summary: Vec<(bool, u32)> = recent
        .iter()
        .map(|snapshot| (snapshot.observed_up, snapshot.tool_count))
        .collect();
    assert_eq!(summary, vec![(true, 1), (false, 0)]);
    let [newest, older] = recent.as_slice() else {
        panic!("expected two snapshots, got {recent:?}");
    };
    assert!(newest.checked_at > older.checked_at);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn server_without_history_has_zero_uptime(harness: MonitorHarness) {
    let server = harness.register("fresh");

    let uptime = harness
        .sweep
        .ledger()
        .uptime_percent(server.id())
        .await
        .expect("uptime should be computed");

    assert!(uptime.abs() < f64::EPSILON);
}
