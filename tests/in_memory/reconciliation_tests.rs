//! Catalog convergence across repeated sweeps.

use super::helpers::{MonitorHarness, harness, tools};
use rstest::rstest;
use vigil::monitor::{
    domain::{ServerCheckOutcome, ToolRequestStats},
    ports::ToolCatalogRepository,
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn absent_tool_is_disabled_and_snapshotted_unavailable(harness: MonitorHarness) {
    let server = harness.register_serving("alpha", &["a", "b", "c"]);
    harness.sweep.run_sweep_once().await;
    harness.host.serve(server.base_url(), tools(&["a", "b"]));

    let report = harness.sweep.run_sweep_once().await;

    let outcome = &report.server(server.id()).expect("reported").outcome;
    let ServerCheckOutcome::Up { counts } = outcome else {
        panic!("expected up outcome, got {outcome:?}");
    };
    assert_eq!((counts.discovered, counts.added, counts.updated, counts.disabled), (2, 0, 2, 1));

    let retired = harness.tool(server.id(), "c").await;
    assert!(!retired.is_available());
    let availability: Vec<bool> = harness
        .history
        .tool_snapshots(retired.id())
        .iter()
        .map(|snapshot| snapshot.is_available)
        .collect();
    assert_eq!(availability, vec![true, false]);

    let latest = harness
        .history
        .server_snapshots(server.id())
        .last()
        .copied()
        .expect("snapshot should exist");
    assert_eq!(latest.tool_count, 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn identical_sweeps_only_grow_history(harness: MonitorHarness) {
    let server = harness.register_serving("stable", &["a", "b", "c"]);
    harness.sweep.run_sweep_once().await;
    let first_ids: Vec<_> = harness
        .catalog
        .list_tools(server.id())
        .await
        .expect("listing should succeed")
        .iter()
        .map(|tool| tool.id())
        .collect();

    harness.sweep.run_sweep_once().await;

    let second_ids: Vec<_> = harness
        .catalog
        .list_tools(server.id())
        .await
        .expect("listing should succeed")
        .iter()
        .map(|tool| tool.id())
        .collect();
    assert_eq!(first_ids, second_ids);
    assert_eq!(harness.catalog.row_count(), 3);
    assert_eq!(harness.history.server_snapshots(server.id()).len(), 2);
    for tool_id in second_ids {
        assert_eq!(harness.history.tool_snapshots(tool_id).len(), 2);
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reappearing_tool_reuses_its_row(harness: MonitorHarness) {
    let server = harness.register_serving("cycle", &["a", "b"]);
    harness.sweep.run_sweep_once().await;
    let original = harness.tool(server.id(), "b").await;

    harness.host.serve(server.base_url(), tools(&["a"]));
    harness.sweep.run_sweep_once().await;
    harness.host.serve(server.base_url(), tools(&["a", "b"]));
    harness.sweep.run_sweep_once().await;

    let restored = harness.tool(server.id(), "b").await;
    assert_eq!(restored.id(), original.id());
    assert!(restored.is_available());
    assert_eq!(harness.catalog.row_count(), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_names_in_discovery_store_one_row(harness: MonitorHarness) {
    let server = harness.register_serving("dupes", &["echo", "echo", "time"]);

    let report = harness.sweep.run_sweep_once().await;

    assert_eq!(
        report.server(server.id()).expect("reported").outcome.tool_count(),
        2
    );
    assert_eq!(harness.catalog.row_count(), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_discovery_disables_every_tool(harness: MonitorHarness) {
    let server = harness.register_serving("drained", &["a", "b"]);
    harness.sweep.run_sweep_once().await;
    harness.host.serve(server.base_url(), Vec::new());

    let report = harness.sweep.run_sweep_once().await;

    assert_eq!(
        report.server(server.id()).expect("reported").outcome.tool_count(),
        0
    );
    assert!(harness.available_tool_names(server.id()).await.is_empty());
    assert_eq!(harness.catalog.row_count(), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rediscovery_preserves_request_statistics(harness: MonitorHarness) {
    let server = harness.register_serving("counted", &["search"]);
    harness.sweep.run_sweep_once().await;
    let tool = harness.tool(server.id(), "search").await;
    let stats = ToolRequestStats {
        total_requests: 12,
        successful_requests: 10,
        failed_requests: 2,
        last_status_code: Some(200),
        last_latency_ms: Some(85),
    };
    assert!(
        harness
            .catalog
            .record_request_stats(tool.id(), stats)
            .expect("stats update should succeed")
    );

    harness.sweep.run_sweep_once().await;

    assert_eq!(harness.tool(server.id(), "search").await.stats(), stats);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn servers_do_not_share_tool_rows(harness: MonitorHarness) {
    let left = harness.register_serving("left", &["search"]);
    let right = harness.register_serving("right", &["search"]);
    harness.sweep.run_sweep_once().await;
    harness.host.serve(right.base_url(), Vec::new());

    harness.sweep.run_sweep_once().await;

    assert!(harness.tool(left.id(), "search").await.is_available());
    assert!(!harness.tool(right.id(), "search").await.is_available());
}
