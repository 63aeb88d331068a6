//! Scheduled sweeps over the in-memory fleet.

use super::helpers::{MonitorHarness, harness};
use rstest::rstest;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use vigil::monitor::services::{ScheduleSettings, SweepScheduler, SweepTrigger};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn scheduler_sweeps_immediately_and_stops_on_shutdown(harness: MonitorHarness) {
    let server = harness.register_serving("scheduled", &["a"]);
    let sweep = &harness.sweep;
    let scheduler = SweepScheduler::new(
        move || sweep.run_sweep_once(),
        ScheduleSettings {
            interval: Duration::from_secs(3600),
            drain_timeout: Duration::from_secs(1),
        },
    );
    let shutdown = CancellationToken::new();

    let stopper = async {
        tokio::time::timeout(Duration::from_secs(5), async {
            while harness.history.server_snapshots(server.id()).is_empty() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("first sweep should land within five seconds");
        shutdown.cancel();
    };
    let (exit, ()) = tokio::join!(scheduler.run(shutdown.clone()), stopper);

    assert_eq!(exit.completed_sweeps, 1);
    assert!(!exit.abandoned_in_flight);
    assert_eq!(harness.history.server_snapshots(server.id()).len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn manual_trigger_runs_a_full_sweep(harness: MonitorHarness) {
    let server = harness.register_serving("manual", &["a", "b"]);
    let sweep = &harness.sweep;
    let scheduler = SweepScheduler::new(move || sweep.run_sweep_once(), ScheduleSettings::default());

    let trigger = scheduler.trigger().await;

    let SweepTrigger::Completed(report) = trigger else {
        panic!("expected a completed sweep");
    };
    assert_eq!(
        report.server(server.id()).expect("reported").outcome.tool_count(),
        2
    );
    assert!(!scheduler.is_sweeping());
}
