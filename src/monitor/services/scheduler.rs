//! Periodic sweep scheduling with single-flight execution and graceful drain.

use crate::monitor::domain::SweepReport;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Cadence and shutdown behaviour for [`SweepScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleSettings {
    /// Delay between sweep starts.
    pub interval: Duration,
    /// How long shutdown waits for an in-flight sweep.
    pub drain_timeout: Duration,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30 * 60),
            drain_timeout: Duration::from_secs(60),
        }
    }
}

/// Result of asking the scheduler to run a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepTrigger {
    /// The sweep ran to completion.
    Completed(SweepReport),
    /// Another sweep was already running, so this one was skipped.
    Skipped,
}

/// Summary returned when the scheduling loop stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerExit {
    /// Sweeps that ran to completion while the loop was active.
    pub completed_sweeps: u64,
    /// Whether an in-flight sweep was dropped after the drain timeout.
    pub abandoned_in_flight: bool,
}

/// Runs a sweep job on a fixed cadence, never overlapping two runs.
///
/// Ticks that fire while a sweep is still running are skipped rather than
/// queued. On-demand triggers share the same in-flight flag.
pub struct SweepScheduler<F> {
    job: F,
    settings: ScheduleSettings,
    in_flight: Arc<AtomicBool>,
}

impl<F, Fut> SweepScheduler<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = SweepReport> + Send,
{
    /// Creates a scheduler for `job`.
    #[must_use]
    pub fn new(job: F, settings: ScheduleSettings) -> Self {
        Self {
            job,
            settings,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns the schedule settings.
    #[must_use]
    pub const fn settings(&self) -> ScheduleSettings {
        self.settings
    }

    /// Returns whether a sweep is currently running.
    #[must_use]
    pub fn is_sweeping(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Runs a sweep now unless one is already in flight.
    pub async fn trigger(&self) -> SweepTrigger {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            warn!("sweep already in flight, skipping trigger");
            return SweepTrigger::Skipped;
        };
        SweepTrigger::Completed((self.job)().await)
    }

    /// Runs sweeps until `shutdown` is cancelled.
    ///
    /// The first sweep starts immediately. Cancellation during a sweep waits
    /// up to the drain timeout for it to finish before abandoning it.
    pub async fn run(&self, shutdown: CancellationToken) -> SchedulerExit {
        let mut ticker = interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut completed_sweeps: u64 = 0;

        info!(
            interval_secs = self.settings.interval.as_secs(),
            "sweep scheduler started"
        );

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => {
                    info!(completed_sweeps, "sweep scheduler stopped");
                    return SchedulerExit {
                        completed_sweeps,
                        abandoned_in_flight: false,
                    };
                }
                _ = ticker.tick() => {}
            }

            let sweep = self.trigger();
            tokio::pin!(sweep);

            tokio::select! {
                biased;
                outcome = &mut sweep => {
                    completed_sweeps = count_completed(completed_sweeps, &outcome);
                }
                () = shutdown.cancelled() => {
                    info!(
                        drain_timeout_secs = self.settings.drain_timeout.as_secs(),
                        "shutdown requested, draining in-flight sweep"
                    );
                    return match timeout(self.settings.drain_timeout, &mut sweep).await {
                        Ok(outcome) => SchedulerExit {
                            completed_sweeps: count_completed(completed_sweeps, &outcome),
                            abandoned_in_flight: false,
                        },
                        Err(_) => {
                            warn!("in-flight sweep abandoned after drain timeout");
                            SchedulerExit {
                                completed_sweeps,
                                abandoned_in_flight: true,
                            }
                        }
                    };
                }
            }
        }
    }
}

fn count_completed(completed: u64, outcome: &SweepTrigger) -> u64 {
    match outcome {
        SweepTrigger::Completed(report) => {
            info!(
                sweep_id = %report.sweep_id,
                servers = report.servers.len(),
                up = report.up_count(),
                "scheduled sweep completed"
            );
            completed.saturating_add(1)
        }
        SweepTrigger::Skipped => completed,
    }
}

/// Holds the in-flight flag for the lifetime of one sweep.
struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                flag: Arc::clone(flag),
            })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::domain::SweepId;
    use chrono::Utc;
    use std::sync::atomic::AtomicUsize;

    fn empty_report() -> SweepReport {
        SweepReport {
            sweep_id: SweepId::new(),
            started_at: Utc::now(),
            duration: Duration::ZERO,
            servers: Vec::new(),
        }
    }

    fn counting_job(
        calls: &Arc<AtomicUsize>,
        work: Duration,
    ) -> impl Fn() -> std::pin::Pin<Box<dyn Future<Output = SweepReport> + Send>> + Send + Sync + use<>
    {
        let counter = Arc::clone(calls);
        move || {
            let job_counter = Arc::clone(&counter);
            Box::pin(async move {
                job_counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(work).await;
                empty_report()
            })
        }
    }

    fn settings(interval_ms: u64, drain_ms: u64) -> ScheduleSettings {
        ScheduleSettings {
            interval: Duration::from_millis(interval_ms),
            drain_timeout: Duration::from_millis(drain_ms),
        }
    }

    async fn wait_for_calls(calls: &AtomicUsize, at_least: usize) {
        let waited = timeout(Duration::from_secs(5), async {
            while calls.load(Ordering::SeqCst) < at_least {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(waited.is_ok(), "job was not called {at_least} times in time");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn first_sweep_runs_immediately() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scheduler = Arc::new(SweepScheduler::new(
            counting_job(&calls, Duration::ZERO),
            settings(3_600_000, 1_000),
        ));
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn({
            let runner = Arc::clone(&scheduler);
            let token = shutdown.clone();
            async move { runner.run(token).await }
        });

        wait_for_calls(&calls, 1).await;
        shutdown.cancel();
        let exit = handle.await.expect("scheduler task should join");

        assert_eq!(exit.completed_sweeps, 1);
        assert!(!exit.abandoned_in_flight);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sweeps_repeat_on_the_interval() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scheduler = Arc::new(SweepScheduler::new(
            counting_job(&calls, Duration::ZERO),
            settings(20, 1_000),
        ));
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn({
            let runner = Arc::clone(&scheduler);
            let token = shutdown.clone();
            async move { runner.run(token).await }
        });

        wait_for_calls(&calls, 3).await;
        shutdown.cancel();
        let exit = handle.await.expect("scheduler task should join");

        assert!(exit.completed_sweeps >= 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn overlapping_trigger_is_skipped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scheduler =
            SweepScheduler::new(counting_job(&calls, Duration::from_millis(200)), settings(1_000, 1_000));

        let (first, second) = tokio::join!(scheduler.trigger(), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            scheduler.trigger().await
        });

        assert!(matches!(first, SweepTrigger::Completed(_)));
        assert_eq!(second, SweepTrigger::Skipped);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_sweeping());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn shutdown_drains_in_flight_sweep() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scheduler = Arc::new(SweepScheduler::new(
            counting_job(&calls, Duration::from_millis(150)),
            settings(3_600_000, 5_000),
        ));
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn({
            let runner = Arc::clone(&scheduler);
            let token = shutdown.clone();
            async move { runner.run(token).await }
        });

        wait_for_calls(&calls, 1).await;
        shutdown.cancel();
        let exit = handle.await.expect("scheduler task should join");

        assert_eq!(
            exit,
            SchedulerExit {
                completed_sweeps: 1,
                abandoned_in_flight: false,
            }
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn shutdown_abandons_sweep_after_drain_timeout() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scheduler = Arc::new(SweepScheduler::new(
            counting_job(&calls, Duration::from_secs(30)),
            settings(3_600_000, 50),
        ));
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn({
            let runner = Arc::clone(&scheduler);
            let token = shutdown.clone();
            async move { runner.run(token).await }
        });

        wait_for_calls(&calls, 1).await;
        shutdown.cancel();
        let exit = handle.await.expect("scheduler task should join");

        assert!(exit.abandoned_in_flight);
        assert_eq!(exit.completed_sweeps, 0);
        assert!(!scheduler.is_sweeping());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cancelled_token_prevents_any_sweep() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scheduler = SweepScheduler::new(counting_job(&calls, Duration::ZERO), settings(10, 10));
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let exit = scheduler.run(shutdown).await;

        assert_eq!(exit.completed_sweeps, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
