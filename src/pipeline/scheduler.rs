// src/pipeline/scheduler.rs

//! Fixed-cadence scheduler with a single-flight guard.
//!
//! A tick that fires while a cycle is still running is dropped: no queue,
//! no catch-up. The guard is released when the cycle's future completes.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

/// Fires a sync job on a fixed cadence, never overlapping itself.
#[derive(Debug, Clone)]
pub struct Scheduler {
    period: Duration,
    running: Arc<AtomicBool>,
}

/// Proof that a cycle holds the single-flight flag; clears it on drop.
#[derive(Debug)]
pub struct CycleGuard {
    running: Arc<AtomicBool>,
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

impl Scheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Claim the flag, or `None` if a cycle is already running.
    pub fn try_begin(&self) -> Option<CycleGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CycleGuard {
                running: Arc::clone(&self.running),
            })
    }

    /// Handle one tick: spawn `job` unless a cycle is in flight.
    ///
    /// Returns whether a cycle was started.
    pub fn tick<F, Fut>(&self, job: &F) -> bool
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let Some(guard) = self.try_begin() else {
            log::debug!("Sync still running, skipping tick");
            return false;
        };

        let cycle = job();
        tokio::spawn(async move {
            cycle.await;
            drop(guard);
        });
        true
    }

    /// Tick every period until `shutdown` is cancelled.
    pub async fn run<F, Fut>(&self, job: F, shutdown: CancellationToken)
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    log::debug!("Scheduler stopped");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick(&job);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use tokio::sync::Notify;

    use super::*;

    #[test]
    fn test_guard_is_exclusive_until_dropped() {
        let scheduler = Scheduler::new(Duration::from_secs(1));
        let guard = scheduler.try_begin().expect("first claim succeeds");
        assert!(scheduler.is_running());
        assert!(scheduler.try_begin().is_none());

        drop(guard);
        assert!(!scheduler.is_running());
        assert!(scheduler.try_begin().is_some());
    }

    #[tokio::test]
    async fn test_overlapping_tick_is_a_no_op() {
        let scheduler = Scheduler::new(Duration::from_secs(1));
        let started = Arc::new(AtomicUsize::new(0));
        let release = Arc::new(Notify::new());
        let finished = Arc::new(Notify::new());

        let job = {
            let started = Arc::clone(&started);
            let release = Arc::clone(&release);
            let finished = Arc::clone(&finished);
            move || {
                let started = Arc::clone(&started);
                let release = Arc::clone(&release);
                let finished = Arc::clone(&finished);
                async move {
                    started.fetch_add(1, Ordering::SeqCst);
                    release.notified().await;
                    finished.notify_one();
                }
            }
        };

        assert!(scheduler.tick(&job));
        assert!(scheduler.is_running());
        assert!(!scheduler.tick(&job), "second tick must be dropped");

        release.notify_one();
        finished.notified().await;
        // Let the spawned task drop its guard.
        while scheduler.is_running() {
            tokio::task::yield_now().await;
        }

        assert!(scheduler.tick(&job), "flag re-arms after completion");
        release.notify_one();
        finished.notified().await;
        assert_eq!(started.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_skips_ticks_while_cycle_is_slow() {
        let scheduler = Scheduler::new(Duration::from_secs(1));
        let started = Arc::new(AtomicUsize::new(0));
        let shutdown = CancellationToken::new();

        let job = {
            let started = Arc::clone(&started);
            move || {
                let started = Arc::clone(&started);
                async move {
                    started.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(3500)).await;
                }
            }
        };

        let runner = {
            let scheduler = scheduler.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move { scheduler.run(job, shutdown).await })
        };

        // Ticks at 0s..5s: the cycle started at 0s holds the flag until 3.5s,
        // so only the 0s and 4s ticks start a cycle.
        tokio::time::sleep(Duration::from_millis(5500)).await;
        shutdown.cancel();
        runner.await.unwrap();

        assert_eq!(started.load(Ordering::SeqCst), 2);
    }
}
