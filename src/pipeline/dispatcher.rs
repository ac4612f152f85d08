// src/pipeline/dispatcher.rs

//! Rate-limited request dispatcher.
//!
//! Serializes outbound calls to an API with a request-rate ceiling:
//!
//! - at most one request in flight at any time
//! - a minimum delay between the *start* of consecutive requests
//! - requests run in submission order (the async mutex is fair)
//!
//! There is no priority and no cancellation; a queued request waits for
//! every request submitted before it.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};

/// Single-lane throttle for one downstream API.
#[derive(Debug)]
pub struct Dispatcher {
    min_interval: Duration,
    /// Start of the most recent request; the lock is held while it runs.
    last_start: Mutex<Option<Instant>>,
}

impl Dispatcher {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_start: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Run `job` once every earlier job has finished and the minimum
    /// interval since the previous start has elapsed.
    pub async fn schedule<F, Fut, T>(&self, job: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let mut last_start = self.last_start.lock().await;
        if let Some(previous) = *last_start {
            sleep_until(previous + self.min_interval).await;
        }
        *last_start = Some(Instant::now());
        job().await
    }
}
