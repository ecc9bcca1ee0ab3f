//! Fixed-rate host for journey iterations.
//!
//! Iteration starts are paced by a rate limiter. Each running iteration holds one virtual-user
//! permit; the pool starts at `min_vus` and grows one permit at a time up to `max_vus`. A start
//! that finds the pool exhausted is dropped, not queued.
use crate::client::ApiClient;
use crate::config::LoadConfig;
use crate::recorder::RunSummary;
use crate::scenario::ScenarioRunner;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use humantime::format_duration;
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio::time::Instant;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};

/// Run iterations at `config.rate` per second for `config.duration`, then wait up to
/// `config.graceful_stop` for stragglers.
#[instrument(name = "load", skip_all, fields(rate = config.rate.get()))]
pub async fn run<C>(config: &LoadConfig, runner: Arc<ScenarioRunner<C>>) -> RunSummary
where
    C: ApiClient + Send + Sync + 'static,
{
    info!("Running load test with config {:?}", config);

    let recorder = runner.recorder().clone();
    recorder.export_thresholds(&config.thresholds);

    let limiter = rate_limiter(config.rate);
    let mut pool = VirtualUsers::new(config.min_vus, config.max_vus);
    let mut iterations = JoinSet::new();

    let start = Instant::now();
    let deadline = start + config.duration;

    // NOTE: Nothing slow may run inline in this loop; it would throttle the arrival rate.
    loop {
        tokio::select! {
            _ = limiter.until_ready() => {}
            _ = tokio::time::sleep_until(deadline) => break,
        }

        // Reap finished iterations so the set does not grow for the whole run.
        while iterations.try_join_next().is_some() {}

        let Some(permit) = pool.acquire() else {
            trace!("All {} virtual users busy; dropping iteration", pool.allocated());
            recorder.dropped();
            continue;
        };

        let runner = runner.clone();
        iterations.spawn(
            async move {
                let res = runner.run_iteration().await;
                if let Err(error) = &res {
                    warn!("Iteration aborted: {error}");
                }
                runner.recorder().iteration(res.is_ok());
                drop(permit);
            }
            .in_current_span(),
        );
    }

    info!(
        "Duration elapsed; waiting up to {} for {} in-flight iterations",
        format_duration(config.graceful_stop),
        iterations.len()
    );
    let drained = tokio::time::timeout(config.graceful_stop, async {
        while iterations.join_next().await.is_some() {}
    })
    .await;

    if drained.is_err() {
        let remaining = iterations.len();
        warn!("Interrupting {remaining} iterations still running after the graceful stop");
        iterations.abort_all();
        recorder.interrupted(remaining as u64);
    }

    let summary = recorder.summary(start.elapsed(), pool.allocated());
    info!("Load test complete: {summary}");
    summary
}

fn rate_limiter(rate: NonZeroU32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(rate).allow_burst(NonZeroU32::MIN))
}

struct VirtualUsers {
    permits: Arc<Semaphore>,
    allocated: usize,
    max: usize,
}

impl VirtualUsers {
    fn new(min: usize, max: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(min)),
            allocated: min,
            max,
        }
    }

    /// A free virtual user, allocating a new one if the pool is below its maximum.
    fn acquire(&mut self) -> Option<OwnedSemaphorePermit> {
        if let Ok(permit) = self.permits.clone().try_acquire_owned() {
            return Some(permit);
        }

        if self.allocated < self.max {
            self.permits.add_permits(1);
            self.allocated += 1;
            debug!("Scaled up to {} virtual users", self.allocated);
            return self.permits.clone().try_acquire_owned().ok();
        }

        None
    }

    fn allocated(&self) -> usize {
        self.allocated
    }
}
