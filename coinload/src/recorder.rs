use crate::config::Thresholds;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// The journey steps, used to label checks and request timings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Step {
    CreateUser,
    Purchase,
    Transfer,
    UserInfo,
}

impl Step {
    pub const ALL: [Step; 4] = [
        Step::CreateUser,
        Step::Purchase,
        Step::Transfer,
        Step::UserInfo,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Step::CreateUser => "create_user",
            Step::Purchase => "purchase",
            Step::Transfer => "transfer",
            Step::UserInfo => "user_info",
        }
    }

    fn idx(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shared counters for checks, request timings and iteration outcomes.
///
/// Everything is also forwarded to the `metrics` facade (with the `metrics` feature), where an
/// exporter can pick it up.
#[derive(Debug, Default)]
pub struct Recorder {
    passed: [AtomicU64; 4],
    failed: [AtomicU64; 4],
    transport_errors: [AtomicU64; 4],
    requests: AtomicU64,
    latency_nanos: AtomicU64,
    iterations: AtomicU64,
    aborted: AtomicU64,
    interrupted: AtomicU64,
    dropped: AtomicU64,
}

impl Recorder {
    pub fn new() -> Self {
        #[cfg(feature = "metrics")]
        describe_metrics();

        Self::default()
    }

    /// Record a `status is 200` check. Returns `passed` for convenience.
    pub fn check(&self, step: Step, passed: bool) -> bool {
        let counters = if passed { &self.passed } else { &self.failed };
        counters[step.idx()].fetch_add(1, Ordering::Relaxed);

        #[cfg(feature = "metrics")]
        {
            let result = if passed { "pass" } else { "fail" };
            metrics::counter!("coinload_checks_total", "step" => step.name(), "result" => result)
                .increment(1);
            if !passed {
                metrics::counter!("coinload_http_req_failed_total", "step" => step.name())
                    .increment(1);
            }
        }

        passed
    }

    pub fn request(&self, step: Step, elapsed: Duration) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.latency_nanos
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);

        #[cfg(feature = "metrics")]
        metrics::histogram!("coinload_http_req_duration_seconds", "step" => step.name())
            .record(elapsed.as_secs_f64());
        #[cfg(not(feature = "metrics"))]
        let _ = step;
    }

    /// A request that never got a response (connect failure, timeout, broken body).
    pub fn transport_error(&self, step: Step) {
        self.transport_errors[step.idx()].fetch_add(1, Ordering::Relaxed);

        #[cfg(feature = "metrics")]
        metrics::counter!("coinload_http_req_failed_total", "step" => step.name()).increment(1);
    }

    /// An iteration ran to completion (`true`) or was cut short by an error.
    pub fn iteration(&self, completed: bool) {
        let (counter, outcome) = if completed {
            (&self.iterations, "complete")
        } else {
            (&self.aborted, "aborted")
        };
        counter.fetch_add(1, Ordering::Relaxed);

        #[cfg(feature = "metrics")]
        metrics::counter!("coinload_iterations_total", "outcome" => outcome).increment(1);
        #[cfg(not(feature = "metrics"))]
        let _ = outcome;
    }

    /// Iterations still running when the graceful stop period ran out.
    pub fn interrupted(&self, count: u64) {
        self.interrupted.fetch_add(count, Ordering::Relaxed);

        #[cfg(feature = "metrics")]
        metrics::counter!("coinload_iterations_total", "outcome" => "interrupted").increment(count);
    }

    /// An iteration was due but every virtual user was busy.
    pub fn dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);

        #[cfg(feature = "metrics")]
        metrics::counter!("coinload_dropped_iterations_total").increment(1);
    }

    /// Publish the configured thresholds as gauges for whoever evaluates them.
    pub fn export_thresholds(&self, thresholds: &Thresholds) {
        info!(
            "Thresholds: error rate < {}, average latency < {:?}",
            thresholds.max_error_rate, thresholds.max_avg_latency
        );

        #[cfg(feature = "metrics")]
        {
            metrics::gauge!("coinload_threshold_max_error_rate").set(thresholds.max_error_rate);
            metrics::gauge!("coinload_threshold_max_avg_latency_seconds")
                .set(thresholds.max_avg_latency.as_secs_f64());
        }
    }

    pub fn checks_passed(&self, step: Step) -> u64 {
        self.passed[step.idx()].load(Ordering::Relaxed)
    }

    pub fn checks_failed(&self, step: Step) -> u64 {
        self.failed[step.idx()].load(Ordering::Relaxed)
    }

    pub fn transport_errors(&self, step: Step) -> u64 {
        self.transport_errors[step.idx()].load(Ordering::Relaxed)
    }

    pub fn summary(&self, elapsed: Duration, vus: usize) -> RunSummary {
        let sum = |counters: &[AtomicU64; 4]| {
            counters
                .iter()
                .map(|c| c.load(Ordering::Relaxed))
                .sum::<u64>()
        };

        RunSummary {
            elapsed,
            vus,
            iterations: self.iterations.load(Ordering::Relaxed),
            aborted: self.aborted.load(Ordering::Relaxed),
            interrupted: self.interrupted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            checks_passed: sum(&self.passed),
            checks_failed: sum(&self.failed),
            transport_errors: sum(&self.transport_errors),
            requests: self.requests.load(Ordering::Relaxed),
            latency_total: Duration::from_nanos(self.latency_nanos.load(Ordering::Relaxed)),
        }
    }
}

#[cfg(feature = "metrics")]
fn describe_metrics() {
    use metrics::{describe_counter, describe_histogram, Unit};

    describe_counter!("coinload_checks_total", Unit::Count, "Status checks by step and result");
    describe_counter!(
        "coinload_http_req_failed_total",
        Unit::Count,
        "Requests without a 200 response, transport errors included"
    );
    describe_histogram!(
        "coinload_http_req_duration_seconds",
        Unit::Seconds,
        "Request latency by step"
    );
    describe_counter!("coinload_iterations_total", Unit::Count, "Iterations by outcome");
    describe_counter!(
        "coinload_dropped_iterations_total",
        Unit::Count,
        "Iterations skipped because no virtual user was free"
    );
}

/// End-of-run totals.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub elapsed: Duration,
    /// Virtual users allocated by the end of the run.
    pub vus: usize,
    pub iterations: u64,
    pub aborted: u64,
    pub interrupted: u64,
    pub dropped: u64,
    pub checks_passed: u64,
    pub checks_failed: u64,
    /// Requests that never got a response.
    pub transport_errors: u64,
    /// Requests that got a response, whatever its status.
    pub requests: u64,
    pub latency_total: Duration,
}

impl RunSummary {
    pub fn checks_total(&self) -> u64 {
        self.checks_passed + self.checks_failed
    }

    /// Every request sent, answered or not.
    pub fn requests_total(&self) -> u64 {
        self.requests + self.transport_errors
    }

    /// Requests answered with something other than 200, plus those never answered.
    pub fn requests_failed(&self) -> u64 {
        self.checks_failed + self.transport_errors
    }

    /// Share of failed requests, `0.0` when nothing was sent.
    pub fn error_rate(&self) -> f64 {
        match self.requests_total() {
            0 => 0.,
            total => self.requests_failed() as f64 / total as f64,
        }
    }

    pub fn avg_latency(&self) -> Duration {
        match self.requests {
            0 => Duration::ZERO,
            n => Duration::from_nanos((self.latency_total.as_nanos() / n as u128) as u64),
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Iterations={} (aborted={}, interrupted={}, dropped={}), Checks={}/{}, Requests={} (transport errors={}, {:.3}% failed), AvgLatency={:?}, VUs={}, Elapsed={}",
            self.iterations,
            self.aborted,
            self.interrupted,
            self.dropped,
            self.checks_passed,
            self.checks_total(),
            self.requests_total(),
            self.transport_errors,
            self.error_rate() * 100.,
            self.avg_latency(),
            self.vus,
            humantime::format_duration(self.elapsed),
        )
    }
}
