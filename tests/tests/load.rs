mod utils;
use utils::*;

use coinload::prelude::*;
use std::net::TcpListener as StdTcpListener;
use std::num::NonZeroU32;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(30_000)]
async fn short_run_against_mock() {
    let api_base = spawn_mock().await;
    let config = LoadConfig::default()
        .api_base(&api_base)
        .rate(NonZeroU32::new(50).unwrap())
        .vus(2, 10)
        .duration(Duration::from_secs(1))
        .graceful_stop(Duration::from_secs(5))
        .pause(PauseRange::none());
    config.validate().unwrap();
    let runner = runner(&config, 10);

    let summary = run(&config, runner.clone()).await;

    assert!(summary.iterations > 10, "{summary}");
    assert_eq!(summary.checks_failed, 0, "{summary}");
    assert_eq!(summary.interrupted, 0, "{summary}");
    assert!(summary.vus <= 10);
    assert_eq!(
        runner.registry().len().unwrap() as u64,
        runner.recorder().checks_passed(Step::CreateUser)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ntest::timeout(30_000)]
async fn dead_api_fails_error_rate_threshold() {
    let addr = {
        let listener = StdTcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let config = LoadConfig::default()
        .api_base(&format!("http://{addr}/api"))
        .rate(NonZeroU32::new(50).unwrap())
        .vus(2, 10)
        .duration(Duration::from_millis(500))
        .graceful_stop(Duration::from_secs(5))
        .pause(PauseRange::none());
    let runner = runner(&config, 12);

    let summary = run(&config, runner).await;

    assert_eq!(summary.iterations, 0, "{summary}");
    assert!(summary.aborted > 0, "{summary}");
    assert_eq!(summary.transport_errors, summary.aborted, "{summary}");
    assert_eq!(summary.error_rate(), 1., "{summary}");
    assert!(summary.error_rate() >= config.thresholds.max_error_rate);
}

#[cfg(feature = "integration")]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn sustained_run_meets_thresholds() {
        let api_base = spawn_mock().await;
        let config = LoadConfig::default()
            .api_base(&api_base)
            .rate(NonZeroU32::new(200).unwrap())
            .duration(Duration::from_secs(10))
            .pause(PauseRange::none());
        let runner = runner(&config, 11);

        let summary = run(&config, runner).await;

        assert_eq!(summary.dropped, 0, "{summary}");
        assert!(
            summary.error_rate() < config.thresholds.max_error_rate,
            "{summary}"
        );
        assert!(
            summary.avg_latency() < config.thresholds.max_avg_latency,
            "{summary}"
        );
    }
}
