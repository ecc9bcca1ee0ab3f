use anyhow::Context;
use clap::Parser;
use coinload::constants::*;
use coinload::prelude::*;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(version, about = "Fixed-rate load test for the coin shop API")]
struct Cli {
    /// API base URL, without a trailing slash
    #[arg(long, env = "COINLOAD_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Iterations started per second
    #[arg(short, long, env = "COINLOAD_RATE", default_value_t = DEFAULT_RATE)]
    rate: NonZeroU32,

    #[arg(long, env = "COINLOAD_MIN_VUS", default_value_t = DEFAULT_MIN_VUS)]
    min_vus: usize,

    #[arg(long, env = "COINLOAD_MAX_VUS", default_value_t = DEFAULT_MAX_VUS)]
    max_vus: usize,

    /// Test duration, e.g. `30s` or `2m`
    #[arg(short, long, env = "COINLOAD_DURATION", default_value = "30s", value_parser = humantime::parse_duration)]
    duration: Duration,

    #[arg(long, env = "COINLOAD_GRACEFUL_STOP", default_value = "30s", value_parser = humantime::parse_duration)]
    graceful_stop: Duration,

    #[arg(long, env = "COINLOAD_PAUSE_MIN", default_value_t = DEFAULT_PAUSE_MIN_SECS)]
    pause_min: u64,

    #[arg(long, env = "COINLOAD_PAUSE_MAX", default_value_t = DEFAULT_PAUSE_MAX_SECS)]
    pause_max: u64,

    /// Per-request timeout, e.g. `5s`. Unbounded when unset.
    #[arg(long, env = "COINLOAD_REQUEST_TIMEOUT", value_parser = humantime::parse_duration)]
    request_timeout: Option<Duration>,

    #[arg(long, env = "COINLOAD_MAX_ERROR_RATE", default_value_t = DEFAULT_MAX_ERROR_RATE)]
    max_error_rate: f64,

    #[arg(long, env = "COINLOAD_MAX_AVG_LATENCY", default_value = "50ms", value_parser = humantime::parse_duration)]
    max_avg_latency: Duration,

    /// Seed for reproducible user selection and think-time
    #[arg(long, env = "COINLOAD_SEED")]
    seed: Option<u64>,

    /// Serve Prometheus metrics on this address
    #[arg(long, env = "COINLOAD_METRICS_ADDR")]
    metrics_addr: Option<SocketAddr>,
}

impl Cli {
    fn into_config(self) -> LoadConfig {
        let mut config = LoadConfig::default()
            .api_base(&self.api_base)
            .rate(self.rate)
            .vus(self.min_vus, self.max_vus)
            .duration(self.duration)
            .graceful_stop(self.graceful_stop)
            .pause(PauseRange::new(self.pause_min, self.pause_max))
            .thresholds(Thresholds {
                max_error_rate: self.max_error_rate,
                max_avg_latency: self.max_avg_latency,
            });
        if let Some(timeout) = self.request_timeout {
            config = config.request_timeout(timeout);
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("coinload=info")),
        )
        .init();

    let cli = Cli::parse();
    let seed = cli.seed;
    let metrics_addr = cli.metrics_addr;
    let config = cli.into_config();
    config.validate().context("invalid load test configuration")?;

    if let Some(addr) = metrics_addr {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("failed to install Prometheus exporter")?;
        info!("Serving metrics on {addr}");
    }

    let random: Arc<dyn RandomSource> = match seed {
        Some(seed) => Arc::new(SeededRandom::new(seed)),
        None => Arc::new(ThreadRandom),
    };

    let runner = Arc::new(ScenarioRunner::new(
        HttpClient::new(&config)?,
        Arc::new(UserRegistry::new()),
        random,
        Arc::new(Recorder::new()),
        config.pause,
    ));

    let summary = run(&config, runner).await;
    println!("{summary}");

    Ok(())
}
