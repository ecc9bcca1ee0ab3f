use coinload::prelude::*;
use std::sync::{Arc, OnceLock};
use tokio::net::TcpListener;
use tracing_subscriber::FmtSubscriber;

#[allow(unused)]
pub fn init_tracing() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let _ = FmtSubscriber::builder()
            .with_env_filter("coinload=debug,mock_service=debug")
            .with_test_writer()
            .try_init();
    });
}

/// Start a fresh mock shop on an ephemeral port and return its API base URL.
///
/// Every test gets its own shop; the server lives on the calling test's runtime.
#[allow(unused)]
pub async fn spawn_mock() -> String {
    init_tracing();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        mock_service::serve(listener).await.unwrap();
    });

    format!("http://{addr}/api")
}

#[allow(unused)]
pub fn runner(config: &LoadConfig, seed: u64) -> Arc<ScenarioRunner<HttpClient>> {
    Arc::new(ScenarioRunner::new(
        HttpClient::new(config).unwrap(),
        Arc::new(UserRegistry::new()),
        Arc::new(SeededRandom::new(seed)),
        Arc::new(Recorder::new()),
        config.pause,
    ))
}
