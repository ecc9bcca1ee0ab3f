mod utils;
use utils::*;

use coinload::prelude::*;
use coinload::ScenarioError;
use reqwest::Client;
use serde_json::Value;
use std::net::TcpListener as StdTcpListener;

fn config(api_base: &str) -> LoadConfig {
    LoadConfig::default()
        .api_base(api_base)
        .pause(PauseRange::none())
}

async fn coins(api_base: &str, user: &UserRecord) -> i64 {
    let info: Value = Client::new()
        .get(format!("{api_base}/info"))
        .bearer_auth(user.bearer())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    info["coins"].as_i64().unwrap()
}

#[tokio::test]
async fn registers_against_shop() {
    let api_base = spawn_mock().await;
    let runner = runner(&config(&api_base), 1);

    let user = runner.create_user().await.unwrap();

    assert!(user.token.is_some());
    assert_eq!(runner.registry().get(&user.username).unwrap(), Some(user.clone()));
    assert_eq!(runner.recorder().checks_passed(Step::CreateUser), 1);
    assert_eq!(coins(&api_base, &user).await, 1000);
}

#[tokio::test]
async fn full_iteration_passes_every_check() {
    let api_base = spawn_mock().await;
    let runner = runner(&config(&api_base), 2);

    let first = runner.create_user().await.unwrap();
    runner.run_iteration().await.unwrap();

    let summary = runner.recorder().summary(Default::default(), 1);
    assert_eq!(summary.checks_passed, 5);
    assert_eq!(summary.checks_failed, 0);

    // One cup bought, one coin moved between the two users.
    let registry = runner.registry();
    assert_eq!(registry.len().unwrap(), 2);
    let second = registry.pick_pair(&SeededRandom::new(0)).unwrap();
    let other = if second.0.username == first.username {
        second.1
    } else {
        second.0
    };
    let total = coins(&api_base, &first).await + coins(&api_base, &other).await;
    assert_eq!(total, 2 * 1000 - 20);
}

#[tokio::test]
async fn unknown_route_aborts_with_decode_error() {
    let api_base = spawn_mock().await;
    // Drop the `/api` prefix so every request misses the router.
    let root = api_base.trim_end_matches("/api").to_string();
    let runner = runner(&config(&root), 3);

    let err = runner.run_iteration().await.unwrap_err();

    assert!(matches!(err, ScenarioError::Decode { .. }), "{err}");
    assert_eq!(runner.recorder().checks_failed(Step::CreateUser), 1);
    assert!(runner.registry().is_empty().unwrap());
}

#[tokio::test]
async fn unreachable_api_aborts_iteration() {
    let addr = {
        let listener = StdTcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let runner = runner(&config(&format!("http://{addr}/api")), 4);

    let err = runner.run_iteration().await.unwrap_err();

    assert!(matches!(err, ScenarioError::Request { .. }), "{err}");
    let summary = runner.recorder().summary(Default::default(), 1);
    assert_eq!(summary.checks_total(), 0);
    assert_eq!(summary.requests, 0);
    assert_eq!(summary.transport_errors, 1);
    assert_eq!(summary.error_rate(), 1.);
}

#[tokio::test]
async fn invalid_tokens_fail_checks_without_aborting() {
    let api_base = spawn_mock().await;
    let runner = runner(&config(&api_base), 5);

    runner
        .registry()
        .insert(UserRecord {
            username: "ghost".into(),
            password: "pw".into(),
            token: None,
        })
        .unwrap();

    // Purchases and info lookups as the tokenless ghost are rejected, but nothing aborts.
    for _ in 0..20 {
        runner.purchase().await.unwrap();
        runner.get_user_info().await.unwrap();
    }
    assert_eq!(runner.recorder().checks_passed(Step::Purchase), 0);
    assert_eq!(runner.recorder().checks_failed(Step::UserInfo), 20);
}
