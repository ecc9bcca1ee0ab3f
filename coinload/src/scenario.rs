//! The user journey: register, buy a cup, send a coin, look up account info.
use crate::client::{ApiClient, ApiRequest, ApiResponse};
use crate::config::PauseRange;
use crate::constants::{PURCHASE_ITEM, TRANSFER_AMOUNT};
use crate::error::{ClientError, ScenarioError};
use crate::random::RandomSource;
use crate::recorder::{Recorder, Step};
use crate::registry::UserRegistry;
use crate::user::{AuthResponse, Credentials, TransferRequest, UserRecord};
use reqwest::StatusCode;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

pub const AUTH_PATH: &str = "/auth";
pub const SEND_COIN_PATH: &str = "/sendCoin";
pub const INFO_PATH: &str = "/info";

pub fn purchase_path() -> String {
    format!("/buy/{PURCHASE_ITEM}")
}

/// Runs journey iterations against one API, sharing a single [`UserRegistry`].
///
/// Every dependency is injected so the same runner can be driven by the fixed-rate executor or
/// step by step from a test.
pub struct ScenarioRunner<C> {
    client: C,
    registry: Arc<UserRegistry>,
    random: Arc<dyn RandomSource>,
    recorder: Arc<Recorder>,
    pause: PauseRange,
}

impl<C> ScenarioRunner<C> {
    pub fn new(
        client: C,
        registry: Arc<UserRegistry>,
        random: Arc<dyn RandomSource>,
        recorder: Arc<Recorder>,
        pause: PauseRange,
    ) -> Self {
        Self {
            client,
            registry,
            random,
            recorder,
            pause,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn registry(&self) -> &Arc<UserRegistry> {
        &self.registry
    }

    pub fn recorder(&self) -> &Arc<Recorder> {
        &self.recorder
    }
}

impl<C: ApiClient> ScenarioRunner<C> {
    /// One full journey. Failed checks do not stop it; request errors and registry boundary
    /// errors do.
    #[instrument(name = "iteration", skip_all)]
    pub async fn run_iteration(&self) -> Result<(), ScenarioError> {
        self.create_user().await?;
        self.pause().await;
        self.purchase().await?;
        self.pause().await;
        self.transfer().await?;
        self.pause().await;
        self.get_user_info().await?;
        self.pause().await;
        Ok(())
    }

    /// Register a fresh user and remember it along with whatever token came back.
    ///
    /// The token is read even when the status check fails, so a failed registration still lands
    /// in the registry, possibly without a token.
    #[instrument(skip_all)]
    pub async fn create_user(&self) -> Result<UserRecord, ScenarioError> {
        let user = UserRecord::generate(self.random.as_ref());
        let body = encode(AUTH_PATH, &Credentials::from(&user))?;

        let res = self
            .call(Step::CreateUser, ApiRequest::post(AUTH_PATH, None, body))
            .await?;
        let passed = self.check(Step::CreateUser, &res);

        let auth: AuthResponse = res.json().map_err(|source| ScenarioError::Decode {
            path: AUTH_PATH.to_string(),
            source,
        })?;
        if !passed {
            warn!(
                "Registering {} anyway after a failed check (token present: {})",
                user.username,
                auth.token.is_some()
            );
        }

        let user = user.with_token(auth.token);
        self.registry.insert(user.clone())?;
        debug!("Registered {}", user.username);
        Ok(user)
    }

    /// Buy a cup as a random registered user. Returns the check outcome.
    #[instrument(skip_all)]
    pub async fn purchase(&self) -> Result<bool, ScenarioError> {
        let user = self.registry.pick(self.random.as_ref())?;
        let path = purchase_path();

        let res = self
            .call(Step::Purchase, ApiRequest::get(&path, user.bearer()))
            .await?;
        Ok(self.check(Step::Purchase, &res))
    }

    /// Send one coin between two distinct random users. Returns the check outcome.
    #[instrument(skip_all)]
    pub async fn transfer(&self) -> Result<bool, ScenarioError> {
        let (sender, recipient) = self.registry.pick_pair(self.random.as_ref())?;
        let body = encode(
            SEND_COIN_PATH,
            &TransferRequest {
                to_user: &recipient,
                amount: TRANSFER_AMOUNT,
            },
        )?;
        trace!("{} -> {}", sender.username, recipient.username);

        let res = self
            .call(
                Step::Transfer,
                ApiRequest::post(SEND_COIN_PATH, Some(sender.bearer()), body),
            )
            .await?;
        Ok(self.check(Step::Transfer, &res))
    }

    /// Fetch account info as a random user. Returns the check outcome.
    #[instrument(skip_all)]
    pub async fn get_user_info(&self) -> Result<bool, ScenarioError> {
        let user = self.registry.pick(self.random.as_ref())?;

        let res = self
            .call(Step::UserInfo, ApiRequest::get(INFO_PATH, user.bearer()))
            .await?;
        Ok(self.check(Step::UserInfo, &res))
    }

    async fn call(&self, step: Step, request: ApiRequest) -> Result<ApiResponse, ScenarioError> {
        let path = request.path.clone();
        let start = Instant::now();
        match self.client.send(request).await {
            Ok(res) => {
                self.recorder.request(step, start.elapsed());
                Ok(res)
            }
            Err(source) => {
                self.recorder.transport_error(step);
                Err(ScenarioError::Request { path, source })
            }
        }
    }

    fn check(&self, step: Step, res: &ApiResponse) -> bool {
        let passed = self.recorder.check(step, res.status == StatusCode::OK);
        if !passed {
            warn!("{step}: expected status 200, got {}", res.status);
        }
        passed
    }

    async fn pause(&self) {
        // An inverted range pins the pause to its lower bound.
        let PauseRange { min_secs, max_secs } = self.pause;
        let secs = self.random.int_between(min_secs, max_secs.max(min_secs));
        trace!("Pausing for {secs}s");
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }
}

fn encode<T: Serialize>(path: &str, body: &T) -> Result<serde_json::Value, ScenarioError> {
    serde_json::to_value(body).map_err(|e| ScenarioError::Request {
        path: path.to_string(),
        source: ClientError::Encode(e),
    })
}
