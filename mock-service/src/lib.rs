//! In-memory stand-in for the coin shop API.
//!
//! New users start with 1000 coins. Tokens are opaque random strings that never expire.
use axum::{
    body::Bytes,
    debug_handler,
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rand::distributions::{Alphanumeric, DistString};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

pub const INITIAL_BALANCE: i64 = 1000;

const ITEMS: &[(&str, i64)] = &[
    ("t-shirt", 80),
    ("cup", 20),
    ("book", 50),
    ("pen", 10),
    ("powerbank", 200),
    ("hoody", 300),
    ("umbrella", 200),
    ("socks", 10),
    ("wallet", 50),
    ("pink-hoody", 500),
];

const TOKEN_LEN: usize = 32;

pub async fn run(addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    serve(listener).await
}

pub async fn serve(listener: TcpListener) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Mock coin shop listening on {addr}");
    }
    axum::serve(listener, router()).await
}

pub fn router() -> Router {
    let api = Router::new()
        .route("/auth", post(auth))
        .route("/buy/:item", get(buy))
        .route("/sendCoin", post(send_coin))
        .route("/info", get(info));

    Router::new()
        .nest("/api", api)
        .with_state(Arc::new(Mutex::new(Shop::default())))
        .layer(TraceLayer::new_for_http())
}

type SharedShop = Arc<Mutex<Shop>>;

#[derive(Default)]
struct Shop {
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, String>,
}

struct Account {
    password: String,
    coins: i64,
    inventory: BTreeMap<String, u64>,
    received: Vec<CoinTransaction>,
    sent: Vec<CoinTransaction>,
}

impl Account {
    fn new(password: String) -> Self {
        Self {
            password,
            coins: INITIAL_BALANCE,
            inventory: BTreeMap::new(),
            received: vec![],
            sent: vec![],
        }
    }
}

impl Shop {
    fn issue_token(&mut self, username: &str) -> String {
        let token = Alphanumeric.sample_string(&mut rand::thread_rng(), TOKEN_LEN);
        self.tokens.insert(token.clone(), username.to_string());
        token
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<String, ShopError> {
        let header = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or(ShopError::Unauthorized("missing auth header"))?;

        let token = header.strip_prefix("Bearer ").unwrap_or(header);
        self.tokens
            .get(token)
            .cloned()
            .ok_or(ShopError::Unauthorized("invalid token"))
    }

    fn account_mut(&mut self, username: &str) -> Result<&mut Account, ShopError> {
        self.accounts
            .get_mut(username)
            .ok_or(ShopError::Unauthorized("employee not found"))
    }
}

#[derive(Debug, Error)]
enum ShopError {
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("internal server error")]
    Internal,
}

impl<T> From<PoisonError<T>> for ShopError {
    fn from(_err: PoisonError<T>) -> Self {
        Self::Internal
    }
}

impl IntoResponse for ShopError {
    fn into_response(self) -> Response {
        let status = match self {
            ShopError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ShopError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ShopError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        debug!("{status}: {self}");
        (status, Json(ErrorResponse { errors: self.to_string() })).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    errors: String,
}

#[derive(Deserialize)]
struct AuthRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct AuthResponse {
    token: String,
}

#[debug_handler]
async fn auth(State(shop): State<SharedShop>, body: Bytes) -> Result<Json<AuthResponse>, ShopError> {
    let request: AuthRequest = serde_json::from_slice(&body)
        .map_err(|_| ShopError::BadRequest("failed to parse request"))?;
    if request.username.is_empty() || request.password.is_empty() {
        return Err(ShopError::BadRequest("invalid request body"));
    }

    let mut shop = shop.lock()?;
    match shop.accounts.get(&request.username) {
        Some(account) if account.password != request.password => {
            return Err(ShopError::Unauthorized("invalid credentials"));
        }
        Some(_) => {}
        None => {
            debug!("Registering {}", request.username);
            shop.accounts
                .insert(request.username.clone(), Account::new(request.password));
        }
    }

    let token = shop.issue_token(&request.username);
    Ok(Json(AuthResponse { token }))
}

#[debug_handler]
async fn buy(
    State(shop): State<SharedShop>,
    headers: HeaderMap,
    Path(item): Path<String>,
) -> Result<StatusCode, ShopError> {
    let mut shop = shop.lock()?;
    let username = shop.authorize(&headers)?;

    let price = ITEMS
        .iter()
        .find(|(name, _)| *name == item)
        .map(|(_, price)| *price)
        .ok_or(ShopError::BadRequest("item not found"))?;

    let account = shop.account_mut(&username)?;
    if account.coins < price {
        return Err(ShopError::BadRequest("not enough coins"));
    }
    account.coins -= price;
    *account.inventory.entry(item).or_default() += 1;

    Ok(StatusCode::OK)
}

/// Who to send coins to. The shop's contract is a bare username, but a user object carrying a
/// `username` is accepted too.
#[derive(Deserialize)]
#[serde(untagged)]
enum Recipient {
    Username(String),
    User { username: String },
}

impl Recipient {
    fn username(self) -> String {
        match self {
            Recipient::Username(username) | Recipient::User { username } => username,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendCoinRequest {
    to_user: Recipient,
    amount: i64,
}

#[debug_handler]
async fn send_coin(
    State(shop): State<SharedShop>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ShopError> {
    let mut shop = shop.lock()?;
    let from = shop.authorize(&headers)?;

    let request: SendCoinRequest = serde_json::from_slice(&body)
        .map_err(|_| ShopError::BadRequest("failed to parse request"))?;
    let to = request.to_user.username();
    let amount = request.amount;

    if to.is_empty() || amount == 0 {
        return Err(ShopError::BadRequest("invalid request body"));
    }
    if amount < 0 {
        return Err(ShopError::BadRequest("negative amount"));
    }
    if to == from {
        return Err(ShopError::BadRequest("can't send coins to yourself"));
    }
    if !shop.accounts.contains_key(&to) {
        return Err(ShopError::BadRequest("receiver not found"));
    }

    let sender = shop.account_mut(&from)?;
    if sender.coins < amount {
        return Err(ShopError::BadRequest("not enough coins to send"));
    }
    sender.coins -= amount;
    sender.sent.push(CoinTransaction {
        user: to.clone(),
        amount,
    });

    let receiver = shop.account_mut(&to)?;
    receiver.coins += amount;
    receiver.received.push(CoinTransaction { user: from, amount });

    Ok(StatusCode::OK)
}

#[derive(Clone, Serialize)]
struct CoinTransaction {
    user: String,
    amount: i64,
}

#[derive(Serialize)]
struct InventoryItem {
    #[serde(rename = "type")]
    kind: String,
    quantity: u64,
}

#[derive(Serialize)]
struct CoinHistory {
    received: Vec<CoinTransaction>,
    sent: Vec<CoinTransaction>,
}

#[derive(Serialize)]
struct InfoResponse {
    coins: i64,
    inventory: Vec<InventoryItem>,
    coin_history: CoinHistory,
}

#[debug_handler]
async fn info(
    State(shop): State<SharedShop>,
    headers: HeaderMap,
) -> Result<Json<InfoResponse>, ShopError> {
    let mut shop = shop.lock()?;
    let username = shop.authorize(&headers)?;
    let account = shop.account_mut(&username)?;

    Ok(Json(InfoResponse {
        coins: account.coins,
        inventory: account
            .inventory
            .iter()
            .map(|(kind, quantity)| InventoryItem {
                kind: kind.clone(),
                quantity: *quantity,
            })
            .collect(),
        coin_history: CoinHistory {
            received: account.received.clone(),
            sent: account.sent.clone(),
        },
    }))
}
