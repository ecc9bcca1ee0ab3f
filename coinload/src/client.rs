//! The HTTP seam between the journey and the coin shop API.
use crate::config::LoadConfig;
use crate::error::ClientError;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};

const APPLICATION_JSON: &str = "application/json";

#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base, e.g. `/auth`.
    pub path: String,
    pub bearer: Option<String>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn get(path: &str, bearer: &str) -> Self {
        Self {
            method: Method::GET,
            path: path.to_string(),
            bearer: Some(bearer.to_string()),
            body: None,
        }
    }

    pub fn post(path: &str, bearer: Option<&str>, body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            path: path.to_string(),
            bearer: bearer.map(str::to_string),
            body: Some(body),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Anything able to deliver an [`ApiRequest`] to the coin shop.
#[trait_variant::make(ApiClient: Send)]
pub trait LocalApiClient {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError>;
}

/// [`ApiClient`] backed by a shared `reqwest` connection pool.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: reqwest::Client,
    api_base: String,
}

impl HttpClient {
    pub fn new(config: &LoadConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            api_base: config.api_base.clone(),
        })
    }
}

impl ApiClient for HttpClient {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let url = format!("{}{}", self.api_base, request.path);
        let mut builder = self
            .client
            .request(request.method, &url)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .header(ACCEPT, APPLICATION_JSON);

        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.body(serde_json::to_vec(body)?);
        }

        let res = builder.send().await?;
        let status = res.status();
        let body = res.bytes().await?.to_vec();
        trace!("{url} -> {status} ({} bytes)", body.len());

        Ok(ApiResponse { status, body })
    }
}
