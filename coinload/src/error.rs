use std::sync::PoisonError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors which abort the remainder of an iteration.
///
/// Unexpected status codes are not errors; they are recorded as failed checks.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Request to {path} failed: {source}")]
    Request {
        path: String,
        #[source]
        source: ClientError,
    },

    #[error("Response from {path} is not valid JSON: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No users registered yet")]
    EmptyRegistry,

    #[error("Transfer needs at least two users, registry holds {0}")]
    NotEnoughUsers(usize),

    #[error("Mutex is poisoned.")]
    PoisonData,
}

impl<T> From<PoisonError<T>> for ScenarioError {
    fn from(_err: PoisonError<T>) -> Self {
        Self::PoisonData
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("API base URL must start with http:// or https://, got {0:?}")]
    BaseUrl(String),

    #[error("Virtual user bounds are invalid: min={min}, max={max}")]
    VirtualUsers { min: usize, max: usize },

    #[error("Pause range is invalid: {min}s..={max}s")]
    PauseRange { min: u64, max: u64 },

    #[error("Error rate threshold must be within [0, 1], got {0}")]
    ErrorRate(f64),
}
