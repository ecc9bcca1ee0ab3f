#![doc = include_str!("../README.md")]

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod executor;
pub mod random;
pub mod recorder;
pub mod registry;
pub mod scenario;
pub mod user;

pub use client::{ApiClient, HttpClient};
pub use config::LoadConfig;
pub use error::{ClientError, ConfigError, ScenarioError};
pub use recorder::{Recorder, RunSummary};
pub use registry::UserRegistry;
pub use scenario::ScenarioRunner;

pub mod prelude {
    pub use crate::client::{ApiClient, ApiRequest, ApiResponse, HttpClient};
    pub use crate::config::{LoadConfig, PauseRange, Thresholds};
    pub use crate::executor::run;
    pub use crate::random::{RandomSource, SeededRandom, ThreadRandom};
    pub use crate::recorder::{Recorder, RunSummary, Step};
    pub use crate::registry::UserRegistry;
    pub use crate::scenario::ScenarioRunner;
    pub use crate::user::UserRecord;
}
