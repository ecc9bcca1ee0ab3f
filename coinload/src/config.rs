use crate::constants::*;
use crate::error::ConfigError;
use std::num::NonZeroU32;
use std::time::Duration;

/// Inclusive range of whole seconds to pause between journey steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PauseRange {
    pub min_secs: u64,
    pub max_secs: u64,
}

impl PauseRange {
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self { min_secs, max_secs }
    }

    /// No pauses at all. Mostly useful for tests.
    pub fn none() -> Self {
        Self::new(0, 0)
    }
}

impl Default for PauseRange {
    fn default() -> Self {
        Self::new(DEFAULT_PAUSE_MIN_SECS, DEFAULT_PAUSE_MAX_SECS)
    }
}

/// Pass/fail criteria for an external evaluator. They are exported, never enforced here.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    pub max_error_rate: f64,
    pub max_avg_latency: Duration,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_error_rate: DEFAULT_MAX_ERROR_RATE,
            max_avg_latency: DEFAULT_MAX_AVG_LATENCY,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LoadConfig {
    pub api_base: String,
    pub rate: NonZeroU32,
    pub min_vus: usize,
    pub max_vus: usize,
    pub duration: Duration,
    pub graceful_stop: Duration,
    pub pause: PauseRange,
    pub request_timeout: Option<Duration>,
    pub thresholds: Thresholds,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            rate: DEFAULT_RATE,
            min_vus: DEFAULT_MIN_VUS,
            max_vus: DEFAULT_MAX_VUS,
            duration: DEFAULT_DURATION,
            graceful_stop: DEFAULT_GRACEFUL_STOP,
            pause: PauseRange::default(),
            request_timeout: None,
            thresholds: Thresholds::default(),
        }
    }
}

impl LoadConfig {
    /// Point the load test at a different API. A trailing `/` is dropped.
    pub fn api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    /// Start this many iterations per second.
    pub fn rate(mut self, rate: NonZeroU32) -> Self {
        self.rate = rate;
        self
    }

    pub fn vus(mut self, min_vus: usize, max_vus: usize) -> Self {
        self.min_vus = min_vus;
        self.max_vus = max_vus;
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn graceful_stop(mut self, graceful_stop: Duration) -> Self {
        self.graceful_stop = graceful_stop;
        self
    }

    pub fn pause(mut self, pause: PauseRange) -> Self {
        self.pause = pause;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(ConfigError::BaseUrl(self.api_base.clone()));
        }

        if self.min_vus == 0 || self.min_vus > self.max_vus {
            return Err(ConfigError::VirtualUsers {
                min: self.min_vus,
                max: self.max_vus,
            });
        }

        if self.pause.min_secs > self.pause.max_secs {
            return Err(ConfigError::PauseRange {
                min: self.pause.min_secs,
                max: self.pause.max_secs,
            });
        }

        let error_rate = self.thresholds.max_error_rate;
        if !(0.0..=1.0).contains(&error_rate) {
            return Err(ConfigError::ErrorRate(error_rate));
        }

        Ok(())
    }
}
