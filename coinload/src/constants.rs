use std::num::NonZeroU32;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://localhost:8080/api";

/// Iterations started per second by the host executor.
pub const DEFAULT_RATE: NonZeroU32 = unsafe { NonZeroU32::new_unchecked(1000) };

/// Virtual users allocated up front.
pub const DEFAULT_MIN_VUS: usize = 20;

/// Upper bound on concurrently running iterations.
pub const DEFAULT_MAX_VUS: usize = 100;

pub const DEFAULT_DURATION: Duration = Duration::from_secs(30);

/// How long in-flight iterations may keep running after the test duration.
pub const DEFAULT_GRACEFUL_STOP: Duration = Duration::from_secs(30);

/// Bounds, in whole seconds, of the think-time between steps.
pub const DEFAULT_PAUSE_MIN_SECS: u64 = 0;
pub const DEFAULT_PAUSE_MAX_SECS: u64 = 5;

/// The default failed-request rate threshold
pub const DEFAULT_MAX_ERROR_RATE: f64 = 0.001;

/// The default mean request latency threshold
pub const DEFAULT_MAX_AVG_LATENCY: Duration = Duration::from_millis(50);

pub const PURCHASE_ITEM: &str = "cup";
pub const TRANSFER_AMOUNT: u32 = 1;

pub(crate) const USERNAME_SUFFIX_LEN: usize = 9;
pub(crate) const PASSWORD_LEN: usize = 12;
