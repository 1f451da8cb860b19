//! Worker timing and bidding settings.

use crate::config::WorkerConfig;
use crate::exchange::OfferPricing;
use std::time::Duration;

/// How long to wait for an offer to be accepted.
///
/// The status endpoint is polled every `interval`, at most `max_attempts`
/// times. The default bound is one second times sixty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptancePolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for AcceptancePolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: 60,
        }
    }
}

impl AcceptancePolicy {
    /// Upper bound on the time spent waiting for one offer.
    pub fn max_wait(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

/// Minimum pause after a failed poll.
pub const MIN_ERROR_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerSettings {
    pub poll_interval: Duration,
    pub run_once: bool,
    /// Rating attached to successful reports
    pub rating: u8,
    pub pricing: OfferPricing,
    pub acceptance: AcceptancePolicy,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self::from(&WorkerConfig::default())
    }
}

impl From<&WorkerConfig> for WorkerSettings {
    fn from(config: &WorkerConfig) -> Self {
        Self {
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            run_once: config.run_once,
            rating: config.rating,
            pricing: config.pricing.clone(),
            acceptance: AcceptancePolicy::from(&config.acceptance),
        }
    }
}

impl WorkerSettings {
    /// Pause after a poll error: the poll interval, but never under a second.
    pub fn error_backoff(&self) -> Duration {
        self.poll_interval.max(MIN_ERROR_BACKOFF)
    }
}
