//! In-memory keyed rate limiter using the governor crate.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::{Clock, DefaultClock};
use governor::middleware::StateInformationMiddleware;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter as GovernorRateLimiter};

use forge_core::ports::{RateLimitError, RateLimitResult, RateLimiter};

type KeyedRateLimiter = GovernorRateLimiter<
    String,
    DefaultKeyedStateStore<String>,
    DefaultClock,
    StateInformationMiddleware,
>;

/// Number of tracked keys above which stale entries are pruned.
const PRUNE_THRESHOLD: usize = 10_000;

/// Rate limiter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests per window, per key.
    pub max_requests: u32,
    /// Window duration.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window: Duration::from_secs(60),
        }
    }
}

/// Per-key rate limiter using the GCRA algorithm.
///
/// Limits are per-process, not shared across instances.
pub struct InMemoryRateLimiter {
    limiter: KeyedRateLimiter,
    clock: DefaultClock,
    config: RateLimitConfig,
}

impl InMemoryRateLimiter {
    pub fn new(config: RateLimitConfig) -> Result<Self, RateLimitError> {
        let burst = NonZeroU32::new(config.max_requests).ok_or_else(|| {
            RateLimitError::InvalidConfig("max_requests must be greater than zero".to_string())
        })?;
        let quota = Quota::with_period(config.window / config.max_requests)
            .ok_or_else(|| {
                RateLimitError::InvalidConfig("window must be greater than zero".to_string())
            })?
            .allow_burst(burst);

        let limiter =
            GovernorRateLimiter::keyed(quota).with_middleware::<StateInformationMiddleware>();

        Ok(Self {
            limiter,
            clock: DefaultClock::default(),
            config,
        })
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError> {
        if self.limiter.len() > PRUNE_THRESHOLD {
            self.limiter.retain_recent();
        }

        match self.limiter.check_key(&key.to_string()) {
            Ok(snapshot) => Ok(RateLimitResult {
                allowed: true,
                remaining: snapshot.remaining_burst_capacity(),
                reset_after: self.config.window,
            }),
            Err(not_until) => Ok(RateLimitResult {
                allowed: false,
                remaining: 0,
                reset_after: not_until.wait_time_from(self.clock.now()),
            }),
        }
    }
}
