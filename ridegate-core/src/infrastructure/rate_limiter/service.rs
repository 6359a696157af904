//! Rate Limiter Service
//!
//! Binds the sliding window limiter to the configured policy so HTTP
//! middleware only has to supply the caller's bucket.

use std::sync::Arc;

use super::sliding_window::SlidingWindowLimiter;
use super::types::{RateLimitKey, RateLimitResult, WindowPolicy};
use crate::config::RateLimitConfig;
use crate::domain::GuardError;
use crate::infrastructure::store::SharedStore;

/// Main rate limiter service
pub struct RateLimiterService {
    limiter: SlidingWindowLimiter,
    policy: WindowPolicy,
    config: RateLimitConfig,
}

impl RateLimiterService {
    pub fn new(store: Arc<dyn SharedStore>, config: RateLimitConfig) -> Self {
        let limiter = SlidingWindowLimiter::new(store, &config.key_prefix);
        let policy = WindowPolicy::from(&config);

        Self {
            limiter,
            policy,
            config,
        }
    }

    /// Check if rate limiting is enabled
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Record a request for `key` under the configured policy
    pub async fn check(&self, key: &RateLimitKey) -> Result<RateLimitResult, GuardError> {
        if !self.config.enabled {
            return Ok(RateLimitResult::unlimited());
        }

        self.limiter.check_and_consume(key, self.policy).await
    }

    /// Get the configuration
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }
}
