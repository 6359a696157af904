//! Sliding Window Rate Limiter
//!
//! Sliding-window log over a sorted set: every request is recorded as one
//! member scored by its arrival time in milliseconds, members older than the
//! window are dropped, and the remaining cardinality is compared against the
//! limit.
//!
//! Per request the store sees, in order:
//! 1. `ZADD key now "{now}-{nonce}"` (the nonce keeps same-millisecond requests distinct)
//! 2. `ZREMRANGEBYSCORE key 0 (now - window)` (inclusive, so a request exactly
//!    one window old no longer counts)
//! 3. `ZCARD key`
//! 4. `EXPIRE key window`
//!
//! The insert happens before the count, so rejected requests occupy the
//! window as well. The steps are not one transaction; concurrent callers may
//! see each other's inserts, which can only make the limiter stricter.

use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::types::{RateLimitKey, RateLimitResult, WindowPolicy, current_time_millis};
use crate::domain::GuardError;
use crate::infrastructure::store::SharedStore;

/// Sliding-window log limiter over the shared store
pub struct SlidingWindowLimiter {
    store: Arc<dyn SharedStore>,
    key_prefix: String,
}

impl SlidingWindowLimiter {
    /// Create a new sliding window limiter
    pub fn new(store: Arc<dyn SharedStore>, key_prefix: &str) -> Self {
        Self {
            store,
            key_prefix: key_prefix.to_string(),
        }
    }

    /// Record one request for `key` and decide whether it is admitted
    pub async fn check_and_consume(
        &self,
        key: &RateLimitKey,
        policy: WindowPolicy,
    ) -> Result<RateLimitResult, GuardError> {
        self.check_and_consume_at(key, policy, current_time_millis())
            .await
    }

    /// Same as [`check_and_consume`](Self::check_and_consume) with an explicit
    /// clock reading in milliseconds.
    ///
    /// # Errors
    /// `GuardError::InvalidArgument` for a zero limit or window, and
    /// `GuardError::Store` when any store step fails (no verdict is produced).
    pub async fn check_and_consume_at(
        &self,
        key: &RateLimitKey,
        policy: WindowPolicy,
        now_ms: i64,
    ) -> Result<RateLimitResult, GuardError> {
        if policy.limit == 0 {
            return Err(GuardError::invalid_argument("rate limit must be positive"));
        }
        if policy.window_seconds == 0 {
            return Err(GuardError::invalid_argument(
                "rate limit window must be at least one second",
            ));
        }

        if key.identity().trim().is_empty() {
            warn!("Rate limit identity is empty; caller shares the unnamed bucket");
        }

        let redis_key = key.to_redis_key(&self.key_prefix);
        let member = format!("{}-{}", now_ms, Uuid::new_v4().simple());
        let window_start = now_ms.saturating_sub(policy.window_millis());

        self.store
            .sorted_set_insert(&redis_key, now_ms, &member)
            .await?;
        self.store
            .sorted_set_remove_range(&redis_key, 0, window_start)
            .await?;
        let count = self.store.sorted_set_cardinality(&redis_key).await?;
        self.store
            .expire(&redis_key, policy.window_seconds)
            .await?;

        if count > u64::from(policy.limit) {
            debug!(
                key = %key,
                count = count,
                limit = policy.limit,
                "Rate limit exceeded"
            );
            return Ok(RateLimitResult::Limited {
                count,
                limit: policy.limit,
                retry_after: policy.window_seconds,
            });
        }

        let remaining = u32::try_from(u64::from(policy.limit) - count).unwrap_or(0);
        debug!(
            key = %key,
            count = count,
            remaining = remaining,
            "Rate limit check passed"
        );

        Ok(RateLimitResult::Allowed {
            count,
            limit: policy.limit,
            remaining,
            reset_after: policy.window_seconds,
        })
    }
}
