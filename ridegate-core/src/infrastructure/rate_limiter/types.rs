//! Rate limiter types and core data structures

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::config::{RateLimitConfig, RateLimitStrategy};

/// Message returned to callers that exceeded their window
pub const TOO_MANY_REQUESTS: &str = "Too many requests";

/// Key used to identify rate limit buckets
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RateLimitKey {
    /// Rate limit by client address
    Ip(String),
    /// Rate limit by authenticated subject id
    Subject(String),
    /// One bucket shared by every caller
    Global,
}

impl RateLimitKey {
    /// Derive the bucket for a request under `strategy`.
    ///
    /// The subject strategy falls back to the client address for callers
    /// without a subject.
    pub fn for_strategy(
        strategy: RateLimitStrategy,
        client_ip: &str,
        subject: Option<&str>,
    ) -> Self {
        match strategy {
            RateLimitStrategy::Ip => RateLimitKey::Ip(client_ip.to_string()),
            RateLimitStrategy::Subject => match subject.map(str::trim) {
                Some(subject) if !subject.is_empty() => RateLimitKey::Subject(subject.to_string()),
                _ => RateLimitKey::Ip(client_ip.to_string()),
            },
            RateLimitStrategy::Global => RateLimitKey::Global,
        }
    }

    /// The caller identity inside the bucket name
    pub fn identity(&self) -> &str {
        match self {
            RateLimitKey::Ip(ip) => ip,
            RateLimitKey::Subject(id) => id,
            RateLimitKey::Global => "global",
        }
    }

    /// Convert to a Redis-compatible key string
    pub fn to_redis_key(&self, prefix: &str) -> String {
        match self {
            RateLimitKey::Ip(ip) => format!("{}:ip:{}", prefix, ip),
            RateLimitKey::Subject(id) => format!("{}:subject:{}", prefix, id),
            RateLimitKey::Global => format!("{}:global", prefix),
        }
    }
}

impl std::fmt::Display for RateLimitKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateLimitKey::Ip(ip) => write!(f, "ip:{}", ip),
            RateLimitKey::Subject(id) => write!(f, "subject:{}", id),
            RateLimitKey::Global => write!(f, "global"),
        }
    }
}

/// Limit and window applied to one bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPolicy {
    /// Maximum requests inside the trailing window
    pub limit: u32,
    /// Trailing window length in seconds
    pub window_seconds: u64,
}

impl WindowPolicy {
    pub fn new(limit: u32, window_seconds: u64) -> Self {
        Self {
            limit,
            window_seconds,
        }
    }

    pub fn window_millis(&self) -> i64 {
        i64::try_from(self.window_seconds)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000)
    }
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self::new(120, 60)
    }
}

impl From<&RateLimitConfig> for WindowPolicy {
    fn from(config: &RateLimitConfig) -> Self {
        Self::new(config.limit, config.window_seconds)
    }
}

/// Result of a rate limit check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request admitted
    Allowed {
        /// Requests counted in the window, this one included
        count: u64,
        limit: u32,
        remaining: u32,
        /// Seconds until an idle bucket is forgotten
        reset_after: u64,
    },
    /// Request over the limit
    Limited {
        count: u64,
        limit: u32,
        /// Seconds the caller should wait before retrying
        retry_after: u64,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }

    pub fn limit(&self) -> u32 {
        match self {
            RateLimitResult::Allowed { limit, .. } | RateLimitResult::Limited { limit, .. } => {
                *limit
            }
        }
    }

    pub fn remaining(&self) -> u32 {
        match self {
            RateLimitResult::Allowed { remaining, .. } => *remaining,
            RateLimitResult::Limited { .. } => 0,
        }
    }

    pub fn retry_after(&self) -> Option<u64> {
        match self {
            RateLimitResult::Allowed { .. } => None,
            RateLimitResult::Limited { retry_after, .. } => Some(*retry_after),
        }
    }

    /// Result used while rate limiting is switched off
    pub fn unlimited() -> Self {
        RateLimitResult::Allowed {
            count: 0,
            limit: u32::MAX,
            remaining: u32::MAX,
            reset_after: 0,
        }
    }
}

/// Get current time in milliseconds since Unix epoch
pub fn current_time_millis() -> i64 {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO);
    i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_keys() {
        assert_eq!(
            RateLimitKey::Ip("10.0.0.1".into()).to_redis_key("ratelimit"),
            "ratelimit:ip:10.0.0.1"
        );
        assert_eq!(
            RateLimitKey::Subject("rider-9".into()).to_redis_key("ratelimit"),
            "ratelimit:subject:rider-9"
        );
        assert_eq!(RateLimitKey::Global.to_redis_key("rl"), "rl:global");
    }

    #[test]
    fn test_subject_strategy_falls_back_to_ip() {
        let with_subject =
            RateLimitKey::for_strategy(RateLimitStrategy::Subject, "10.0.0.1", Some("rider-9"));
        assert_eq!(with_subject, RateLimitKey::Subject("rider-9".into()));

        let blank = RateLimitKey::for_strategy(RateLimitStrategy::Subject, "10.0.0.1", Some(" "));
        assert_eq!(blank, RateLimitKey::Ip("10.0.0.1".into()));

        let global = RateLimitKey::for_strategy(RateLimitStrategy::Global, "10.0.0.1", None);
        assert_eq!(global, RateLimitKey::Global);
    }

    #[test]
    fn test_limited_result_accessors() {
        let limited = RateLimitResult::Limited {
            count: 4,
            limit: 3,
            retry_after: 60,
        };
        assert!(!limited.is_allowed());
        assert_eq!(limited.remaining(), 0);
        assert_eq!(limited.retry_after(), Some(60));
        assert_eq!(limited.limit(), 3);
    }

    #[test]
    fn test_default_policy() {
        let policy = WindowPolicy::default();
        assert_eq!(policy.limit, 120);
        assert_eq!(policy.window_millis(), 60_000);
    }

    #[test]
    fn test_current_time_is_after_2020() {
        assert!(current_time_millis() > 1_577_836_800_000);
    }
}
