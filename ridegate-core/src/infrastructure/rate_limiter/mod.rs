//! Rate Limiting Infrastructure
//!
//! This module provides per-caller rate limiting with:
//! - Sliding window log over a sorted set (exact count, no bursts past the limit)
//! - Buckets per client address, per subject, or one global bucket
//! - Dragonfly/Redis storage for distributed rate limiting

pub mod service;
pub mod sliding_window;
pub mod types;

pub use service::RateLimiterService;
pub use sliding_window::SlidingWindowLimiter;
pub use types::{
    RateLimitKey, RateLimitResult, TOO_MANY_REQUESTS, WindowPolicy, current_time_millis,
};
