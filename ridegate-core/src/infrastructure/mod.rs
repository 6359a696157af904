//! Infrastructure layer: shared store backends and the request guards built on them

pub mod idempotency;
pub mod rate_limiter;
pub mod store;

pub use idempotency::{ClaimOutcome, IdempotencyGate, OperationKey};
pub use rate_limiter::{
    RateLimitKey, RateLimitResult, RateLimiterService, SlidingWindowLimiter, TOO_MANY_REQUESTS,
    WindowPolicy,
};
pub use store::{DragonflyStore, InMemoryStore, SharedStore, connect_store, start_cleanup_task};
