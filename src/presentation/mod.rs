//! HTTP presentation layer

pub mod controllers;
pub mod middleware;
pub mod models;
pub mod routes;

pub use middleware::{
    IdempotencyState, RateLimiterState, idempotency_middleware, logging_middleware,
    rate_limit_middleware,
};
pub use routes::create_router;
