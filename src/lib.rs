//! Ridegate - HTTP service applying the request guards
//!
//! Wires the shared store, the sliding-window rate limiter and the
//! idempotency gate from `ridegate-core` into an axum router.

mod app;
pub mod presentation;

pub use app::{AppHandle, AppState, create_app, create_app_with_store};
pub use ridegate_core::{Config, init_tracing};

// Re-export for convenience
pub use ridegate_core;
