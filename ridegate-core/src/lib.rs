//! Ridegate Core - Request guards for the rideshare API
//!
//! This crate provides the two pieces of request handling that carry real
//! correctness contracts, both backed by a shared Redis/Dragonfly store:
//!
//! # Modules
//!
//! - [`config`] - Strongly-typed configuration with TOML and environment variable support
//! - [`domain`] - Error taxonomy shared by the guards
//! - [`infrastructure`] - Shared store backends, the idempotency gate and the rate limiter
//! - [`logging`] - Structured logging with tracing
//!
//! # Architecture
//!
//! ```text
//! ridegate-core/
//! ├── domain/              # StoreError / GuardError
//! ├── infrastructure/
//! │   ├── store/           # SharedStore trait, Dragonfly + in-memory backends
//! │   ├── idempotency/     # SET NX EX gate
//! │   └── rate_limiter/    # sorted-set sliding window
//! └── config/              # Configuration management
//! ```
//!
//! # Configuration
//!
//! ```rust,ignore
//! use ridegate_core::Config;
//!
//! let config = Config::load()?;
//! ```
//!
//! Environment variables use the `RIDEGATE__` prefix with double underscore separators:
//!
//! ```bash
//! RIDEGATE__SERVER__PORT=3000
//! RIDEGATE__RATE_LIMIT__LIMIT=120
//! RIDEGATE__IDEMPOTENCY__TTL_SECONDS=3600
//! ```
//!
//! # Logging
//!
//! ```rust,ignore
//! use ridegate_core::init_tracing;
//!
//! init_tracing(&config.logging)?;
//! ```

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;

pub use config::Config;
pub use logging::init_tracing;
