//! Configuration management

pub mod validation;

pub use validation::{Validate, ValidationError};

use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub rate_limit: RateLimitConfig,
    pub idempotency: IdempotencyConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Global request timeout in seconds applied at the HTTP layer.
    pub request_timeout_seconds: u64,
    /// Allowed CORS origins. Use ["*"] to allow any (development only). Empty vector -> no external origins.
    pub allowed_origins: Vec<String>,
    /// Time given to background tasks to wind down after a shutdown signal
    pub shutdown_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            request_timeout_seconds: 30,
            allowed_origins: vec!["*".to_string()],
            shutdown_timeout_seconds: 5,
        }
    }
}

/// Backend holding idempotency markers and rate windows
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Dragonfly/Redis, shared by every instance of the service
    #[default]
    Dragonfly,
    /// Process-local store (development/single instance only)
    Memory,
}

/// Shared store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Upper bound on establishing the connection, in seconds
    pub connection_timeout_seconds: u64,
    /// Purge interval for expired keys in the in-memory backend
    pub cleanup_interval_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Dragonfly,
            url: "redis://127.0.0.1:6379".to_string(),
            connection_timeout_seconds: 5,
            cleanup_interval_seconds: 300, // 5 minutes
        }
    }
}

/// What a guard middleware does when the shared store fails
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreFailurePolicy {
    /// Let the request through without the guard's guarantee
    Allow,
    /// Answer 503 instead of running the handler
    Reject,
}

/// How the caller identity for rate limiting is derived
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitStrategy {
    /// Client network address
    #[default]
    Ip,
    /// Subject header set by the upstream auth layer, falling back to the address
    Subject,
    /// One bucket for every caller
    Global,
}

/// Sliding-window rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Whether rate limiting is enabled
    pub enabled: bool,
    /// Maximum requests per caller inside the trailing window
    pub limit: u32,
    /// Trailing window length in seconds
    pub window_seconds: u64,
    /// Namespace prefix for limiter keys
    pub key_prefix: String,
    pub strategy: RateLimitStrategy,
    /// Honor x-forwarded-for / x-real-ip when deriving the client address.
    /// Enable only behind a proxy that overwrites those headers.
    pub trust_proxy_headers: bool,
    pub on_store_error: StoreFailurePolicy,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            limit: 120,
            window_seconds: 60,
            key_prefix: "ratelimit".to_string(),
            strategy: RateLimitStrategy::Ip,
            trust_proxy_headers: false,
            on_store_error: StoreFailurePolicy::Allow,
        }
    }
}

/// Idempotency key configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdempotencyConfig {
    /// Whether guarded routes require and record idempotency keys
    pub enabled: bool,
    /// Lifetime of a claimed key in seconds
    pub ttl_seconds: u64,
    /// Namespace prefix for idempotency markers
    pub key_prefix: String,
    /// Request header carrying the operation id
    pub header_name: String,
    /// Request header carrying the subject id (set by the upstream auth layer)
    pub subject_header: String,
    pub on_store_error: StoreFailurePolicy,
}

impl Default for IdempotencyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 3600,
            key_prefix: "idempotency".to_string(),
            header_name: "idempotency-key".to_string(),
            subject_header: "x-subject-id".to_string(),
            on_store_error: StoreFailurePolicy::Reject,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "json" or "pretty"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

impl Validate for Config {
    fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.store.validate()?;
        self.rate_limit.validate()?;
        self.idempotency.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigLoadError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        // Add environment-specific config if ENV is set
        if let Ok(env) = std::env::var("ENV") {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{}", env)).required(false));
        }

        // Add local config and environment variables last (highest priority)
        builder = builder
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("RIDEGATE").separator("__"));

        let mut config: Config = builder.build()?.try_deserialize()?;

        // REDIS_URL is the usual name on hosted platforms
        if let Ok(redis_url) = std::env::var("REDIS_URL") {
            config.store.url = redis_url;
        }

        config.validate()?;

        Ok(config)
    }
}

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Configuration file error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    Validation(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_guard_contract() {
        let config = Config::default();
        assert_eq!(config.rate_limit.limit, 120);
        assert_eq!(config.rate_limit.window_seconds, 60);
        assert_eq!(config.idempotency.ttl_seconds, 3600);
        assert_eq!(config.rate_limit.on_store_error, StoreFailurePolicy::Allow);
        assert_eq!(config.idempotency.on_store_error, StoreFailurePolicy::Reject);
        assert!(!config.rate_limit.trust_proxy_headers);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial_section_keeps_defaults() {
        let config: Config = config::Config::builder()
            .set_override("rate_limit.limit", 5)
            .unwrap()
            .set_override("store.backend", "memory")
            .unwrap()
            .set_override("rate_limit.on_store_error", "reject")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.rate_limit.limit, 5);
        assert_eq!(config.rate_limit.window_seconds, 60);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.rate_limit.on_store_error, StoreFailurePolicy::Reject);
        assert_eq!(config.idempotency.header_name, "idempotency-key");
    }
}
