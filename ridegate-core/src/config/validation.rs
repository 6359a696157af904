//! Configuration validation module

use crate::config::{
    IdempotencyConfig, LoggingConfig, RateLimitConfig, ServerConfig, StoreBackend, StoreConfig,
};

/// Trait for validating configuration sections
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Server configuration error: {message}")]
    Server { message: String },

    #[error("Store configuration error: {message}")]
    Store { message: String },

    #[error("Rate limit configuration error: {message}")]
    RateLimit { message: String },

    #[error("Idempotency configuration error: {message}")]
    Idempotency { message: String },

    #[error("Logging configuration error: {message}")]
    Logging { message: String },
}

impl ValidationError {
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::RateLimit {
            message: message.into(),
        }
    }

    pub fn idempotency(message: impl Into<String>) -> Self {
        Self::Idempotency {
            message: message.into(),
        }
    }

    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // u16 cannot exceed 65535, so only 0 is out of range
        if self.port == 0 {
            return Err(ValidationError::server(format!(
                "Port must be in range 1-65535, got {}",
                self.port
            )));
        }

        if self.host.is_empty() {
            return Err(ValidationError::server("Host cannot be empty"));
        }

        if self.request_timeout_seconds == 0 {
            return Err(ValidationError::server(
                "Request timeout must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Validate for StoreConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.backend == StoreBackend::Dragonfly
            && !self.url.starts_with("redis://")
            && !self.url.starts_with("rediss://")
        {
            return Err(ValidationError::store(format!(
                "Store url must start with redis:// or rediss://, got: {}",
                self.url
            )));
        }

        if self.connection_timeout_seconds == 0 {
            return Err(ValidationError::store(
                "Connection timeout must be greater than 0",
            ));
        }

        if self.cleanup_interval_seconds == 0 {
            return Err(ValidationError::store(
                "Cleanup interval must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Validate for RateLimitConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.limit == 0 {
            return Err(ValidationError::rate_limit("Limit must be greater than 0"));
        }

        if self.window_seconds == 0 {
            return Err(ValidationError::rate_limit(
                "Window must be at least 1 second",
            ));
        }

        if self.key_prefix.trim().is_empty() {
            return Err(ValidationError::rate_limit("Key prefix cannot be empty"));
        }

        Ok(())
    }
}

impl Validate for IdempotencyConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.ttl_seconds == 0 {
            return Err(ValidationError::idempotency(
                "TTL must be at least 1 second",
            ));
        }

        if self.key_prefix.trim().is_empty() {
            return Err(ValidationError::idempotency("Key prefix cannot be empty"));
        }

        if self.header_name.trim().is_empty() || self.subject_header.trim().is_empty() {
            return Err(ValidationError::idempotency(
                "Header names cannot be empty",
            ));
        }

        Ok(())
    }
}

impl Validate for LoggingConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        match self.format.as_str() {
            "json" | "pretty" => Ok(()),
            other => Err(ValidationError::logging(format!(
                "Log format must be \"json\" or \"pretty\", got: {}",
                other
            ))),
        }
    }
}
