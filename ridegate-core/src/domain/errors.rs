//! Guard and shared-store errors

use thiserror::Error;

/// Failures of the shared key-value store.
///
/// Every variant means the same thing to a guard's caller: the store could not
/// confirm the requested primitive, so the guarantee the guard provides is not
/// available for this request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Shared store unavailable: {message}")]
    Unavailable { message: String },

    #[error("Shared store did not respond within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Shared store command {command} failed: {message}")]
    Command {
        command: &'static str,
        message: String,
    },

    #[error("Key {key} holds a value of the wrong kind for this operation")]
    WrongType { key: String },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn command(command: &'static str, message: impl Into<String>) -> Self {
        Self::Command {
            command,
            message: message.into(),
        }
    }

    /// Classify a Redis client error raised while running `command`
    pub fn from_redis(command: &'static str, err: redis::RedisError) -> Self {
        if err.is_timeout()
            || err.is_connection_refusal()
            || err.is_connection_dropped()
            || err.is_io_error()
        {
            return Self::unavailable(format!("{} failed: {}", command, err));
        }
        Self::command(command, err.to_string())
    }
}

/// Errors surfaced by the idempotency gate and the rate limiter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuardError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid guard argument: {message}")]
    InvalidArgument { message: String },
}

impl GuardError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Whether the failure came from the shared store rather than the caller
    pub fn is_store_failure(&self) -> bool {
        matches!(self, GuardError::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_wraps_into_guard_error() {
        let err: GuardError = StoreError::unavailable("connection refused").into();
        assert!(err.is_store_failure());
        assert_eq!(
            err.to_string(),
            "Shared store unavailable: connection refused"
        );
    }

    #[test]
    fn test_invalid_argument_is_not_store_failure() {
        let err = GuardError::invalid_argument("ttl must be positive");
        assert!(!err.is_store_failure());
    }

    #[test]
    fn test_redis_io_error_maps_to_unavailable() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = StoreError::from_redis("ZADD", redis::RedisError::from(io));
        assert!(matches!(err, StoreError::Unavailable { .. }));
    }
}
