//! Idempotency gate over the shared store

use std::sync::Arc;
use tracing::{debug, warn};

use super::types::{ClaimOutcome, OperationKey};
use crate::config::IdempotencyConfig;
use crate::domain::GuardError;
use crate::infrastructure::store::SharedStore;

/// Value stored under a claimed key; only the key's existence is meaningful
const PRESENCE_MARKER: &str = "1";

/// Records first observations of operation keys in the shared store
pub struct IdempotencyGate {
    store: Arc<dyn SharedStore>,
    key_prefix: String,
    default_ttl_secs: u64,
}

impl IdempotencyGate {
    pub const DEFAULT_TTL_SECS: u64 = 3600;

    /// Create a gate with the default one hour TTL
    pub fn new(store: Arc<dyn SharedStore>, key_prefix: &str) -> Self {
        Self {
            store,
            key_prefix: key_prefix.to_string(),
            default_ttl_secs: Self::DEFAULT_TTL_SECS,
        }
    }

    pub fn from_config(store: Arc<dyn SharedStore>, config: &IdempotencyConfig) -> Self {
        Self::new(store, &config.key_prefix).with_default_ttl(config.ttl_seconds)
    }

    pub fn with_default_ttl(mut self, ttl_secs: u64) -> Self {
        self.default_ttl_secs = ttl_secs;
        self
    }

    pub fn default_ttl_secs(&self) -> u64 {
        self.default_ttl_secs
    }

    /// Claim `key` for the default TTL
    pub async fn claim(&self, key: &OperationKey) -> Result<ClaimOutcome, GuardError> {
        self.claim_with_ttl(key, self.default_ttl_secs).await
    }

    /// Claim `key` for `ttl_secs` seconds.
    ///
    /// # Returns
    /// - `FirstClaim` when this call created the marker
    /// - `Duplicate` when the marker already existed (its TTL is left untouched)
    /// - `MissingKey` for an empty key, without touching the store
    ///
    /// # Errors
    /// `GuardError::Store` when the store could not confirm the claim either
    /// way, `GuardError::InvalidArgument` for a zero TTL.
    pub async fn claim_with_ttl(
        &self,
        key: &OperationKey,
        ttl_secs: u64,
    ) -> Result<ClaimOutcome, GuardError> {
        if key.is_empty() {
            debug!("Idempotency claim without a key treated as not first");
            return Ok(ClaimOutcome::MissingKey);
        }

        if ttl_secs == 0 {
            return Err(GuardError::invalid_argument(
                "idempotency TTL must be at least one second",
            ));
        }

        let redis_key = key.to_redis_key(&self.key_prefix);
        let created = self
            .store
            .set_if_absent_with_expiry(&redis_key, PRESENCE_MARKER, ttl_secs)
            .await
            .map_err(|e| {
                warn!(key = %key, error = %e, "Idempotency claim could not be confirmed");
                GuardError::from(e)
            })?;

        let outcome = if created {
            ClaimOutcome::FirstClaim
        } else {
            ClaimOutcome::Duplicate
        };

        debug!(
            key = %key,
            ttl_secs = ttl_secs,
            outcome = outcome.as_str(),
            "Idempotency claim evaluated"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::store::InMemoryStore;

    fn gate() -> IdempotencyGate {
        IdempotencyGate::new(Arc::new(InMemoryStore::new()), "idempotency")
    }

    #[tokio::test]
    async fn test_first_claim_wins() {
        let gate = gate();
        let key = OperationKey::new("rider-1", "book-1");

        assert_eq!(gate.claim(&key).await.unwrap(), ClaimOutcome::FirstClaim);
        assert_eq!(gate.claim(&key).await.unwrap(), ClaimOutcome::Duplicate);
    }

    #[tokio::test]
    async fn test_empty_key_never_touches_store() {
        let store = Arc::new(InMemoryStore::new());
        let gate = IdempotencyGate::new(store.clone(), "idempotency");

        let outcome = gate.claim(&OperationKey::raw("")).await.unwrap();
        assert_eq!(outcome, ClaimOutcome::MissingKey);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_zero_ttl_rejected() {
        let gate = gate();
        let key = OperationKey::raw("k");

        let err = gate.claim_with_ttl(&key, 0).await.unwrap_err();
        assert!(!err.is_store_failure());
    }

    #[test]
    fn test_from_config_uses_configured_ttl() {
        let config = IdempotencyConfig {
            ttl_seconds: 90,
            ..IdempotencyConfig::default()
        };
        let gate = IdempotencyGate::from_config(Arc::new(InMemoryStore::new()), &config);
        assert_eq!(gate.default_ttl_secs(), 90);
    }
}
