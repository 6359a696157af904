//! Shared Store Backends
//!
//! The guards only need five primitives from the shared key-value store:
//! - atomic set-if-absent with expiry (idempotency markers)
//! - sorted-set insert, range delete by score and cardinality (rate windows)
//! - key expiry refresh
//!
//! Two backends implement them:
//! - Dragonfly/Redis for distributed, production use
//! - In-memory for development and single-instance deployments

pub mod dragonfly_store;
pub mod memory_store;

pub use dragonfly_store::DragonflyStore;
pub use memory_store::InMemoryStore;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{StoreBackend, StoreConfig};
use crate::domain::StoreError;

/// Capability contract of the shared store
#[async_trait]
pub trait SharedStore: Send + Sync {
    /// Atomically set `key = value` with a TTL only if `key` does not exist.
    /// Returns whether the set happened.
    async fn set_if_absent_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl_secs: u64,
    ) -> Result<bool, StoreError>;

    /// Insert `member` with `score` into the sorted set at `key`
    async fn sorted_set_insert(&self, key: &str, score: i64, member: &str)
    -> Result<(), StoreError>;

    /// Remove every member scored within `[min, max]` (inclusive); returns how many were removed
    async fn sorted_set_remove_range(
        &self,
        key: &str,
        min: i64,
        max: i64,
    ) -> Result<u64, StoreError>;

    /// Number of members in the sorted set at `key`
    async fn sorted_set_cardinality(&self, key: &str) -> Result<u64, StoreError>;

    /// (Re)set the TTL of `key`
    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<(), StoreError>;

    /// Round-trip check used by health probes
    async fn ping(&self) -> Result<(), StoreError>;

    /// Drop expired entries (only meaningful for in-memory storage)
    async fn cleanup(&self) {}
}

/// Build the store backend selected by configuration.
///
/// The Dragonfly backend connects lazily, so this never touches the network.
pub fn connect_store(config: &StoreConfig) -> Result<Arc<dyn SharedStore>, StoreError> {
    match config.backend {
        StoreBackend::Dragonfly => {
            let store = DragonflyStore::new(
                &config.url,
                Duration::from_secs(config.connection_timeout_seconds),
            )?;
            info!("Guards using Dragonfly storage backend at {}", config.url);
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            info!("Guards using in-memory storage backend");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}

/// Periodically purge expired entries until `shutdown` is cancelled.
///
/// A no-op for Dragonfly, which expires keys itself; required for the
/// in-memory backend so idle keys do not accumulate.
pub fn start_cleanup_task(
    store: Arc<dyn SharedStore>,
    cleanup_interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(cleanup_interval.max(Duration::from_secs(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("Store cleanup task stopped");
                    break;
                }
                _ = ticker.tick() => {
                    store.cleanup().await;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_memory_backend() {
        let config = StoreConfig {
            backend: StoreBackend::Memory,
            ..StoreConfig::default()
        };
        let store = connect_store(&config).unwrap();
        assert!(store.ping().await.is_ok());
    }

    #[test]
    fn test_connect_dragonfly_backend_is_lazy() {
        // Nothing listens on port 1; construction must still succeed
        let config = StoreConfig {
            url: "redis://127.0.0.1:1".to_string(),
            ..StoreConfig::default()
        };
        assert!(connect_store(&config).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_purges_and_stops() {
        let memory = InMemoryStore::new();
        memory.set_if_absent_with_expiry("k", "1", 1).await.unwrap();
        let store: Arc<dyn SharedStore> = Arc::new(memory.clone());

        let shutdown = CancellationToken::new();
        let handle = start_cleanup_task(store, Duration::from_secs(10), shutdown.clone());

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(memory.is_empty().await);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[test]
    fn test_connect_rejects_malformed_url() {
        let config = StoreConfig {
            url: "not a url".to_string(),
            ..StoreConfig::default()
        };
        assert!(connect_store(&config).is_err());
    }
}
