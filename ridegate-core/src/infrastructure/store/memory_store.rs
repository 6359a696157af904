//! In-memory store backend for development/single instance
//!
//! All primitives run under one write lock, which gives the same atomicity the
//! guards rely on from Redis. Expiry follows the tokio clock so tests can
//! pause and advance time.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use super::SharedStore;
use crate::domain::StoreError;

#[derive(Debug, Clone)]
enum StoredValue {
    /// Presence marker; only its existence matters
    Marker,
    /// member -> score
    SortedSet(HashMap<String, i64>),
}

/// In-memory storage entry with expiration
#[derive(Debug, Clone)]
struct MemoryEntry {
    value: StoredValue,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Process-local implementation of [`SharedStore`]
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<RwLock<HashMap<String, MemoryEntry>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held, expired or not
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drop `key` if it has expired, mirroring Redis' lazy expiry
    fn evict_if_expired(entries: &mut HashMap<String, MemoryEntry>, key: &str, now: Instant) {
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
        }
    }
}

#[async_trait]
impl SharedStore for InMemoryStore {
    async fn set_if_absent_with_expiry(
        &self,
        key: &str,
        _value: &str,
        ttl_secs: u64,
    ) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        Self::evict_if_expired(&mut entries, key, now);

        if entries.contains_key(key) {
            return Ok(false);
        }

        entries.insert(
            key.to_string(),
            MemoryEntry {
                value: StoredValue::Marker,
                expires_at: Some(now + Duration::from_secs(ttl_secs)),
            },
        );
        Ok(true)
    }

    async fn sorted_set_insert(
        &self,
        key: &str,
        score: i64,
        member: &str,
    ) -> Result<(), StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        Self::evict_if_expired(&mut entries, key, now);

        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| MemoryEntry {
                value: StoredValue::SortedSet(HashMap::new()),
                expires_at: None,
            });

        match &mut entry.value {
            StoredValue::SortedSet(members) => {
                members.insert(member.to_string(), score);
                Ok(())
            }
            StoredValue::Marker => Err(StoreError::WrongType {
                key: key.to_string(),
            }),
        }
    }

    async fn sorted_set_remove_range(
        &self,
        key: &str,
        min: i64,
        max: i64,
    ) -> Result<u64, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        Self::evict_if_expired(&mut entries, key, now);

        let Some(entry) = entries.get_mut(key) else {
            return Ok(0);
        };

        let (removed, now_empty) = match &mut entry.value {
            StoredValue::SortedSet(members) => {
                let before = members.len();
                members.retain(|_, score| *score < min || *score > max);
                ((before - members.len()) as u64, members.is_empty())
            }
            StoredValue::Marker => {
                return Err(StoreError::WrongType {
                    key: key.to_string(),
                });
            }
        };

        // Redis deletes a sorted set once its last member is gone
        if now_empty {
            entries.remove(key);
        }

        Ok(removed)
    }

    async fn sorted_set_cardinality(&self, key: &str) -> Result<u64, StoreError> {
        let now = Instant::now();
        let entries = self.entries.read().await;

        match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => match &entry.value {
                StoredValue::SortedSet(members) => Ok(members.len() as u64),
                StoredValue::Marker => Err(StoreError::WrongType {
                    key: key.to_string(),
                }),
            },
            _ => Ok(0),
        }
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<(), StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        Self::evict_if_expired(&mut entries, key, now);

        if let Some(entry) = entries.get_mut(key) {
            entry.expires_at = Some(now + Duration::from_secs(ttl_secs));
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn cleanup(&self) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));

        debug!(
            removed = before - entries.len(),
            retained = entries.len(),
            "Completed in-memory store cleanup"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_if_absent_only_once() {
        let store = InMemoryStore::new();

        assert!(store.set_if_absent_with_expiry("op", "1", 60).await.unwrap());
        assert!(!store.set_if_absent_with_expiry("op", "1", 60).await.unwrap());
        assert!(store.set_if_absent_with_expiry("other", "1", 60).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_if_absent_after_expiry() {
        let store = InMemoryStore::new();

        assert!(store.set_if_absent_with_expiry("op", "1", 1).await.unwrap());
        tokio::time::advance(Duration::from_millis(999)).await;
        assert!(!store.set_if_absent_with_expiry("op", "1", 1).await.unwrap());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(store.set_if_absent_with_expiry("op", "1", 1).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_does_not_reset_ttl() {
        let store = InMemoryStore::new();

        assert!(store.set_if_absent_with_expiry("op", "1", 2).await.unwrap());
        tokio::time::advance(Duration::from_millis(1500)).await;
        assert!(!store.set_if_absent_with_expiry("op", "1", 2).await.unwrap());

        // Original TTL still runs out at t=2s
        tokio::time::advance(Duration::from_millis(600)).await;
        assert!(store.set_if_absent_with_expiry("op", "1", 2).await.unwrap());
    }

    #[tokio::test]
    async fn test_sorted_set_members_deduplicate_by_member() {
        let store = InMemoryStore::new();

        store.sorted_set_insert("w", 100, "100-a").await.unwrap();
        store.sorted_set_insert("w", 100, "100-b").await.unwrap();
        store.sorted_set_insert("w", 100, "100-a").await.unwrap();

        assert_eq!(store.sorted_set_cardinality("w").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_remove_range_is_inclusive() {
        let store = InMemoryStore::new();

        for score in [10, 20, 30, 40] {
            store
                .sorted_set_insert("w", score, &format!("m{}", score))
                .await
                .unwrap();
        }

        let removed = store.sorted_set_remove_range("w", 0, 30).await.unwrap();
        assert_eq!(removed, 3);
        assert_eq!(store.sorted_set_cardinality("w").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_remove_range_deletes_emptied_set() {
        let store = InMemoryStore::new();
        store.sorted_set_insert("w", 5, "m").await.unwrap();

        store.sorted_set_remove_range("w", 0, 5).await.unwrap();

        assert!(store.is_empty().await);
        assert_eq!(store.sorted_set_cardinality("w").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_wrong_type_is_reported() {
        let store = InMemoryStore::new();
        store.set_if_absent_with_expiry("k", "1", 60).await.unwrap();

        let err = store.sorted_set_insert("k", 1, "m").await.unwrap_err();
        assert_eq!(
            err,
            StoreError::WrongType {
                key: "k".to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_expire_and_cleanup() {
        let store = InMemoryStore::new();
        store.sorted_set_insert("w", 1, "m").await.unwrap();
        store.expire("w", 1).await.unwrap();

        // Missing keys are a no-op, like Redis
        store.expire("missing", 1).await.unwrap();
        assert_eq!(store.len().await, 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.sorted_set_cardinality("w").await.unwrap(), 0);

        store.cleanup().await;
        assert!(store.is_empty().await);
    }
}
