//! Dragonfly/Redis store backend
//!
//! The connection is established on first use and then shared by every
//! caller. `ConnectionManager` reconnects on its own after a drop; a command
//! issued while it is reconnecting fails with a store error instead of
//! waiting on the reconnect.

use async_trait::async_trait;
use redis::Client;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::SharedStore;
use crate::domain::StoreError;

/// Dragonfly/Redis storage backend
pub struct DragonflyStore {
    client: Client,
    connection: OnceCell<ConnectionManager>,
    connection_timeout: Duration,
}

impl DragonflyStore {
    /// Create a backend for `url` without connecting.
    ///
    /// # Errors
    /// Returns an error if the URL is not a valid Redis connection string
    pub fn new(url: &str, connection_timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(|e| {
            warn!("Failed to create Redis client for request guards: {}", e);
            StoreError::unavailable(format!("Failed to create Redis client: {}", e))
        })?;

        Ok(Self {
            client,
            connection: OnceCell::new(),
            connection_timeout,
        })
    }

    /// Get the shared connection, establishing it on first use.
    ///
    /// A failed attempt leaves the cell empty so the next call tries again.
    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                let connect = ConnectionManager::new(self.client.clone());
                match tokio::time::timeout(self.connection_timeout, connect).await {
                    Ok(Ok(manager)) => {
                        debug!("Connected to Dragonfly for request guards");
                        Ok(manager)
                    }
                    Ok(Err(e)) => {
                        warn!("Failed to connect to Dragonfly for request guards: {}", e);
                        Err(StoreError::from_redis("CONNECT", e))
                    }
                    Err(_) => {
                        warn!(
                            timeout_ms = self.connection_timeout.as_millis() as u64,
                            "Timed out connecting to Dragonfly for request guards"
                        );
                        Err(StoreError::Timeout {
                            timeout_ms: self.connection_timeout.as_millis() as u64,
                        })
                    }
                }
            })
            .await?;

        Ok(manager.clone())
    }
}

#[async_trait]
impl SharedStore for DragonflyStore {
    async fn set_if_absent_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl_secs: u64,
    ) -> Result<bool, StoreError> {
        let mut conn = self.connection().await?;

        // Nil reply means the key already existed
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::from_redis("SET", e))?;

        Ok(reply.is_some())
    }

    async fn sorted_set_insert(
        &self,
        key: &str,
        score: i64,
        member: &str,
    ) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;

        redis::cmd("ZADD")
            .arg(key)
            .arg(score)
            .arg(member)
            .query_async::<i64>(&mut conn)
            .await
            .map_err(|e| StoreError::from_redis("ZADD", e))?;

        Ok(())
    }

    async fn sorted_set_remove_range(
        &self,
        key: &str,
        min: i64,
        max: i64,
    ) -> Result<u64, StoreError> {
        let mut conn = self.connection().await?;

        redis::cmd("ZREMRANGEBYSCORE")
            .arg(key)
            .arg(min)
            .arg(max)
            .query_async::<u64>(&mut conn)
            .await
            .map_err(|e| StoreError::from_redis("ZREMRANGEBYSCORE", e))
    }

    async fn sorted_set_cardinality(&self, key: &str) -> Result<u64, StoreError> {
        let mut conn = self.connection().await?;

        redis::cmd("ZCARD")
            .arg(key)
            .query_async::<u64>(&mut conn)
            .await
            .map_err(|e| StoreError::from_redis("ZCARD", e))
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;

        redis::cmd("EXPIRE")
            .arg(key)
            .arg(ttl_secs)
            .query_async::<i64>(&mut conn)
            .await
            .map_err(|e| StoreError::from_redis("EXPIRE", e))?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;

        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| StoreError::from_redis("PING", e))?;

        Ok(())
    }

    async fn cleanup(&self) {
        // Redis handles TTL-based cleanup automatically
    }
}
