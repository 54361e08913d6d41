//! Redis cache backend, shared by every API instance pointed at the same
//! server. Expiry is delegated to Redis (`SET key value EX ttl`).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use inventron_core::{CacheError, InventronResult};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::traits::{CacheBackend, CacheStats};

fn backend_error(err: redis::RedisError) -> CacheError {
    CacheError::Backend {
        reason: err.to_string(),
    }
}

/// Cache backend over a multiplexed, auto-reconnecting Redis connection.
pub struct RedisCacheBackend {
    conn: ConnectionManager,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RedisCacheBackend {
    /// Connect to `url` (e.g. `redis://127.0.0.1:6379/1`).
    pub async fn connect(url: &str) -> InventronResult<Self> {
        let client = redis::Client::open(url).map_err(backend_error)?;
        let conn = ConnectionManager::new(client).await.map_err(backend_error)?;
        tracing::info!("Connected to Redis cache backend");
        Ok(Self {
            conn,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    async fn get(&self, key: &str) -> InventronResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await.map_err(backend_error)?;
        let counter = if value.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(value)
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) -> InventronResult<()> {
        let mut conn = self.conn.clone();
        // EX 0 is rejected by Redis.
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(backend_error)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> InventronResult<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await.map_err(backend_error)?;
        Ok(())
    }

    async fn stats(&self) -> InventronResult<CacheStats> {
        let mut conn = self.conn.clone();
        let entry_count: u64 = redis::cmd("DBSIZE")
            .query_async(&mut conn)
            .await
            .map_err(backend_error)?;
        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count,
            expirations: 0,
        })
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
