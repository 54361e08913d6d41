//! Read-through cache for point lookups.
//!
//! Reads check the backend first and fall back to storage on a miss,
//! populating the backend with the fetched entity. Writers invalidate by id;
//! there is no write-through. Staleness is bounded only by the entry TTL.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use inventron_core::{CacheError, InventronResult};

use super::traits::{CacheBackend, CacheStats, CacheableEntity};

/// Default lifetime of a cache entry.
pub const DEFAULT_ENTRY_TTL: Duration = Duration::from_secs(15 * 60);

/// Configuration for the read-through cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub entry_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            entry_ttl: DEFAULT_ENTRY_TTL,
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the entry TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.entry_ttl = ttl;
        self
    }
}

/// Storage fetcher trait for retrieving entities on a cache miss.
#[async_trait]
pub trait StorageFetcher<T: CacheableEntity>: Send + Sync {
    /// Fetch an entity from storage by ID.
    async fn fetch(&self, id: T::Id) -> InventronResult<Option<T>>;
}

/// Where a read was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadSource {
    Cache,
    Storage,
}

/// Result of a read-through lookup.
#[derive(Debug, Clone)]
pub struct CacheRead<T> {
    value: T,
    source: ReadSource,
}

impl<T> CacheRead<T> {
    pub fn from_cache(value: T) -> Self {
        Self {
            value,
            source: ReadSource::Cache,
        }
    }

    pub fn from_storage(value: T) -> Self {
        Self {
            value,
            source: ReadSource::Storage,
        }
    }

    pub fn source(&self) -> ReadSource {
        self.source
    }

    pub fn was_cache_hit(&self) -> bool {
        self.source == ReadSource::Cache
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Read-through cache over a shared [`CacheBackend`].
#[derive(Clone)]
pub struct ReadThroughCache {
    backend: Arc<dyn CacheBackend>,
    config: CacheConfig,
}

impl std::fmt::Debug for ReadThroughCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadThroughCache")
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .finish()
    }
}

impl ReadThroughCache {
    /// Create a new read-through cache.
    pub fn new(backend: Arc<dyn CacheBackend>, config: CacheConfig) -> Self {
        Self { backend, config }
    }

    /// Create a new read-through cache with default configuration.
    pub fn with_defaults(backend: Arc<dyn CacheBackend>) -> Self {
        Self::new(backend, CacheConfig::default())
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get a reference to the cache backend.
    pub fn backend(&self) -> &dyn CacheBackend {
        self.backend.as_ref()
    }

    /// Get an entity, consulting storage at most once on a miss.
    ///
    /// Returns `Ok(None)` if the entity doesn't exist in storage. Absent
    /// entities are not cached. An entry that fails to deserialize is dropped
    /// and treated as a miss.
    pub async fn get<T, S>(&self, id: T::Id, storage: &S) -> InventronResult<Option<CacheRead<T>>>
    where
        T: CacheableEntity,
        S: StorageFetcher<T> + ?Sized,
    {
        let key = T::cache_key(id);

        if let Some(raw) = self.backend.get(&key).await? {
            match serde_json::from_str::<T>(&raw) {
                Ok(entity) => return Ok(Some(CacheRead::from_cache(entity))),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Dropping undecodable cache entry");
                    self.backend.delete(&key).await?;
                }
            }
        }

        let Some(entity) = storage.fetch(id).await? else {
            return Ok(None);
        };

        let raw = serde_json::to_string(&entity).map_err(|e| CacheError::Serialization {
            key: key.clone(),
            reason: e.to_string(),
        })?;
        self.backend.put(&key, raw, self.config.entry_ttl).await?;
        Ok(Some(CacheRead::from_storage(entity)))
    }

    /// Invalidate a single entity.
    pub async fn invalidate<T: CacheableEntity>(&self, id: T::Id) -> InventronResult<()> {
        self.backend.delete(&T::cache_key(id)).await
    }

    /// Get backend statistics.
    pub async fn stats(&self) -> InventronResult<CacheStats> {
        self.backend.stats().await
    }
}
