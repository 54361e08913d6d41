//! Cache backend traits and cacheable entity marker.
//!
//! Backends are plain string key/value stores with a per-entry TTL. Typed
//! access and (de)serialization happen one level up in
//! [`ReadThroughCache`](super::ReadThroughCache).

use std::fmt::Display;
use std::time::Duration;

use async_trait::async_trait;
use inventron_core::{InventoryItem, InventronResult, ItemId};
use serde::{de::DeserializeOwned, Serialize};

/// Marker trait for types that can be cached.
///
/// The key is derived deterministically from the entity id, so callers that
/// only know the id (update, delete) can invalidate without loading the
/// entity first.
pub trait CacheableEntity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Identifier type used in keys.
    type Id: Copy + Display + Send + Sync;

    /// Prefix shared by every key of this entity type.
    const KEY_PREFIX: &'static str;

    fn cache_key(id: Self::Id) -> String {
        format!("{}{}", Self::KEY_PREFIX, id)
    }
}

impl CacheableEntity for InventoryItem {
    type Id = ItemId;
    const KEY_PREFIX: &'static str = "inventron_item_";
}

/// Cache backend trait for pluggable cache implementations.
///
/// Implementations must be safe to share across concurrent requests. An
/// entry whose TTL has elapsed must never be returned.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get the serialized value stored under `key`, if present and unexpired.
    async fn get(&self, key: &str) -> InventronResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous entry.
    async fn put(&self, key: &str, value: String, ttl: Duration) -> InventronResult<()>;

    /// Remove the entry under `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> InventronResult<()>;

    /// Get cache statistics.
    async fn stats(&self) -> InventronResult<CacheStats>;

    /// Short backend name for logs and health output.
    fn name(&self) -> &'static str;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of entries currently in cache.
    pub entry_count: u64,
    /// Number of entries dropped because their TTL elapsed.
    pub expirations: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
