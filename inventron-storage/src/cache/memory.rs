//! Process-local cache backend.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use inventron_core::{Clock, InventronResult, SystemClock};

use super::traits::{CacheBackend, CacheStats};

#[derive(Debug, Clone)]
struct Slot {
    value: String,
    expires_at: DateTime<Utc>,
}

/// TTL cache over a concurrent hash map.
///
/// Expired entries are dropped lazily when read, or in bulk through
/// [`purge_expired`](Self::purge_expired).
#[derive(Debug)]
pub struct InMemoryCacheBackend {
    entries: DashMap<String, Slot>,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
    expirations: AtomicU64,
}

impl Default for InMemoryCacheBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCacheBackend {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> u64 {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, slot| slot.expires_at > now);
        let removed = before.saturating_sub(self.entries.len()) as u64;
        self.expirations.fetch_add(removed, Ordering::Relaxed);
        removed
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    async fn get(&self, key: &str) -> InventronResult<Option<String>> {
        let now = self.clock.now();
        // Copy out before any removal; holding a map ref across remove deadlocks.
        let lookup = self
            .entries
            .get(key)
            .map(|slot| (slot.value.clone(), slot.expires_at));

        match lookup {
            Some((value, expires_at)) if now < expires_at => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(value))
            }
            Some(_) => {
                if self
                    .entries
                    .remove_if(key, |_, slot| slot.expires_at <= now)
                    .is_some()
                {
                    self.expirations.fetch_add(1, Ordering::Relaxed);
                }
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) -> InventronResult<()> {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.entries
            .insert(key.to_string(), Slot { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> InventronResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn stats(&self) -> InventronResult<CacheStats> {
        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: self.entries.len() as u64,
            expirations: self.expirations.load(Ordering::Relaxed),
        })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
